//! Artist name → festival URL slug
//!
//! Festival sites address artist pages as `<base_url><artist_path><slug>`.
//! Most slugs follow a mechanical rule; a handful of names the sites
//! spell out by hand are kept in an override table.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Names whose published slug does not follow the general rule
static SPECIAL_CASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Florence + The Machine", "florence-the-machine"),
        ("The xx", "the-xx"),
        ("¥ØU$UK€ ¥UK1MAT$U", "yenouukeur-yenuk1matu"),
        ("Derya Yıldırım & Grup Şimşek", "derya-yildirim-grup-simsek"),
        ("Arp Frique & The Perpetual Singers", "arp-frique-the-perpetual-singers"),
        ("Mall Grab b2b Narciss", "mall-grab-b2b-narciss"),
        ("Kin'Gongolo Kiniata", "kingongolo-kiniata"),
        ("Lumï", "lumi"),
        ("De Staat Becomes De Staat", "de-staat-becomes-de-staat"),
    ])
});

/// Convert an artist name to its festival URL slug
///
/// Accented Latin letters are folded to ASCII, `&`, `+` and `'` are
/// dropped, spaces become hyphens, anything else outside `[a-z0-9-]`
/// is removed and runs of hyphens are collapsed.
///
/// # Examples
/// ```
/// use lineup_common::artist_slug;
/// assert_eq!(artist_slug("Sigur Rós"), "sigur-ros");
/// assert_eq!(artist_slug("Nick Cave & The Bad Seeds"), "nick-cave-the-bad-seeds");
/// ```
pub fn artist_slug(name: &str) -> String {
    if let Some(special) = SPECIAL_CASES.get(name) {
        return (*special).to_string();
    }

    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            ' ' => slug.push('-'),
            '&' | '+' | '\'' => {}
            c if c.is_ascii_alphanumeric() || c == '-' => slug.push(c),
            c => {
                if let Some(folded) = fold_accent(c) {
                    slug.push(folded);
                }
            }
        }
    }

    let mut collapsed = String::with_capacity(slug.len());
    for c in slug.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed.trim_matches('-').to_string()
}

/// ASCII base letter for lowercase Latin letters with diacritics
fn fold_accent(c: char) -> Option<char> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'č' => 'c',
        'ď' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' | 'ș' => 's',
        'ţ' | 'ť' | 'ț' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => return None,
    };
    Some(base)
}
