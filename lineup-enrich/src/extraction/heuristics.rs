//! Heuristic tier
//!
//! Ordered pattern library per field. Each function returns the first
//! candidate that passes its sanity check, or nothing.

use super::text::{dedupe_links, element_links, element_text};
use super::{social, Extracted, ExtractionContext, Link, Page, SemanticField, MIN_BIO_CHARS};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Paragraph fallback minimum length
const MIN_PARAGRAPH_CHARS: usize = 100;

/// Class patterns known to hold artist bios, most specific first
const BIO_SELECTORS: [&str; 8] = [
    "div.column.text-xl.font-normal.prose",
    r#"div[class*="description"]"#,
    "div.artist-bio",
    "div.artist-description",
    "div.bio",
    "p.description",
    "div.content",
    "article.artist",
];

/// A paragraph mentioning one of these reads like a bio
const BIO_KEYWORDS: [&str; 19] = [
    "artist", "band", "music", "singer", "songwriter", "album", "tour", "festival", "released",
    "formed", "world", "indie", "pop", "rock", "sound", "debut", "hit", "stage", "performance",
];

/// Paragraphs from here on are related-artist teasers
const END_OF_BIO_MARKERS: [&str; 2] = ["you might also like", "misschien ook leuk"];

/// Calls to action that are never bio text
const CALL_TO_ACTION_MARKERS: [&str; 5] = [
    "tickets",
    "newsletter",
    "nieuwsbrief",
    "cookie",
    "sign up",
];

/// Section holding an artist's outbound links on DTRH-style pages
const SOCIAL_SECTION: &str = r#"div.border.p-8.mt-8 a[target="_blank"]"#;

static HEADING_OR_PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, p").expect("valid selector"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Run the library for `field`
pub fn extract(page: &Page, field: SemanticField, ctx: &ExtractionContext) -> Option<Extracted> {
    let doc = page.document();
    match field {
        SemanticField::Bio => bio(doc).map(Extracted::Text),
        SemanticField::LineupLinks => non_empty(lineup_links(doc, ctx)),
        SemanticField::SocialLinks => non_empty(social_links(doc, ctx)),
    }
}

fn non_empty(links: Vec<Link>) -> Option<Extracted> {
    (!links.is_empty()).then_some(Extracted::Links(links))
}

/// Artist bio
///
/// 1. known bio containers (text ≥ [`MIN_BIO_CHARS`])
/// 2. first paragraph after the `h1` of ≥ 100 chars that reads like a bio,
///    else the first such paragraph regardless of keywords
pub fn bio(doc: &Html) -> Option<String> {
    for css in BIO_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(text) = doc
            .select(&selector)
            .map(element_text)
            .find(|t| t.chars().count() >= MIN_BIO_CHARS)
        {
            return Some(text);
        }
    }
    paragraph_after_heading(doc)
}

fn paragraph_after_heading(doc: &Html) -> Option<String> {
    let mut seen_heading = false;
    let mut fallback = None;

    for element in doc.select(&HEADING_OR_PARAGRAPH) {
        if element.value().name() == "h1" {
            seen_heading = true;
            continue;
        }
        if !seen_heading {
            continue;
        }

        let text = element_text(element);
        let lower = text.to_lowercase();
        if END_OF_BIO_MARKERS.iter().any(|m| lower.contains(m)) {
            break;
        }
        if text.chars().count() < MIN_PARAGRAPH_CHARS
            || CALL_TO_ACTION_MARKERS.iter().any(|m| lower.contains(m))
        {
            continue;
        }
        if BIO_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return Some(text);
        }
        fallback.get_or_insert(text);
    }
    fallback
}

/// Links to artist pages: anchors whose URL contains the artist path
/// followed by a non-empty slug
pub fn lineup_links(doc: &Html, ctx: &ExtractionContext) -> Vec<Link> {
    let artist_path = ctx.artist_path.trim();
    if artist_path.is_empty() {
        return Vec::new();
    }
    let links = doc
        .root_element()
        .select(&ANCHORS)
        .flat_map(|a| element_links(a, ctx))
        .filter(|link| {
            link.href
                .split_once(artist_path)
                .is_some_and(|(_, slug)| !slug.trim_matches('/').is_empty())
        })
        .collect();
    dedupe_links(links)
}

/// Outbound links: the DTRH link section, else any link to a known platform
pub fn social_links(doc: &Html, ctx: &ExtractionContext) -> Vec<Link> {
    if let Ok(section) = Selector::parse(SOCIAL_SECTION) {
        let links: Vec<Link> = doc
            .select(&section)
            .flat_map(|a| element_links(a, ctx))
            .collect();
        if !links.is_empty() {
            return dedupe_links(links);
        }
    }

    let links = doc
        .select(&ANCHORS)
        .flat_map(|a| element_links(a, ctx))
        .filter(|l| social::is_social_host(&l.href))
        .collect();
    dedupe_links(links)
}
