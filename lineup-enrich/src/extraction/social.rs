//! Social link classification
//!
//! Artist pages link out to the artist's own channels, mixed in with the
//! festival's and promoters' links. Festival links are dropped and the rest
//! are keyed by platform.

use super::Link;
use reqwest::Url;
use std::collections::BTreeMap;

/// Links containing any of these belong to the festival or its promoters
const EXCLUDED_FRAGMENTS: [&str; 6] = [
    "dtrh_festival",
    "dtrh_fest",
    "downtherabbithole",
    "mojo.nl",
    "livenation",
    "list-manage.com",
];

/// Host suffix → platform
const PLATFORM_HOSTS: [(&str, &str); 9] = [
    ("facebook.com", "Facebook"),
    ("instagram.com", "Instagram"),
    ("twitter.com", "Twitter"),
    ("x.com", "Twitter"),
    ("youtube.com", "YouTube"),
    ("youtu.be", "YouTube"),
    ("soundcloud.com", "SoundCloud"),
    ("bandcamp.com", "Bandcamp"),
    ("spotify.com", "Spotify"),
];

pub const WEBSITE: &str = "Website";

fn host_of(href: &str) -> Option<String> {
    Url::parse(href)
        .ok()?
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Platform name for an outbound link, `None` for festival links and
/// Spotify links that are not artist pages
pub fn platform_for(href: &str) -> Option<&'static str> {
    let lower = href.to_ascii_lowercase();
    if EXCLUDED_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        return None;
    }
    let host = host_of(href)?;
    match PLATFORM_HOSTS.iter().find(|(domain, _)| host_matches(&host, domain)) {
        Some((_, "Spotify")) if !lower.contains("/artist/") => None,
        Some((_, platform)) => Some(*platform),
        None => Some(WEBSITE),
    }
}

/// True if `href` points at a known social platform
pub fn is_social_host(href: &str) -> bool {
    host_of(href).is_some_and(|host| {
        PLATFORM_HOSTS
            .iter()
            .any(|(domain, _)| host_matches(&host, domain))
    })
}

/// Platform → URL, first link per platform wins
pub fn categorize(links: &[Link]) -> BTreeMap<String, String> {
    let mut by_platform = BTreeMap::new();
    for link in links {
        if let Some(platform) = platform_for(&link.href) {
            by_platform
                .entry(platform.to_string())
                .or_insert_with(|| link.href.clone());
        }
    }
    by_platform
}
