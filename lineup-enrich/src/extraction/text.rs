//! Text and link collection from elements

use super::{ExtractionContext, Link};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Selector};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([,.;:!?)\]])").expect("valid regex"));
static SPACE_AFTER_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([(\[])\s+").expect("valid regex"));

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Visible text of an element, cleaned
///
/// Text nodes are joined with a space so words in adjacent blocks do not
/// run together; [`clean_text`] then removes the spacing this leaves
/// around inline markup.
pub fn element_text(element: ElementRef<'_>) -> String {
    let joined = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(&joined)
}

/// Collapse whitespace and drop spaces before closing punctuation
pub fn clean_text(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let closed = SPACE_BEFORE_PUNCT.replace_all(&collapsed, "$1");
    SPACE_AFTER_OPEN.replace_all(&closed, "$1").into_owned()
}

/// Links in or at `element`, resolved against the page they came from
pub fn element_links(element: ElementRef<'_>, ctx: &ExtractionContext) -> Vec<Link> {
    let base = ctx.page_url.as_deref().unwrap_or(&ctx.base_url);
    if element.value().name() == "a" {
        return anchor_link(element, base).into_iter().collect();
    }
    element
        .select(&ANCHORS)
        .filter_map(|a| anchor_link(a, base))
        .collect()
}

fn anchor_link(anchor: ElementRef<'_>, base: &str) -> Option<Link> {
    let href = anchor.value().attr("href")?;
    Some(Link {
        text: element_text(anchor),
        href: absolutize(href, base)?,
    })
}

/// Absolute http(s) URL for `href`, or `None` for fragments and other schemes
pub fn absolutize(href: &str, base: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = Url::parse(base).ok()?.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.into())
}

/// De-duplicate links by URL, keeping first occurrence order
pub fn dedupe_links(links: Vec<Link>) -> Vec<Link> {
    let mut seen = std::collections::HashSet::new();
    links
        .into_iter()
        .filter(|l| seen.insert(l.href.clone()))
        .collect()
}
