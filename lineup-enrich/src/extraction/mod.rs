//! ExtractionEngine: semantic fields out of festival HTML
//!
//! Three tiers, first success wins:
//! 1. learned selector from the [`SelectorStore`](crate::selectors::SelectorStore)
//! 2. heuristic library ([`heuristics`])
//! 3. a [`SelectorResolver`] (operator in the loop, or nothing)
//!
//! Failing tiers fall through silently. Total failure is `None`.

pub mod engine;
pub mod heuristics;
pub mod resolver;
pub mod social;
pub mod text;

pub use engine::{validate_selector, ExtractionEngine};
pub use resolver::{InteractiveResolver, NullResolver, Resolution, ResolveRequest, SelectorResolver};

use scraper::Html;
use std::fmt;

/// Bios shorter than this are treated as no match
pub const MIN_BIO_CHARS: usize = 50;

/// What is being extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticField {
    /// Artist biography text
    Bio,
    /// Links from the lineup page to artist pages
    LineupLinks,
    /// Outbound links from an artist page
    SocialLinks,
}

impl SemanticField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bio => "bio",
            Self::LineupLinks => "lineup_links",
            Self::SocialLinks => "social_links",
        }
    }

    pub fn is_links(&self) -> bool {
        matches!(self, Self::LineupLinks | Self::SocialLinks)
    }

    /// Key under the site entry in the selector file
    pub fn selector_key(&self) -> String {
        format!("{}_selector", self.as_str())
    }

    pub fn learned_at_key(&self) -> String {
        format!("{}_learned_at", self.as_str())
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchor with its visible text and absolute URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// Extracted value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Text(String),
    Links(Vec<Link>),
}

impl Extracted {
    /// Passes the minimum-content check for `field`
    pub fn is_substantial(&self, field: SemanticField) -> bool {
        match (self, field) {
            (Extracted::Text(text), SemanticField::Bio) => text.chars().count() >= MIN_BIO_CHARS,
            (Extracted::Links(links), f) if f.is_links() => !links.is_empty(),
            _ => false,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Extracted::Text(text) => Some(text),
            Extracted::Links(_) => None,
        }
    }

    pub fn into_links(self) -> Vec<Link> {
        match self {
            Extracted::Links(links) => links,
            Extracted::Text(_) => Vec::new(),
        }
    }
}

/// Tier that produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Learned,
    Heuristic,
    Interactive,
}

/// Successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub value: Extracted,
    pub tier: Tier,
}

/// Page-independent facts the tiers need
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    /// Site root; relative links resolve against it when the page URL is unknown
    pub base_url: String,
    /// Path segment identifying artist pages (e.g. `/programma/`)
    pub artist_path: String,
    /// Artist the page belongs to, for operator prompts
    pub artist_name: Option<String>,
    /// Page URL, for resolving relative links and for operator prompts
    pub page_url: Option<String>,
}

/// Parsed document
pub struct Page {
    document: Html,
    blank: bool,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            blank: html.trim().is_empty(),
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Empty or whitespace-only source
    pub fn is_blank(&self) -> bool {
        self.blank
    }
}
