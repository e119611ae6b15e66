//! Tiered extraction

use super::resolver::{Resolution, ResolveRequest, SelectorResolver};
use super::text::{dedupe_links, element_links, element_text};
use super::{heuristics, Extracted, Extraction, ExtractionContext, Page, SemanticField, Tier};
use crate::selectors::SelectorStore;
use scraper::Selector;
use tracing::{debug, info, warn};

/// Outcome of applying a candidate selector to a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorCheck {
    /// Not valid CSS
    Invalid(String),
    /// Valid, selected nothing
    NoMatch,
    /// Selected elements but nothing usable for the field
    Trivial { matches: usize },
    /// Usable value; text fields use the first of `matches` elements
    Usable { matches: usize, value: Extracted },
}

/// Apply `css` to `page` for `field`
///
/// Text fields take the first matching element; link fields take the links
/// under every match.
pub fn validate_selector(
    page: &Page,
    css: &str,
    field: SemanticField,
    ctx: &ExtractionContext,
) -> SelectorCheck {
    let selector = match Selector::parse(css) {
        Ok(s) => s,
        Err(e) => return SelectorCheck::Invalid(format!("{:?}", e)),
    };
    let elements: Vec<_> = page.document().select(&selector).collect();
    if elements.is_empty() {
        return SelectorCheck::NoMatch;
    }

    let matches = elements.len();
    let value = if field.is_links() {
        let links = elements
            .iter()
            .flat_map(|e| element_links(*e, ctx))
            .collect();
        Extracted::Links(dedupe_links(links))
    } else {
        Extracted::Text(element_text(elements[0]))
    };

    if value.is_substantial(field) {
        SelectorCheck::Usable { matches, value }
    } else {
        SelectorCheck::Trivial { matches }
    }
}

/// Learned → heuristic → resolver
pub struct ExtractionEngine {
    resolver: Box<dyn SelectorResolver>,
    resolver_enabled: bool,
}

impl ExtractionEngine {
    pub fn new(resolver: Box<dyn SelectorResolver>) -> Self {
        Self {
            resolver,
            resolver_enabled: true,
        }
    }

    /// False once the operator has aborted the learning session
    pub fn resolver_enabled(&self) -> bool {
        self.resolver_enabled
    }

    /// Extract `field` from `page`
    ///
    /// Blank pages return `None` without consulting the resolver. A learned
    /// selector that fails is kept in the store; the heuristic tier always
    /// runs before the resolver.
    pub fn extract(
        &mut self,
        selectors: &mut SelectorStore,
        page: &Page,
        field: SemanticField,
        site_id: &str,
        ctx: &ExtractionContext,
    ) -> Option<Extraction> {
        if page.is_blank() {
            debug!(field = %field, "Blank page, nothing to extract");
            return None;
        }

        // Tier 1: learned selector
        if let Some(css) = selectors.get(site_id, field).map(str::to_string) {
            match validate_selector(page, &css, field, ctx) {
                SelectorCheck::Usable { value, .. } => {
                    debug!(field = %field, site = %site_id, "Learned selector matched");
                    return Some(Extraction {
                        value,
                        tier: Tier::Learned,
                    });
                }
                check => {
                    warn!(
                        field = %field,
                        site = %site_id,
                        selector = %css,
                        result = ?check,
                        "Learned selector no longer works, falling back to heuristics"
                    );
                }
            }
        }

        // Tier 2: heuristics
        if let Some(value) =
            heuristics::extract(page, field, ctx).filter(|v| v.is_substantial(field))
        {
            debug!(field = %field, "Heuristic match");
            return Some(Extraction {
                value,
                tier: Tier::Heuristic,
            });
        }

        // Tier 3: resolver
        if !self.resolver_enabled {
            return None;
        }
        let request = ResolveRequest {
            page,
            field,
            site_id,
            context: ctx,
        };
        match self.resolver.resolve(&request) {
            Resolution::Confirmed { selector, value } => {
                selectors.put(site_id, field, &selector);
                Some(Extraction {
                    value,
                    tier: Tier::Interactive,
                })
            }
            Resolution::Skip => None,
            Resolution::Abort => {
                info!("Selector learning aborted, continuing unattended");
                self.resolver_enabled = false;
                None
            }
        }
    }
}
