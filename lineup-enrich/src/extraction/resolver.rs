//! Selector resolvers: the last extraction tier
//!
//! [`InteractiveResolver`] asks an operator for a selector and validates it
//! live against the page. [`NullResolver`] never resolves and is used for
//! unattended runs.

use super::engine::{validate_selector, SelectorCheck};
use super::{Extracted, ExtractionContext, Page, SemanticField};
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use tracing::warn;

/// Characters of text shown when asking for confirmation
const PREVIEW_CHARS: usize = 200;

/// Links shown when asking for confirmation
const PREVIEW_LINKS: usize = 5;

/// What the resolver is asked to find
pub struct ResolveRequest<'a> {
    pub page: &'a Page,
    pub field: SemanticField,
    pub site_id: &'a str,
    pub context: &'a ExtractionContext,
}

/// Resolver answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Selector validated and confirmed; `value` is what it extracted
    Confirmed { selector: String, value: Extracted },
    /// Give up on this field for this page
    Skip,
    /// Stop asking for the rest of the session
    Abort,
}

/// Tier-3 capability
pub trait SelectorResolver: Send {
    fn resolve(&mut self, request: &ResolveRequest<'_>) -> Resolution;
}

/// Never resolves
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl SelectorResolver for NullResolver {
    fn resolve(&mut self, _request: &ResolveRequest<'_>) -> Resolution {
        Resolution::Skip
    }
}

/// Console dialogue with an operator
pub struct InteractiveResolver<R, W> {
    input: R,
    output: W,
}

impl InteractiveResolver<BufReader<Stdin>, Stdout> {
    /// Resolver on the process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead + Send, W: Write + Send> InteractiveResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one trimmed line; `None` on end of input
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// y/n question; end of input counts as "no"
    fn ask(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{} (y/n): ", question)?;
        self.output.flush()?;
        Ok(matches!(
            self.read_line()?.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y") | Some("yes")
        ))
    }

    fn dialogue(&mut self, request: &ResolveRequest<'_>) -> io::Result<Resolution> {
        let ctx = request.context;
        writeln!(self.output)?;
        writeln!(
            self.output,
            "Could not find {} for {} on {}",
            request.field,
            ctx.artist_name.as_deref().unwrap_or("this page"),
            ctx.page_url.as_deref().unwrap_or(request.site_id),
        )?;
        writeln!(self.output, "Open the page in a browser, inspect the element and enter a CSS selector.")?;
        writeln!(self.output, "Hints: {}", hints(request.field, ctx).join(", "))?;

        loop {
            write!(self.output, "Selector (or 'skip' / 'exit'): ")?;
            self.output.flush()?;

            let Some(answer) = self.read_line()? else {
                return Ok(Resolution::Abort);
            };
            match answer.to_ascii_lowercase().as_str() {
                "" => continue,
                "skip" => return Ok(Resolution::Skip),
                "exit" | "quit" => return Ok(Resolution::Abort),
                _ => {}
            }

            match validate_selector(request.page, &answer, request.field, ctx) {
                SelectorCheck::Invalid(reason) => {
                    writeln!(self.output, "Invalid selector: {}", reason)?;
                }
                SelectorCheck::NoMatch => {
                    writeln!(self.output, "No elements matched '{}'", answer)?;
                }
                SelectorCheck::Trivial { matches } => {
                    writeln!(
                        self.output,
                        "Matched {} element(s) but found no usable {}",
                        matches, request.field
                    )?;
                }
                SelectorCheck::Usable { matches, value } => {
                    if matches > 1
                        && !request.field.is_links()
                        && !self.ask(&format!("Found {} elements. Use first one?", matches))?
                    {
                        continue;
                    }
                    writeln!(self.output, "Preview:\n{}", preview(&value))?;
                    if self.ask("Is this correct?")? {
                        return Ok(Resolution::Confirmed {
                            selector: answer,
                            value,
                        });
                    }
                }
            }

            if !self.ask("Try again?")? {
                return Ok(Resolution::Skip);
            }
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> SelectorResolver for InteractiveResolver<R, W> {
    fn resolve(&mut self, request: &ResolveRequest<'_>) -> Resolution {
        match self.dialogue(request) {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(error = %e, "Operator console unavailable, disabling selector learning");
                Resolution::Abort
            }
        }
    }
}

fn hints(field: SemanticField, ctx: &ExtractionContext) -> Vec<String> {
    match field {
        SemanticField::Bio => [
            ".artist-bio",
            ".bio",
            ".description",
            r#"div[class*="bio"]"#,
            r#"div[class*="description"]"#,
            ".content p",
            "main p",
            "article p",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        SemanticField::LineupLinks => vec![
            format!(r#"a[href*="{}"]"#, ctx.artist_path),
            ".lineup a".to_string(),
            ".artist-card a".to_string(),
            "ul li a".to_string(),
        ],
        SemanticField::SocialLinks => vec![
            r#"a[target="_blank"]"#.to_string(),
            ".social a".to_string(),
            "footer a".to_string(),
        ],
    }
}

fn preview(value: &Extracted) -> String {
    match value {
        Extracted::Text(text) => {
            let mut shown: String = text.chars().take(PREVIEW_CHARS).collect();
            if text.chars().count() > PREVIEW_CHARS {
                shown.push_str("...");
            }
            shown
        }
        Extracted::Links(links) => {
            let mut lines: Vec<String> = links
                .iter()
                .take(PREVIEW_LINKS)
                .map(|l| format!("  {} -> {}", l.text, l.href))
                .collect();
            if links.len() > PREVIEW_LINKS {
                lines.push(format!("  ... {} more", links.len() - PREVIEW_LINKS));
            }
            lines.join("\n")
        }
    }
}
