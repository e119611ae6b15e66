//! Typed column values
//!
//! The table stores everything as text. These parsers decide whether a
//! candidate string (usually from the AI provider) is a legal value for
//! its column, and produce the canonical spelling written to the CSV.

use super::columns;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Spotify artist page URL
pub static SPOTIFY_ARTIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://open\.spotify\.com/artist/[a-zA-Z0-9]+").expect("valid regex")
});

/// `Gender of Front Person`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontPersonGender {
    Male,
    Female,
    Mixed,
    NonBinary,
}

impl FromStr for FrontPersonGender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "mixed" => Ok(Self::Mixed),
            "non-binary" | "nonbinary" | "non binary" => Ok(Self::NonBinary),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FrontPersonGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Mixed => "Mixed",
            Self::NonBinary => "Non-binary",
        };
        f.write_str(s)
    }
}

/// `Front Person of Color?`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontPersonOfColor {
    Yes,
    No,
}

impl FromStr for FrontPersonOfColor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Ok(Self::Yes),
            "no" | "false" => Ok(Self::No),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FrontPersonOfColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "Yes",
            Self::No => "No",
        })
    }
}

/// Parse a rating as reported by the provider
///
/// Accepts `7`, `7.5` and `7/10`. Zero means "insufficient information"
/// and yields `None`, as does anything outside (0, 10].
pub fn parse_rating(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let number = raw.split('/').next().unwrap_or(raw).trim();
    let value: f64 = number.parse().ok()?;
    if value.is_finite() && value > 0.0 && value <= 10.0 {
        Some(value)
    } else {
        None
    }
}

/// Parse a band size; group words are understood
pub fn parse_band_size(raw: &str) -> Option<u32> {
    let raw = raw.trim().to_ascii_lowercase();
    let size = match raw.as_str() {
        "solo" => 1,
        "duo" => 2,
        "trio" => 3,
        "quartet" => 4,
        "quintet" => 5,
        "sextet" => 6,
        other => other.parse().ok()?,
    };
    (size > 0).then_some(size)
}

/// Canonical form of a candidate value for `column`, or `None` if the
/// candidate is empty or not a legal value for that column.
pub fn normalize(column: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match column {
        columns::AI_RATING => parse_rating(raw).map(format_rating),
        columns::BAND_SIZE => parse_band_size(raw).map(|n| n.to_string()),
        columns::FRONT_PERSON_GENDER => raw.parse::<FrontPersonGender>().ok().map(|g| g.to_string()),
        columns::FRONT_PERSON_OF_COLOR => raw.parse::<FrontPersonOfColor>().ok().map(|p| p.to_string()),
        columns::SPOTIFY_LINK => SPOTIFY_ARTIST_RE.find(raw).map(|m| m.as_str().to_string()),
        _ => Some(raw.to_string()),
    }
}

fn format_rating(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}
