//! Canonical column names

pub const ARTIST: &str = "Artist";
pub const GENRE: &str = "Genre";
pub const COUNTRY: &str = "Country";
pub const BIO: &str = "Bio";
pub const AI_SUMMARY: &str = "AI Summary";
pub const AI_RATING: &str = "AI Rating";
pub const SPOTIFY_LINK: &str = "Spotify link";
pub const BAND_SIZE: &str = "Number of People in Act";
pub const FRONT_PERSON_GENDER: &str = "Gender of Front Person";
pub const FRONT_PERSON_OF_COLOR: &str = "Front Person of Color?";
pub const FESTIVAL_URL: &str = "Festival URL";
pub const FESTIVAL_BIO_NL: &str = "Festival Bio (NL)";
pub const FESTIVAL_BIO_EN: &str = "Festival Bio (EN)";
pub const SOCIAL_LINKS: &str = "Social Links";

/// Column order for a freshly created table
pub const STANDARD_COLUMNS: [&str; 14] = [
    ARTIST,
    GENRE,
    COUNTRY,
    BIO,
    AI_SUMMARY,
    AI_RATING,
    SPOTIFY_LINK,
    BAND_SIZE,
    FRONT_PERSON_GENDER,
    FRONT_PERSON_OF_COLOR,
    FESTIVAL_URL,
    FESTIVAL_BIO_NL,
    FESTIVAL_BIO_EN,
    SOCIAL_LINKS,
];

/// Fields the AI provider is asked to fill
pub const AI_FIELDS: [&str; 9] = [
    GENRE,
    COUNTRY,
    BIO,
    AI_SUMMARY,
    AI_RATING,
    SPOTIFY_LINK,
    BAND_SIZE,
    FRONT_PERSON_GENDER,
    FRONT_PERSON_OF_COLOR,
];

/// A row is sent to the provider (without force) if any of these is empty
pub const ENRICHMENT_TRIGGER_FIELDS: [&str; 5] = [GENRE, COUNTRY, BIO, AI_SUMMARY, AI_RATING];

/// Structured fields the bio extraction pass may backfill
pub const BIO_EXTRACTION_FIELDS: [&str; 5] = [
    GENRE,
    COUNTRY,
    BAND_SIZE,
    FRONT_PERSON_GENDER,
    FRONT_PERSON_OF_COLOR,
];

/// A row is scraped (without force) if any of these is empty
pub const FESTIVAL_DATA_FIELDS: [&str; 3] = [FESTIVAL_URL, FESTIVAL_BIO_NL, FESTIVAL_BIO_EN];
