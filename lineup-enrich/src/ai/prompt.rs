//! Prompt templates

use super::provider::Prompt;

const ENRICHMENT_SYSTEM: &str =
    "You are a music expert providing accurate, factual information about artists. Return only valid JSON.";

const EXTRACTION_SYSTEM: &str =
    "You are a precise data extraction assistant. Extract only explicitly stated facts. Return valid JSON.";

const ENRICHMENT_GUIDELINES: &str = r#"CRITICAL GUIDELINES:
- If a bio is provided in the context, use it as your PRIMARY source - extract genre, country, and style details from it
- For "AI Summary": be specific about their sound, influences and achievements; avoid generic phrases like "emerging artist with growing following" or "shows promise"
- For artists without bio: provide genre, country and basic info, but leave AI Summary and AI Rating empty if you lack details
- AI Rating: value innovation, freshness and emerging talent; new artists with a unique sound or buzz deserve 7-9, not 4-5

RATING SCALE (use the full range, weighted for discoverability):
- 10: reserved for universally acclaimed legends
- 8-9: exceptional artists, established or emerging with an innovative sound or strong buzz
- 6-7: quality artists, solid established acts or promising newcomers
- 4-5: developing artists, or established acts with mixed reception
- 1-3: very limited appeal or completely unknown

- Use official Spotify artist URLs only
- For groups with multiple front people, use "Mixed" for gender
- Use "Yes" for Front Person of Color only if confirmed, otherwise "No"
- Leave "Number of People in Act" empty for solo artists or when it varies (DJs, producers)
- Use short country names: "UK", "USA", "DR Congo"
- When in doubt about ANY field, leave it empty rather than guessing

Return ONLY valid JSON, no additional text."#;

/// Full-record enrichment prompt
///
/// With `existing_bio` the model is told to return that bio verbatim and to
/// ground its assessment in it.
pub fn enrichment_prompt(artist: &str, existing_bio: Option<&str>) -> Prompt {
    let existing_bio = existing_bio.map(str::trim).filter(|b| !b.is_empty());

    let (context_note, bio_line) = match existing_bio {
        Some(bio) => (
            format!(
                "\n\nCONTEXT: The artist's bio is: \"{}\"\nUse this bio as the primary source of truth. Base your critical assessment on the information in this bio, not on speculation or generic statements.",
                bio
            ),
            format!(
                "\"Bio\": \"{}\" (PRESERVE THIS EXACT BIO - do not change or rewrite it),",
                bio
            ),
        ),
        None => (
            String::new(),
            "\"Bio\": \"concise 1-2 sentence biography focusing on their music style and achievements\","
                .to_string(),
        ),
    };

    let user = format!(
        r#"Provide comprehensive information about the musical artist "{artist}" in JSON format with these exact fields:{context_note}

{{
    "Genre": "primary genre(s), separated by /",
    "Country": "country of origin (use short names: UK, USA, DR Congo, etc.)",
    {bio_line}
    "AI Summary": "brief critical assessment, specific about their sound/style (or empty string if insufficient info)",
    "AI Rating": "rating from 1-10 based on critical acclaim, live reputation, and artistic significance (or empty string if insufficient info)",
    "Spotify link": "full Spotify artist URL (https://open.spotify.com/artist/...)",
    "Number of People in Act": "number as integer, or empty if solo/varies",
    "Gender of Front Person": "Male/Female/Mixed/Non-binary",
    "Front Person of Color?": "Yes/No"
}}

{ENRICHMENT_GUIDELINES}"#
    );

    Prompt {
        system: ENRICHMENT_SYSTEM.to_string(),
        user,
        temperature: 0.3,
        max_tokens: Some(1000),
    }
}

/// Conservative structured-field extraction from a festival bio
pub fn bio_extraction_prompt(artist: &str, bio: &str) -> Prompt {
    let user = format!(
        r#"Extract ONLY explicitly stated factual information from this festival bio for artist "{artist}".
Be extremely conservative - only include information that is clearly stated. If not explicitly mentioned, return empty string.

Festival Bio:
{bio}

Extract the following if explicitly stated:
1. Genre: musical style/genre explicitly mentioned (e.g. "jazz", "indie rock", "psychedelia")
2. Country: country explicitly mentioned, or a city that clearly indicates it (e.g. "Amsterdam" -> Netherlands)
3. Number of People in Act: group size if stated ("solo" = 1, "duo" = 2, "trio" = 3, "quartet" = 4)
4. Gender of Front Person: only if pronouns are used consistently or it is explicitly stated; "Mixed" if multiple genders
5. Front Person of Color?: ONLY if ethnicity or heritage is explicitly mentioned; leave empty if unsure

Return valid JSON with these exact keys (use empty string if not found):
{{
  "Genre": "...",
  "Country": "...",
  "Number of People in Act": "...",
  "Gender of Front Person": "...",
  "Front Person of Color?": ""
}}"#
    );

    Prompt {
        system: EXTRACTION_SYSTEM.to_string(),
        user,
        temperature: 0.1,
        max_tokens: Some(300),
    }
}

/// Translation prompt; the reply is the translated text only
pub fn translation_prompt(text: &str, from: &str, to: &str) -> Prompt {
    Prompt {
        system: format!(
            "You are a professional translator. Translate the following text from {} to {}. Preserve the tone and style. Return ONLY the translated text, nothing else.",
            from, to
        ),
        user: text.to_string(),
        temperature: 0.3,
        max_tokens: None,
    }
}
