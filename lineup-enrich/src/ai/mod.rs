//! AI provider boundary
//!
//! The merge layer sees a provider only as `enrich(prompt) -> text`
//! ([`EnrichmentProvider`]). Prompt wording lives in [`prompt`], turning the
//! returned text into field candidates lives in [`response`].

pub mod openai;
pub mod prompt;
pub mod provider;
pub mod response;

pub use openai::ChatCompletionsProvider;
pub use provider::{EnrichmentProvider, Prompt};
pub use response::parse_proposal;
