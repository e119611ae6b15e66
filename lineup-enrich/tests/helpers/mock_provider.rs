//! Scripted EnrichmentProvider

use async_trait::async_trait;
use lineup_enrich::ai::{EnrichmentProvider, Prompt};
use lineup_enrich::ProviderError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Responder = dyn Fn(&Prompt, usize) -> Result<String, ProviderError> + Send + Sync;

/// Provider whose replies come from a closure of (prompt, call index)
pub struct MockProvider {
    responder: Box<Responder>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl MockProvider {
    pub fn new(
        responder: impl Fn(&Prompt, usize) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Same reply to every prompt
    pub fn always(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_, _| Ok(reply.clone()))
    }

    /// Reply picked by the first artist name found in the user message
    pub fn per_artist(replies: &[(&str, &str)]) -> Self {
        let replies: Vec<(String, String)> = replies
            .iter()
            .map(|(a, r)| (format!("\"{}\"", a), r.to_string()))
            .collect();
        Self::new(move |prompt, _| {
            replies
                .iter()
                .find(|(needle, _)| prompt.user.contains(needle.as_str()))
                .map(|(_, reply)| reply.clone())
                .ok_or_else(|| ProviderError::InvalidResponse("unscripted artist".into()))
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl EnrichmentProvider for MockProvider {
    async fn enrich(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        (self.responder)(prompt, index)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
