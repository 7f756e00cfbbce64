//! Scripted backend for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{BackendError, CompletionService};

/// Returns a fixed reply and records every prompt it receives
pub(crate) struct ScriptedProvider {
    reply: Result<String, BackendError>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub(crate) fn answering(text: &str) -> Self {
        Self::with_reply(Ok(text.to_string()))
    }

    pub(crate) fn failing(err: BackendError) -> Self {
        Self::with_reply(Err(err))
    }

    fn with_reply(reply: Result<String, BackendError>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok()?.last().cloned()
    }
}

#[async_trait]
impl CompletionService for ScriptedProvider {
    fn name(&self) -> &'static str {
        "Scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.reply.clone()
    }
}
