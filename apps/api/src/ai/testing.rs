//! Test doubles for the generation transport.

use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AiError, GenerateBackend};

/// Backend that pops scripted replies and counts calls. Once the script
/// drains, the fallback reply (if any) repeats forever.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, AiError>>>,
    fallback: Option<String>,
    pub calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<String, AiError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Backend that returns the same text forever.
    pub fn always(text: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GenerateBackend for ScriptedBackend {
    async fn list_models(&self) -> Result<Vec<String>, AiError> {
        Ok(vec!["models/gemini-2.5-flash".to_string()])
    }

    async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(reply) = self.replies.lock().expect("replies mutex").pop_front() {
            return reply;
        }
        match &self.fallback {
            Some(text) => Ok(text.clone()),
            None => Err(AiError::Api {
                status: 500,
                message: "script exhausted".to_string(),
            }),
        }
    }
}
