#![allow(dead_code)]

use async_trait::async_trait;
use rvault_core::{AiError, KeyValueStorage, StorageError, TextCompletion};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Canned provider answers, consumed in order.
pub enum Reply {
    Text(&'static str),
    Fail,
}

/// Completion fake that replays `Reply` values and records prompts.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text.to_string()),
            Some(Reply::Fail) | None => Err(AiError::Provider {
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }
}

/// Storage whose writes always fail, e.g. a full quota.
#[derive(Default)]
pub struct ReadOnlyStorage;

impl KeyValueStorage for ReadOnlyStorage {
    fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }

    fn save(&self, _key: &str, _value: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}
