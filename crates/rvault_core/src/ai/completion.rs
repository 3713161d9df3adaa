//! Text completion port and its error type.

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Failure of one completion call.
#[derive(Debug)]
pub enum AiError {
    /// No provider credential configured.
    MissingApiKey,
    /// Request never produced an HTTP response.
    Transport(reqwest::Error),
    /// Provider answered with a non-success status.
    Provider { status: u16, body: String },
    /// Provider answered 2xx but the payload was unusable.
    InvalidResponse(String),
}

impl Display for AiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "AI provider API key not configured"),
            Self::Transport(err) => write!(f, "AI provider request failed: {err}"),
            Self::Provider { status, body } => {
                write!(f, "AI provider returned status {status}: {body}")
            }
            Self::InvalidResponse(message) => {
                write!(f, "AI provider returned an invalid response: {message}")
            }
        }
    }
}

impl Error for AiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AiError {
    /// Strips the request URL so query parameters never reach logs.
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.without_url())
    }
}

/// Opaque prompt-in, text-out generation call.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

#[async_trait]
impl<T: TextCompletion + ?Sized> TextCompletion for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        (**self).complete(prompt).await
    }
}

#[async_trait]
impl<T: TextCompletion + ?Sized> TextCompletion for Box<T> {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        (**self).complete(prompt).await
    }
}
