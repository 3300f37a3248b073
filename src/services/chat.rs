//! Medical assistant chat client
//!
//! Thin client for the shared chat endpoint. Any failure degrades to
//! `ChatUnavailable`, which callers render as a single inline message;
//! session state is never affected.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("fedhealth-client/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CHAT_PATH: &str = "/chat/meditron";

/// One prior exchange in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [ChatTurn],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Chat endpoint client
pub struct ChatClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Send a message and return the assistant's reply
    pub async fn send(&self, message: &str, history: &[ChatTurn]) -> Result<String> {
        let url = format!("{}{}", self.base_url, CHAT_PATH);
        let request = ChatRequest { message, history };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Chat request failed");
                Error::ChatUnavailable
            })?;

        let status = response.status();

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Chat endpoint returned error");
            return Err(Error::ChatUnavailable);
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Chat response parse failed");
            Error::ChatUnavailable
        })?;

        Ok(body.response)
    }
}
