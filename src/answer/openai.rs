//! OpenAI chat completions backend

use super::AnswerBackend;
use crate::{HearthError, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4o-mini";
const SYSTEM_PROMPT: &str = "You are an assistant answering questions.";
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OpenAi {
    token: String,
    client: reqwest::blocking::Client,
}

impl OpenAi {
    pub fn new(token: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| HearthError::AnswerError(e.to_string()))?;
        Ok(Self { token, client })
    }
}

impl AnswerBackend for OpenAi {
    fn answer(&self, question: &str) -> Result<String> {
        debug!("Sending question to OpenAI ({})", MODEL);
        let body = json!({
            "model": MODEL,
            "store": true,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": question },
            ],
        });
        let res = self
            .client
            .post(API_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| HearthError::AnswerError(e.to_string()))?;
        let status = res.status();
        let text = res
            .text()
            .map_err(|e| HearthError::AnswerError(e.to_string()))?;
        if !status.is_success() {
            return Err(HearthError::AnswerError(format!(
                "OpenAI returned {}: {}",
                status, text
            )));
        }
        let json: Value =
            serde_json::from_str(&text).map_err(|e| HearthError::AnswerError(e.to_string()))?;
        parse_reply(&json)
    }
}

/// Pull the assistant reply out of a chat completions response.
fn parse_reply(json: &Value) -> Result<String> {
    let reply = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    if reply.is_empty() {
        return Err(HearthError::AnswerError(
            "response contained no reply text".to_string(),
        ));
    }
    Ok(reply)
}
