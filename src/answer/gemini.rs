//! Google Gemini backend

use super::AnswerBackend;
use crate::{HearthError, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub struct Gemini {
    token: String,
    client: reqwest::blocking::Client,
}

impl Gemini {
    pub fn new(token: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| HearthError::AnswerError(e.to_string()))?;
        Ok(Self { token, client })
    }
}

impl AnswerBackend for Gemini {
    fn answer(&self, question: &str) -> Result<String> {
        debug!("Sending question to Gemini");
        let body = json!({
            "contents": [{
                "parts": [{ "text": question }],
            }],
        });
        let res = self
            .client
            .post(API_URL)
            .query(&[("key", self.token.as_str())])
            .json(&body)
            .send()
            .map_err(|e| HearthError::AnswerError(e.to_string()))?;
        let status = res.status();
        let text = res
            .text()
            .map_err(|e| HearthError::AnswerError(e.to_string()))?;
        if !status.is_success() {
            return Err(HearthError::AnswerError(format!(
                "Gemini returned {}: {}",
                status, text
            )));
        }
        let json: Value =
            serde_json::from_str(&text).map_err(|e| HearthError::AnswerError(e.to_string()))?;
        parse_reply(&json)
    }
}

/// Pull the reply text out of a generateContent response.
fn parse_reply(json: &Value) -> Result<String> {
    let reply = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|p| p.as_array())
        .and_then(|arr| arr.first())
        .and_then(|part| part.get("text"))
        .and_then(|t| t.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    if reply.is_empty() {
        return Err(HearthError::AnswerError(
            "response contained no reply text".to_string(),
        ));
    }
    Ok(reply)
}
