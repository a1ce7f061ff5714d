//! Home Assistant REST client
//!
//! Commands are delivered as button presses and spoken feedback as TTS
//! announcements, both through the service-call API.

use crate::config::Options;
use crate::{HearthError, Result};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Sink for the two effects a session can have on the outside world
pub trait ActionSink: Send + Sync {
    /// Press the button entity behind a matched command.
    fn trigger_action(&self, entity_id: &str) -> Result<()>;

    /// Announce a message on the configured media player.
    fn speak(&self, message: &str) -> Result<()>;
}

/// Client for a Home Assistant instance
pub struct HomeAssistant {
    base_url: String,
    token: String,
    media_player: String,
    tts_entity: String,
    client: reqwest::blocking::Client,
}

impl HomeAssistant {
    pub fn new(options: &Options) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| HearthError::HomeAssistantError(e.to_string()))?;
        Ok(Self {
            base_url: options.homeassistant_url.trim_end_matches('/').to_string(),
            token: options.token.clone(),
            media_player: options.media_player.clone(),
            tts_entity: options.tts_entity.clone(),
            client,
        })
    }

    fn service_url(&self, domain: &str, service: &str) -> String {
        format!("{}/api/services/{}/{}", self.base_url, domain, service)
    }

    fn call_service(&self, domain: &str, service: &str, body: serde_json::Value) -> Result<()> {
        let url = self.service_url(domain, service);
        debug!("Calling Home Assistant service {}/{}", domain, service);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| HearthError::HomeAssistantError(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(HearthError::HomeAssistantError(format!(
                "service {}/{} returned {}: {}",
                domain, service, status, body
            )));
        }
        Ok(())
    }

    fn speak_body(&self, message: &str) -> serde_json::Value {
        json!({
            "entity_id": self.tts_entity,
            "media_player_entity_id": self.media_player,
            "message": message,
            "cache": false,
        })
    }
}

impl ActionSink for HomeAssistant {
    fn trigger_action(&self, entity_id: &str) -> Result<()> {
        self.call_service("button", "press", json!({ "entity_id": entity_id }))
    }

    fn speak(&self, message: &str) -> Result<()> {
        self.call_service("tts", "speak", self.speak_body(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;

    fn sample_options() -> Options {
        Options {
            vosk_model_download_url: String::new(),
            vosk_samplerate: 16000,
            ai_model_token: "ai-key".to_string(),
            homeassistant_url: "http://hass.local:8123/".to_string(),
            token: "ha-token".to_string(),
            media_player: "media_player.kitchen".to_string(),
            tts_entity: "tts.cloud".to_string(),
            activation_phrases: vec!["hey house".to_string()],
            deactivation_phrases: vec![],
            ai_question_phrases: vec![],
            commands: vec![],
            timeouts: crate::config::Timeouts {
                return_to_listening: 15,
            },
        }
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let ha = HomeAssistant::new(&sample_options()).unwrap();
        assert_eq!(
            ha.service_url("button", "press"),
            "http://hass.local:8123/api/services/button/press"
        );
        assert_eq!(
            ha.service_url("tts", "speak"),
            "http://hass.local:8123/api/services/tts/speak"
        );
    }

    #[test]
    fn test_speak_body_shape() {
        let ha = HomeAssistant::new(&sample_options()).unwrap();
        let body = ha.speak_body("Executing command for button.fan.");
        assert_eq!(body["entity_id"], "tts.cloud");
        assert_eq!(body["media_player_entity_id"], "media_player.kitchen");
        assert_eq!(body["message"], "Executing command for button.fan.");
        assert_eq!(body["cache"], false);
    }
}
