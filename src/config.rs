//! Configuration for the assistant
//!
//! Loads the add-on style `config.json` and validates it before the session
//! loop starts. Phrase lists are normalized (trimmed, lowercased) at load time
//! so matching against recognized text never needs to re-normalize them.

use crate::{HearthError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Which external backend answers spoken questions
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnswerModel {
    /// OpenAI chat completions
    #[default]
    OpenAi,
    /// Google Gemini
    Gemini,
}

impl std::fmt::Display for AnswerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerModel::OpenAi => write!(f, "openai"),
            AnswerModel::Gemini => write!(f, "gemini"),
        }
    }
}

/// A configured voice command: trigger phrases mapped to a Home Assistant entity
#[derive(Clone, Debug, Deserialize)]
pub struct CommandRule {
    /// Phrases that trigger this command (substring match against the utterance)
    pub phrases: Vec<String>,

    /// Button entity pressed when the command fires
    pub entity_id: String,
}

impl CommandRule {
    /// Check whether the utterance text contains any of this rule's phrases
    pub fn matches(&self, text: &str) -> bool {
        self.phrases.iter().any(|phrase| text.contains(phrase.as_str()))
    }
}

/// Timeout settings
#[derive(Clone, Debug, Deserialize)]
pub struct Timeouts {
    /// Seconds without an utterance before the session reverts to inactive
    pub return_to_listening: u64,
}

/// The `options` block of the configuration file
#[derive(Clone, Debug, Deserialize)]
pub struct Options {
    /// Where to fetch a speech model from, shown in the setup instructions
    #[serde(default)]
    pub vosk_model_download_url: String,

    /// Sample rate the recognizer and the capture stream run at
    pub vosk_samplerate: u32,

    /// API key for the selected answer backend
    pub ai_model_token: String,

    /// Base URL of the Home Assistant instance
    pub homeassistant_url: String,

    /// Long-lived Home Assistant access token
    pub token: String,

    /// Media player entity that plays spoken responses
    pub media_player: String,

    /// TTS entity used to synthesize responses
    pub tts_entity: String,

    /// Phrases that activate the session
    pub activation_phrases: Vec<String>,

    /// Phrases that deactivate the session
    pub deactivation_phrases: Vec<String>,

    /// Phrases that open a question dialog
    pub ai_question_phrases: Vec<String>,

    /// Voice commands, matched in declaration order
    pub commands: Vec<CommandRule>,

    /// Timeout settings
    pub timeouts: Timeouts,
}

/// Top-level configuration
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub options: Options,

    /// Which answer backend questions are routed to
    #[serde(default)]
    pub ai_model: AnswerModel,
}

impl Config {
    /// Load, normalize and validate the configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            HearthError::ConfigError(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        let config = Self::from_json(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and normalize configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Config = serde_json::from_str(json)
            .map_err(|e| HearthError::ConfigError(format!("invalid configuration: {}", e)))?;
        config.normalize();
        Ok(config)
    }

    /// Check the values the session loop depends on
    pub fn validate(&self) -> Result<()> {
        let options = &self.options;
        if options.vosk_samplerate == 0 {
            return Err(HearthError::ConfigError(
                "vosk_samplerate must be non-zero".to_string(),
            ));
        }
        if options.activation_phrases.is_empty() {
            return Err(HearthError::ConfigError(
                "at least one activation phrase is required".to_string(),
            ));
        }
        if options.timeouts.return_to_listening == 0 {
            return Err(HearthError::ConfigError(
                "timeouts.return_to_listening must be non-zero".to_string(),
            ));
        }
        if options.homeassistant_url.trim().is_empty() {
            return Err(HearthError::ConfigError(
                "homeassistant_url is required".to_string(),
            ));
        }
        for rule in &options.commands {
            if rule.entity_id.trim().is_empty() {
                return Err(HearthError::ConfigError(
                    "every command rule needs an entity_id".to_string(),
                ));
            }
            if rule.phrases.is_empty() {
                return Err(HearthError::ConfigError(format!(
                    "command rule for {} has no phrases",
                    rule.entity_id
                )));
            }
        }
        Ok(())
    }

    /// Idle duration after which the session reverts to inactive
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.options.timeouts.return_to_listening)
    }

    fn normalize(&mut self) {
        normalize_phrases(&mut self.options.activation_phrases);
        normalize_phrases(&mut self.options.deactivation_phrases);
        normalize_phrases(&mut self.options.ai_question_phrases);
        for rule in &mut self.options.commands {
            normalize_phrases(&mut rule.phrases);
        }
    }
}

fn normalize_phrases(phrases: &mut Vec<String>) {
    *phrases = phrases
        .iter()
        .map(|phrase| phrase.trim().to_lowercase())
        .filter(|phrase| !phrase.is_empty())
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_json() -> &'static str {
        r#"{
            "options": {
                "vosk_model_download_url": "https://example.com/model.zip",
                "vosk_samplerate": 16000,
                "ai_model_token": "sk-test",
                "homeassistant_url": "http://homeassistant.local:8123",
                "token": "ha-token",
                "media_player": "media_player.living_room",
                "tts_entity": "tts.piper",
                "activation_phrases": ["Hey Assistant"],
                "deactivation_phrases": ["goodbye"],
                "ai_question_phrases": ["i have a question"],
                "commands": [
                    { "phrases": ["lights on"], "entity_id": "button.lights_on" },
                    { "phrases": ["lights off"], "entity_id": "button.lights_off" }
                ],
                "timeouts": { "return_to_listening": 60 }
            },
            "ai_model": "gemini"
        }"#
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_json(sample_json()).unwrap();
        assert_eq!(config.options.vosk_samplerate, 16000);
        assert_eq!(config.options.homeassistant_url, "http://homeassistant.local:8123");
        assert_eq!(config.options.media_player, "media_player.living_room");
        assert_eq!(config.options.tts_entity, "tts.piper");
        assert_eq!(config.options.commands.len(), 2);
        assert_eq!(config.options.commands[0].entity_id, "button.lights_on");
        assert_eq!(config.options.timeouts.return_to_listening, 60);
        assert_eq!(config.ai_model, AnswerModel::Gemini);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ai_model_defaults_to_openai() {
        let json = sample_json().replace("\"ai_model\": \"gemini\"", "\"ai_model\": \"openai\"");
        let config = Config::from_json(&json).unwrap();
        assert_eq!(config.ai_model, AnswerModel::OpenAi);

        // Field absent entirely
        let json = r#"{
            "options": {
                "vosk_samplerate": 16000,
                "ai_model_token": "",
                "homeassistant_url": "http://ha.local",
                "token": "",
                "media_player": "media_player.x",
                "tts_entity": "tts.x",
                "activation_phrases": ["hey"],
                "deactivation_phrases": [],
                "ai_question_phrases": [],
                "commands": [],
                "timeouts": { "return_to_listening": 30 }
            }
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.ai_model, AnswerModel::OpenAi);
        assert!(config.options.vosk_model_download_url.is_empty());
    }

    #[test]
    fn test_unknown_ai_model_rejected() {
        let json = sample_json().replace("\"gemini\"", "\"llama\"");
        assert!(Config::from_json(&json).is_err());
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let json = sample_json().replace("\"token\": \"ha-token\",", "");
        assert!(Config::from_json(&json).is_err());
    }

    #[test]
    fn test_phrases_are_normalized() {
        let json = sample_json().replace(
            "[\"Hey Assistant\"]",
            "[\"  Hey Assistant \", \"OK Computer\", \"\"]",
        );
        let config = Config::from_json(&json).unwrap();
        assert_eq!(
            config.options.activation_phrases,
            vec!["hey assistant", "ok computer"]
        );
    }

    #[test]
    fn test_command_rule_matches_substring() {
        let rule = CommandRule {
            phrases: vec!["lights on".to_string(), "illuminate".to_string()],
            entity_id: "button.lights_on".to_string(),
        };
        assert!(rule.matches("turn the lights on please"));
        assert!(rule.matches("illuminate"));
        assert!(!rule.matches("turn the lights off"));
    }

    #[test]
    fn test_validate_rejects_zero_samplerate() {
        let json = sample_json().replace("16000", "0");
        let config = Config::from_json(&json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_activation() {
        let json = sample_json().replace("[\"Hey Assistant\"]", "[]");
        let config = Config::from_json(&json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let json = sample_json().replace(
            "{ \"return_to_listening\": 60 }",
            "{ \"return_to_listening\": 0 }",
        );
        let config = Config::from_json(&json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_rule_without_entity() {
        let json = sample_json().replace("button.lights_off", " ");
        let config = Config::from_json(&json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_idle_timeout_duration() {
        let config = Config::from_json(sample_json()).unwrap();
        assert_eq!(config.idle_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.options.vosk_samplerate, 16000);

        assert!(Config::load("/nonexistent/config.json").is_err());
    }
}
