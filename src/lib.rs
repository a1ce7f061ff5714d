pub mod answer;
#[cfg(feature = "audio-io")]
pub mod audio;
pub mod config;
pub mod dispatch;
pub mod homeassistant;
pub mod producer;
pub mod session;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum HearthError {
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Speech model error: {0}")]
    ModelError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Home Assistant error: {0}")]
    HomeAssistantError(String),

    #[error("Answer backend error: {0}")]
    AnswerError(String),
}

impl HearthError {
    /// Sentence spoken to the user when this error is reported aloud.
    pub fn spoken_message(&self) -> String {
        match self {
            HearthError::AudioDeviceError(_) => {
                "The microphone is not available right now.".to_string()
            }
            HearthError::ModelError(_) => {
                "Speech recognition is not working right now.".to_string()
            }
            HearthError::ConfigError(_) => {
                "The configuration is invalid.".to_string()
            }
            HearthError::HomeAssistantError(_) => {
                "I could not reach Home Assistant.".to_string()
            }
            HearthError::AnswerError(_) => {
                "I could not reach the answer service.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, HearthError>;
