//! Vosk-backed speech engine

use super::SpeechEngine;
use crate::{HearthError, Result};
use std::path::Path;
use vosk::{DecodingState, Model, Recognizer};

/// Streaming recognizer over a local Vosk model
pub struct VoskEngine {
    recognizer: Recognizer,
}

impl VoskEngine {
    /// Load the model and build a recognizer at the given sample rate.
    pub fn new(model_path: &Path, sample_rate: u32) -> Result<Self> {
        let model = Model::new(model_path.to_string_lossy()).ok_or_else(|| {
            HearthError::ModelError(format!(
                "cannot load speech model at {}",
                model_path.display()
            ))
        })?;
        let mut recognizer = Recognizer::new(&model, sample_rate as f32).ok_or_else(|| {
            HearthError::ModelError(format!("cannot create recognizer at {} Hz", sample_rate))
        })?;
        recognizer.set_max_alternatives(0);
        recognizer.set_words(false);
        Ok(Self { recognizer })
    }

    fn take_result(&mut self) -> Option<String> {
        let text = self
            .recognizer
            .result()
            .single()
            .map(|result| result.text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl SpeechEngine for VoskEngine {
    fn accept_frame(&mut self, frame: &[i16]) -> Result<Option<String>> {
        match self.recognizer.accept_waveform(frame) {
            Ok(DecodingState::Finalized) => Ok(self.take_result()),
            Ok(DecodingState::Running) => Ok(None),
            Ok(DecodingState::Failed) => Err(HearthError::ModelError(
                "recognizer failed to decode frame".to_string(),
            )),
            Err(e) => Err(HearthError::ModelError(format!(
                "recognizer rejected frame: {:?}",
                e
            ))),
        }
    }

    fn finalize(&mut self) -> Result<Option<String>> {
        let text = self
            .recognizer
            .final_result()
            .single()
            .map(|result| result.text.trim().to_string())
            .unwrap_or_default();
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_rejected() {
        assert!(VoskEngine::new(Path::new("/nonexistent/model"), 16000).is_err());
    }
}
