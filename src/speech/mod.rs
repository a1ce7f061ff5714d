//! Speech recognition seam
//!
//! The recognizer is an opaque streaming engine behind the [`SpeechEngine`]
//! trait. The concrete Vosk implementation is feature-gated so builds without
//! the native libvosk library still compile and test everything else.

use crate::{HearthError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

#[cfg(feature = "vosk")]
pub mod vosk;

#[cfg(feature = "vosk")]
pub use vosk::VoskEngine;

/// Minimal streaming speech-to-text interface
pub trait SpeechEngine: Send {
    /// Feed one frame of mono S16LE PCM at the configured sample rate.
    /// Returns `Some(text)` when an utterance boundary was detected.
    fn accept_frame(&mut self, frame: &[i16]) -> Result<Option<String>>;

    /// Signal end of input and flush any partial utterance.
    fn finalize(&mut self) -> Result<Option<String>>;
}

/// Find a speech model directory under `models_dir`.
///
/// Models are unpacked one directory each; the first subdirectory in sorted
/// order wins. When none is present the error carries setup instructions,
/// including the configured download URL if there is one.
pub fn locate_model(models_dir: &Path, download_url: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(models_dir).map_err(|e| {
        HearthError::ModelError(format!("cannot create {}: {}", models_dir.display(), e))
    })?;

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(models_dir)
        .map_err(|e| {
            HearthError::ModelError(format!("cannot read {}: {}", models_dir.display(), e))
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    candidates.sort();

    match candidates.first() {
        Some(path) => {
            info!("Using speech model: {}", path.display());
            Ok(path.clone())
        }
        None => Err(HearthError::ModelError(missing_model_message(
            models_dir,
            download_url,
        ))),
    }
}

fn missing_model_message(models_dir: &Path, download_url: &str) -> String {
    let mut message = format!("no speech model found in {}", models_dir.display());
    if download_url.is_empty() {
        message.push_str("\nDownload a Vosk model and unpack it into that directory.");
    } else {
        message.push_str(&format!(
            "\nTo install one:\n  1. Download {}\n  2. Unpack the archive into {}\n  3. Start the assistant again",
            download_url,
            models_dir.display()
        ));
    }
    message
}

/// Build the speech engine for the configured sample rate.
#[cfg(feature = "vosk")]
pub fn create_engine(
    models_dir: &Path,
    download_url: &str,
    sample_rate: u32,
) -> Result<Box<dyn SpeechEngine>> {
    let model_path = locate_model(models_dir, download_url)?;
    Ok(Box::new(VoskEngine::new(&model_path, sample_rate)?))
}

/// Build the speech engine for the configured sample rate.
#[cfg(not(feature = "vosk"))]
pub fn create_engine(
    models_dir: &Path,
    download_url: &str,
    _sample_rate: u32,
) -> Result<Box<dyn SpeechEngine>> {
    // Model discovery still runs first; missing-model instructions win
    // over the missing-feature error.
    locate_model(models_dir, download_url)?;
    Err(HearthError::ModelError(
        "this build has no speech engine; rebuild with `--features vosk`".to_string(),
    ))
}
