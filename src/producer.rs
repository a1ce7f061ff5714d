//! Utterance producer: audio frames in, recognized text out
//!
//! Runs on its own thread. The session loop on the other side of the
//! utterance channel is the only consumer.

use crate::session::Utterance;
use crate::speech::SpeechEngine;
use crossbeam_channel::{Receiver, Sender};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Worker that turns raw audio frames into normalized utterances
pub struct UtteranceProducer {
    frames_rx: Receiver<Vec<i16>>,
    utterances_tx: Sender<Utterance>,
    engine: Box<dyn SpeechEngine>,
}

impl UtteranceProducer {
    pub fn new(
        frames_rx: Receiver<Vec<i16>>,
        utterances_tx: Sender<Utterance>,
        engine: Box<dyn SpeechEngine>,
    ) -> Self {
        Self {
            frames_rx,
            utterances_tx,
            engine,
        }
    }

    /// Spawn the producer thread.
    ///
    /// The thread runs until the frame channel disconnects. Recognition
    /// errors are logged and the offending frame skipped; utterances with
    /// empty text are dropped before they reach the queue.
    pub fn start(mut self) -> JoinHandle<()> {
        std::thread::spawn(move || {
            info!("Utterance producer starting");

            loop {
                let frame = match self.frames_rx.recv() {
                    Ok(frame) => frame,
                    Err(_) => {
                        info!("Frame channel disconnected, utterance producer exiting");
                        break;
                    }
                };

                match self.engine.accept_frame(&frame) {
                    Ok(Some(text)) => {
                        let text = text.trim().to_lowercase();
                        if text.is_empty() {
                            continue;
                        }
                        debug!("Recognized utterance: {}", text);
                        if self.utterances_tx.send(Utterance::new(text)).is_err() {
                            info!("Utterance channel disconnected, utterance producer exiting");
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Recognition failed for a frame: {}", e);
                    }
                }
            }
        })
    }
}
