use crate::{HearthError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Microphone capture feeding mono i16 frames into a channel.
///
/// The stream runs at the configured recognizer sample rate; the callback
/// downmixes whatever channel count the device offers.
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    is_running: Arc<Mutex<bool>>,
}

impl AudioCapture {
    /// Open the default input device at the given sample rate
    pub fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| HearthError::AudioDeviceError("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported = device.default_input_config().map_err(|e| {
            HearthError::AudioDeviceError(format!("Failed to get input config: {}", e))
        })?;

        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self {
            device,
            config,
            stream: None,
            is_running: Arc::new(Mutex::new(false)),
        })
    }

    /// Get the sample rate the stream is configured for
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Get the number of input channels
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Start capturing and send frames to the provided channel
    pub fn start(&mut self, frames_tx: Sender<Vec<i16>>) -> Result<()> {
        if *self.is_running.lock() {
            warn!("Already capturing");
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let is_running = Arc::clone(&self.is_running);

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !*is_running.lock() {
                        return;
                    }

                    let frame = to_mono_i16(data, channels);
                    if let Err(e) = frames_tx.send(frame) {
                        debug!("Failed to send audio frame: {}", e);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                HearthError::AudioDeviceError(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            HearthError::AudioDeviceError(format!("Failed to start input stream: {}", e))
        })?;

        *self.is_running.lock() = true;
        self.stream = Some(stream);

        info!("Started audio capture at {} Hz", self.sample_rate());
        Ok(())
    }

    /// Stop capturing
    pub fn stop(&mut self) -> Result<()> {
        *self.is_running.lock() = false;

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Stopped audio capture");
        }

        Ok(())
    }

    /// Check if the stream is live
    pub fn is_running(&self) -> bool {
        *self.is_running.lock()
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Downmix interleaved f32 samples to a mono i16 frame
fn to_mono_i16(data: &[f32], channels: usize) -> Vec<i16> {
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .map(|sample| (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_mono_passthrough_conversion() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];
        let frame = to_mono_i16(&samples, 1);
        assert_eq!(frame.len(), 5);
        assert_eq!(frame[0], 0);
        assert_eq!(frame[3], i16::MAX);
        assert!(frame[1] > 16000 && frame[1] < 16500);
        assert!(frame[2] < -16000 && frame[2] > -16500);
    }

    #[test]
    fn test_stereo_downmix() {
        let samples = vec![0.5f32, 0.3, 0.7, 0.1];
        let frame = to_mono_i16(&samples, 2);
        assert_eq!(frame.len(), 2);
        // (0.5 + 0.3) / 2 = 0.4, (0.7 + 0.1) / 2 = 0.4
        let expected = (0.4f32 * i16::MAX as f32) as i16;
        assert!((frame[0] - expected).abs() <= 1);
        assert!((frame[1] - expected).abs() <= 1);
    }

    #[test]
    fn test_clipping_is_clamped() {
        let samples = vec![2.0f32, -2.0];
        let frame = to_mono_i16(&samples, 1);
        assert_eq!(frame, vec![i16::MAX, i16::MIN + 1]);
    }

    #[test]
    fn test_capture_creation() {
        // This test might fail in CI environments without audio devices
        if let Ok(capture) = AudioCapture::new(16000) {
            assert_eq!(capture.sample_rate(), 16000);
            assert!(capture.channels() > 0);
            assert!(!capture.is_running());
        }
    }

    #[test]
    fn test_capture_state() {
        if let Ok(mut capture) = AudioCapture::new(16000) {
            assert!(!capture.is_running());

            let (tx, _rx) = unbounded();
            if capture.start(tx).is_ok() {
                assert!(capture.is_running());

                let _ = capture.stop();
                assert!(!capture.is_running());
            }
        }
    }
}
