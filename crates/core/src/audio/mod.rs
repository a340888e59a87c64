//! Audio capture: the sample ring and the cpal capture adapter.
//!
//! The capture callback owns the [`AnalysisEngine`] outright; the only thing
//! that crosses threads is the published [`ReactiveSnapshot`]. Capture
//! errors are fatal for the session — there is no automatic device-switch
//! recovery, the caller restarts capture against a new device.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;

use crate::analysis::AnalysisEngine;
use crate::state::{ReactiveSnapshot, SharedReactiveState};
use crate::{Result, VizError};

/// Bounded ring of raw mono samples with drop-oldest backpressure. Pushes
/// never block and never allocate.
#[derive(Debug, Clone)]
pub struct SampleRing {
    buf: Vec<f32>,
    write: usize,
    filled: usize,
}

impl SampleRing {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity.max(1)],
            write: 0,
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn clear(&mut self) {
        self.write = 0;
        self.filled = 0;
        self.buf.fill(0.0);
    }

    /// Appends one sample, overwriting the oldest when full.
    pub fn push(&mut self, sample: f32) {
        self.buf[self.write] = sample;
        self.write = (self.write + 1) % self.buf.len();
        self.filled = (self.filled + 1).min(self.buf.len());
    }

    pub fn extend(&mut self, samples: &[f32]) {
        for &s in samples {
            self.push(s);
        }
    }

    /// Copies the most recent samples into `out` in chronological order,
    /// zero-padding the front when fewer samples are available.
    pub fn copy_latest(&self, out: &mut [f32]) {
        let take = self.filled.min(out.len());
        let pad = out.len() - take;
        out[..pad].fill(0.0);

        let cap = self.buf.len();
        let start = (self.write + cap - take) % cap;
        let first = take.min(cap - start);
        out[pad..pad + first].copy_from_slice(&self.buf[start..start + first]);
        if first < take {
            out[pad + first..].copy_from_slice(&self.buf[..take - first]);
        }
    }
}

/// Lists the names of the capture devices the default host exposes.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let mut names = Vec::new();
    for device in host.input_devices()? {
        if let Ok(name) = device.name() {
            names.push(name);
        }
    }
    Ok(names)
}

/// A live capture session feeding an [`AnalysisEngine`] and publishing
/// snapshots to the shared reactive state.
pub struct AudioCapture {
    stream: Option<cpal::Stream>,
    failed: Arc<AtomicBool>,
    device_name: String,
    sample_rate: u32,
    channels: u16,
}

impl AudioCapture {
    /// Opens a capture stream on the named device (or the host default),
    /// moving the engine into the callback. Fails if no device is usable —
    /// the core cannot operate without a capture source.
    pub fn start(
        device_name: Option<&str>,
        mut engine: AnalysisEngine,
        shared: Arc<SharedReactiveState>,
    ) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| VizError::msg(format!("capture device '{name}' not found")))?,
            None => host
                .default_input_device()
                .ok_or_else(|| VizError::msg("no capture device available"))?,
        };
        let resolved_name = device.name().unwrap_or_else(|_| "<unknown>".to_string());

        let config = device.default_input_config()?;
        if config.sample_format() != SampleFormat::F32 {
            return Err(VizError::msg(format!(
                "capture device '{resolved_name}' does not provide f32 samples"
            )));
        }
        let channels = config.channels();
        let sample_rate = config.sample_rate().0;
        tracing::info!(
            device = %resolved_name,
            sample_rate,
            channels,
            "starting audio capture"
        );

        let failed = Arc::new(AtomicBool::new(false));
        let failed_flag = failed.clone();
        let channel_count = channels as usize;
        let mut staged = ReactiveSnapshot::default();

        let stream = device.build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Err(err) = engine.push_interleaved(data, channel_count) {
                    tracing::warn!(%err, "dropping capture block");
                    return;
                }
                engine.write_snapshot(&mut staged);
                if shared.publish(&mut staged).is_err() {
                    tracing::warn!("reactive state unavailable; snapshot dropped");
                }
            },
            move |err| {
                tracing::error!(%err, "capture stream failed");
                failed_flag.store(true, Ordering::SeqCst);
            },
            None,
        )?;
        stream.play()?;

        Ok(Self {
            stream: Some(stream),
            failed,
            device_name: resolved_name,
            sample_rate,
            channels,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// True once the stream has reported a fatal error (device removed,
    /// permission revoked). The session cannot recover; restart capture.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    /// Stops the capture session. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::info!(device = %self.device_name, "audio capture stopped");
        }
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_drops_oldest_beyond_capacity() {
        let mut ring = SampleRing::with_capacity(4);
        ring.extend(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(ring.len(), 4);

        let mut out = [0.0; 4];
        ring.copy_latest(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn ring_zero_pads_the_front_on_underrun() {
        let mut ring = SampleRing::with_capacity(8);
        ring.extend(&[1.0, 2.0]);

        let mut out = [9.0; 5];
        ring.copy_latest(&mut out);
        assert_eq!(out, [0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn copy_smaller_than_fill_takes_most_recent() {
        let mut ring = SampleRing::with_capacity(8);
        ring.extend(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut out = [0.0; 2];
        ring.copy_latest(&mut out);
        assert_eq!(out, [4.0, 5.0]);
    }

    #[test]
    fn clear_resets_fill_level() {
        let mut ring = SampleRing::with_capacity(4);
        ring.extend(&[1.0, 2.0, 3.0]);
        ring.clear();
        assert!(ring.is_empty());

        let mut out = [7.0; 3];
        ring.copy_latest(&mut out);
        assert_eq!(out, [0.0, 0.0, 0.0]);
    }
}
