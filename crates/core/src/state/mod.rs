//! Shared reactive state: the single synchronization point between the
//! audio callback thread (producer) and the render thread (consumer).
//!
//! The producer publishes by swapping a pre-filled staging snapshot with the
//! shared one under the lock; the consumer copies the shared snapshot into
//! its own reusable buffer and releases before drawing. Neither side
//! allocates or does unbounded work while holding the lock.

use std::sync::{Mutex, MutexGuard};

use crate::analysis::{RING_CAPACITY, SPECTRUM_BINS};
use crate::{Result, VizError};

/// Scalar perceptual features derived from the spectrum once per capture
/// callback. This struct is the only channel through which most renderers
/// perceive audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactiveFeatures {
    /// Smoothed overall loudness proxy in [0, 1].
    pub level: f32,
    /// Smoothed bass-band level in [0, 1].
    pub low_band: f32,
    /// Smoothed treble-band level in [0, 1].
    pub high_band: f32,
    /// Decaying transient pulse in [0, 1]; jumps to 1.0 on a detected beat.
    pub beat_pulse: f32,
    /// True while both the overall and low-band levels sit under the
    /// silence threshold.
    pub is_silent: bool,
    /// Normalized spectral centroid in [0, 1]; 0.5 when there is no energy.
    pub centroid: f32,
    /// Rolling hue base in [0, 360); frozen while `speed` is zero.
    pub hue_base: f32,
    /// Adaptive spectrum gain, clamped to [0.5, 500].
    pub gain: f32,
    /// Monotonic animation phase accumulator.
    pub phase: f32,
    /// Animation speed derived from level and beat; zero when silent.
    pub speed: f32,
}

impl Default for ReactiveFeatures {
    fn default() -> Self {
        Self {
            level: 0.0,
            low_band: 0.0,
            high_band: 0.0,
            beat_pulse: 0.0,
            is_silent: true,
            centroid: 0.5,
            hue_base: 0.0,
            gain: 10.0,
            phase: 0.0,
            speed: 1.0,
        }
    }
}

/// One coherent view of the analyzer output: spectra, a waveform tail for
/// the renderers that read raw samples, and the scalar features.
#[derive(Debug, Clone)]
pub struct ReactiveSnapshot {
    /// Exponentially smoothed magnitude bins.
    pub smoothed: Vec<f32>,
    /// Running peak magnitudes with decay.
    pub peaks: Vec<f32>,
    /// Most recent raw mono samples, oldest first, zero-padded at the front
    /// until the ring has filled.
    pub waveform: Vec<f32>,
    pub features: ReactiveFeatures,
    /// Number of capture callbacks processed so far.
    pub callback_count: u64,
}

impl Default for ReactiveSnapshot {
    fn default() -> Self {
        Self {
            smoothed: vec![0.0; SPECTRUM_BINS],
            peaks: vec![0.0; SPECTRUM_BINS],
            waveform: vec![0.0; RING_CAPACITY],
            features: ReactiveFeatures::default(),
            callback_count: 0,
        }
    }
}

impl ReactiveSnapshot {
    /// Copies another snapshot into this one, reusing the existing buffers.
    pub fn copy_from(&mut self, other: &ReactiveSnapshot) {
        self.smoothed.copy_from_slice(&other.smoothed);
        self.peaks.copy_from_slice(&other.peaks);
        self.waveform.copy_from_slice(&other.waveform);
        self.features = other.features;
        self.callback_count = other.callback_count;
    }
}

/// Thread-safe holder for the latest [`ReactiveSnapshot`].
#[derive(Debug, Default)]
pub struct SharedReactiveState {
    inner: Mutex<ReactiveSnapshot>,
}

impl SharedReactiveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a freshly staged snapshot by swapping it with the shared
    /// one. The producer gets the previous snapshot back in `staged` and
    /// overwrites it completely on the next callback.
    pub fn publish(&self, staged: &mut ReactiveSnapshot) -> Result<()> {
        let mut guard = self.lock()?;
        std::mem::swap(&mut *guard, staged);
        Ok(())
    }

    /// Copies the latest snapshot into a caller-owned buffer. The lock is
    /// released before the caller touches the result.
    pub fn snapshot_into(&self, out: &mut ReactiveSnapshot) -> Result<()> {
        let guard = self.lock()?;
        out.copy_from(&guard);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ReactiveSnapshot>> {
        self.inner
            .lock()
            .map_err(|_| VizError::msg("reactive state lock has been poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_snapshot_round_trips() {
        let shared = SharedReactiveState::new();
        let mut staged = ReactiveSnapshot::default();
        staged.smoothed[3] = 0.5;
        staged.features.level = 0.7;
        staged.callback_count = 9;

        shared.publish(&mut staged).unwrap();

        let mut seen = ReactiveSnapshot::default();
        shared.snapshot_into(&mut seen).unwrap();
        assert_eq!(seen.smoothed[3], 0.5);
        assert_eq!(seen.features.level, 0.7);
        assert_eq!(seen.callback_count, 9);
    }

    #[test]
    fn publish_hands_back_the_previous_buffer() {
        let shared = SharedReactiveState::new();

        let mut first = ReactiveSnapshot::default();
        first.callback_count = 1;
        shared.publish(&mut first).unwrap();

        let mut second = ReactiveSnapshot::default();
        second.callback_count = 2;
        shared.publish(&mut second).unwrap();

        // The producer now owns the buffer published first.
        assert_eq!(second.callback_count, 1);
    }
}
