//! Spectral analysis and reactive feature extraction.
//!
//! [`AnalysisEngine`] runs entirely on the audio callback thread: it windows
//! the most recent samples, runs the forward FFT, maintains the smoothed and
//! peak spectra, and derives the scalar [`ReactiveFeatures`] that drive the
//! renderers. The engine publishes nothing itself; the capture adapter
//! stages a [`ReactiveSnapshot`] from it after every callback.

use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::audio::SampleRing;
use crate::state::{ReactiveFeatures, ReactiveSnapshot};
use crate::{Result, VizError};

/// Fixed FFT window length.
pub const FFT_WINDOW_LEN: usize = 1024;
/// Number of magnitude bins produced per window.
pub const SPECTRUM_BINS: usize = FFT_WINDOW_LEN / 2;
/// Capacity of the raw sample ring: four FFT windows.
pub const RING_CAPACITY: usize = FFT_WINDOW_LEN * 4;

// Reactive coupling constants. These are empirically tuned; changing any of
// them changes the observed feel of every visualizer.
/// New-sample weight for the smoothed spectrum EMA.
pub const SPECTRUM_SMOOTHING: f32 = 0.2;
/// Per-callback decay applied to peak bins the smoothed value stays under.
pub const PEAK_DECAY: f32 = 0.99;
/// Level the adaptive gain steers the loudest smoothed bin toward.
pub const SPECTRUM_TARGET_LEVEL: f32 = 0.7;
/// New-sample weight when blending the gain toward its target.
pub const GAIN_SMOOTHING: f32 = 0.1;
pub const GAIN_MIN: f32 = 0.5;
pub const GAIN_MAX: f32 = 500.0;
/// New-sample weight for the level/low/high band EMAs.
pub const BAND_SMOOTHING: f32 = 0.3;
const LEVEL_GAIN: f32 = 50.0;
const LOW_BAND_GAIN: f32 = 80.0;
const HIGH_BAND_GAIN: f32 = 60.0;
/// Both the overall and low-band levels must sit under this for silence.
pub const SILENCE_THRESHOLD: f32 = 0.02;
/// Minimum low-band rise that registers as a beat.
pub const BEAT_RISE_THRESHOLD: f32 = 0.08;
/// Geometric decay of the beat pulse absent new rises.
pub const BEAT_PULSE_DECAY: f32 = 0.86;
/// New-sample weight for the low-band reference the rise is measured from.
const LOW_TRACKER_SMOOTHING: f32 = 0.2;
const SPEED_BASE: f32 = 0.4;
const SPEED_LEVEL_GAIN: f32 = 2.0;
const SPEED_BEAT_GAIN: f32 = 4.0;
/// Speeds below this snap to zero, freezing animation and hue.
const SPEED_SNAP: f32 = 0.001;
const HUE_CENTROID_GAIN: f32 = 5.0;
const HUE_LEVEL_GAIN: f32 = 2.0;
const HUE_SPEED_GAIN: f32 = 0.8;
const HUE_BEAT_GAIN: f32 = 1.0;
const EPSILON: f32 = 1e-6;

// realfft output is unscaled; the single-sided magnitude folds in the 1/N
// normalization the feature gains above are tuned against.
const MAGNITUDE_SCALE: f32 = 2.0 / FFT_WINDOW_LEN as f32;

/// Windowing, FFT, spectrum smoothing, and reactive feature extraction.
pub struct AnalysisEngine {
    sample_rate: u32,
    ring: SampleRing,
    fft: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    output: Vec<Complex32>,
    scratch: Vec<Complex32>,
    raw: Vec<f32>,
    smoothed: Vec<f32>,
    peaks: Vec<f32>,
    features: ReactiveFeatures,
    previous_low: f32,
    callback_count: u64,
}

impl AnalysisEngine {
    /// Creates a new engine using the default 48 kHz sample rate.
    pub fn new() -> Self {
        Self::with_sample_rate(48_000)
    }

    /// Creates a new engine that operates at the provided sample rate.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_WINDOW_LEN);
        let input = fft.make_input_vec();
        let output = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();
        Self {
            sample_rate,
            ring: SampleRing::with_capacity(RING_CAPACITY),
            fft,
            input,
            output,
            scratch,
            raw: vec![0.0; SPECTRUM_BINS],
            smoothed: vec![0.0; SPECTRUM_BINS],
            peaks: vec![0.0; SPECTRUM_BINS],
            features: ReactiveFeatures::default(),
            previous_low: 0.0,
            callback_count: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Clears the accumulated state while preserving configuration.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.raw.fill(0.0);
        self.smoothed.fill(0.0);
        self.peaks.fill(0.0);
        self.features = ReactiveFeatures::default();
        self.previous_low = 0.0;
        self.callback_count = 0;
    }

    /// Consumes one capture callback worth of interleaved samples, keeping
    /// channel 0 only.
    pub fn push_interleaved(&mut self, samples: &[f32], channels: usize) -> Result<()> {
        if channels == 0 {
            return Err(VizError::InvalidInput("channel count must be non-zero"));
        }
        if channels == 1 {
            return self.push_samples(samples);
        }
        for frame in samples.chunks(channels) {
            self.ring.push(frame[0]);
        }
        self.process_window()
    }

    /// Consumes one capture callback worth of mono samples and updates all
    /// tracked spectra and features. An empty buffer is a no-op.
    pub fn push_samples(&mut self, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        self.ring.extend(samples);
        self.process_window()
    }

    /// Instantaneous magnitude bins from the latest window.
    pub fn raw_spectrum(&self) -> &[f32] {
        &self.raw
    }

    /// Exponentially smoothed magnitude bins.
    pub fn smoothed_spectrum(&self) -> &[f32] {
        &self.smoothed
    }

    /// Running peak bins with decay.
    pub fn peak_spectrum(&self) -> &[f32] {
        &self.peaks
    }

    pub fn features(&self) -> &ReactiveFeatures {
        &self.features
    }

    pub fn callback_count(&self) -> u64 {
        self.callback_count
    }

    /// Fills a snapshot with the current spectra, waveform tail, and
    /// features, ready to be published to the render thread.
    pub fn write_snapshot(&self, out: &mut ReactiveSnapshot) {
        out.smoothed.copy_from_slice(&self.smoothed);
        out.peaks.copy_from_slice(&self.peaks);
        self.ring.copy_latest(&mut out.waveform);
        out.features = self.features;
        out.callback_count = self.callback_count;
    }

    fn process_window(&mut self) -> Result<()> {
        // Latest window, zero-padded at the front on underrun, then Hamming.
        self.ring.copy_latest(&mut self.input);
        for (i, value) in self.input.iter_mut().enumerate() {
            *value *= hamming_value(i, FFT_WINDOW_LEN);
        }

        self.fft
            .process_with_scratch(&mut self.input, &mut self.output, &mut self.scratch)?;

        for i in 0..SPECTRUM_BINS {
            self.raw[i] = self.output[i].norm() * MAGNITUDE_SCALE;
        }

        for i in 0..SPECTRUM_BINS {
            self.smoothed[i] =
                self.smoothed[i] * (1.0 - SPECTRUM_SMOOTHING) + self.raw[i] * SPECTRUM_SMOOTHING;
            if self.smoothed[i] > self.peaks[i] {
                self.peaks[i] = self.smoothed[i];
            } else {
                self.peaks[i] *= PEAK_DECAY;
            }
        }

        self.update_gain();
        self.update_features();

        self.callback_count += 1;
        Ok(())
    }

    fn update_gain(&mut self) {
        let current_peak = self.smoothed.iter().cloned().fold(0.0_f32, f32::max);
        // Silence leaves the gain untouched; no division by zero.
        if current_peak > EPSILON {
            let desired = SPECTRUM_TARGET_LEVEL / current_peak;
            let blended =
                self.features.gain * (1.0 - GAIN_SMOOTHING) + desired * GAIN_SMOOTHING;
            self.features.gain = blended.clamp(GAIN_MIN, GAIN_MAX);
        }
    }

    fn update_features(&mut self) {
        let n = self.smoothed.len();
        let mut sum = 0.0_f32;
        let mut weighted = 0.0_f32;
        for (i, &v) in self.smoothed.iter().enumerate() {
            sum += v;
            weighted += v * i as f32;
        }

        let avg = if n > 0 { sum / n as f32 } else { 0.0 };
        let level = (avg * LEVEL_GAIN).min(1.0);
        self.features.level =
            self.features.level * (1.0 - BAND_SMOOTHING) + level * BAND_SMOOTHING;

        let low_count = (n / 16).max(1);
        let low_avg = self.smoothed[..low_count].iter().sum::<f32>() / low_count as f32;
        let low_level = (low_avg * LOW_BAND_GAIN).min(1.0);
        self.features.low_band =
            self.features.low_band * (1.0 - BAND_SMOOTHING) + low_level * BAND_SMOOTHING;

        let high_start = n / 2;
        let high_count = (n - high_start).max(1);
        let high_avg = self.smoothed[high_start..].iter().sum::<f32>() / high_count as f32;
        let high_level = (high_avg * HIGH_BAND_GAIN).min(1.0);
        self.features.high_band =
            self.features.high_band * (1.0 - BAND_SMOOTHING) + high_level * BAND_SMOOTHING;

        self.features.is_silent =
            self.features.level < SILENCE_THRESHOLD && low_level < SILENCE_THRESHOLD;

        // Beat: a rising low band while audible resets the pulse to 1.
        let rise = low_level - self.previous_low;
        if !self.features.is_silent && rise > BEAT_RISE_THRESHOLD {
            self.features.beat_pulse = 1.0;
        } else {
            self.features.beat_pulse *= BEAT_PULSE_DECAY;
        }
        self.previous_low =
            self.previous_low * (1.0 - LOW_TRACKER_SMOOTHING) + low_level * LOW_TRACKER_SMOOTHING;

        // Animation speed tracks level and beat; silence freezes it.
        let target_speed = if self.features.is_silent {
            0.0
        } else {
            SPEED_BASE
                + self.features.level * SPEED_LEVEL_GAIN
                + self.features.beat_pulse * SPEED_BEAT_GAIN
        };
        self.features.speed =
            self.features.speed * (1.0 - BAND_SMOOTHING) + target_speed * BAND_SMOOTHING;
        if self.features.speed < SPEED_SNAP {
            self.features.speed = 0.0;
        }
        if self.features.speed > 0.0 {
            self.features.phase += self.features.speed;
        }

        self.features.centroid = if sum > 0.0 {
            (weighted / sum) / n.max(1) as f32
        } else {
            0.5
        };

        // Hue evolves only while there is motion, so color visibly stops
        // with the sound.
        if self.features.speed > 0.0 {
            self.features.hue_base = (self.features.hue_base
                + self.features.centroid * HUE_CENTROID_GAIN
                + self.features.level * HUE_LEVEL_GAIN
                + self.features.speed * HUE_SPEED_GAIN
                + self.features.beat_pulse * HUE_BEAT_GAIN)
                .rem_euclid(360.0);
        }
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("sample_rate", &self.sample_rate)
            .field("callback_count", &self.callback_count)
            .field("features", &self.features)
            .finish()
    }
}

fn hamming_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }
    0.54 - 0.46 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}
