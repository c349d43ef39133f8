//! Parameter smoothing for zipper-free changes.
//!
//! Audio parameters (cutoff, resonance, mix) need smooth transitions to avoid
//! audible "zipper noise" when the host or a controller changes them. This
//! module provides [`SmoothedParam`], a one-pole exponential smoother advanced
//! once per sample on the audio thread.
//!
//! ## Usage
//!
//! ```rust
//! use resona_core::SmoothedParam;
//!
//! let mut cutoff = SmoothedParam::with_config(0.5, 48000.0, 5.0);
//!
//! // Set new target - smoothing happens automatically
//! cutoff.set_target(0.8);
//!
//! // In the audio callback, advance once per sample
//! for _ in 0..480 {
//!     let smoothed = cutoff.advance();
//!     // Use smoothed value for processing...
//! }
//! ```

use libm::expf;

/// A parameter with built-in exponential smoothing.
///
/// One-pole lowpass toward the target value, which provides natural-sounding
/// transitions for most audio parameters.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (1 = instant, ~0 = very slow)
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Smoothing time in milliseconds
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create a new smoothed parameter with initial value.
    ///
    /// Smoothing is disabled by default (instant changes). Call
    /// [`set_sample_rate`](Self::set_sample_rate) and
    /// [`set_smoothing_time_ms`](Self::set_smoothing_time_ms) to enable.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0, // No smoothing until configured
            sample_rate: 48000.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Create a smoothed parameter with full configuration.
    ///
    /// # Arguments
    /// * `initial` - Initial parameter value
    /// * `sample_rate` - Sample rate in Hz
    /// * `smoothing_time_ms` - Smoothing time constant in milliseconds
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Set the target value (parameter will smooth towards this).
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set target and immediately snap to it (no smoothing).
    ///
    /// Useful for initialization or when instant changes are wanted.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update sample rate and recalculate the smoothing coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set smoothing time in milliseconds.
    ///
    /// Typical values:
    /// - 0.0 ms: No smoothing (instant)
    /// - 5-10 ms: Fast, good for cutoff/resonance
    /// - 20-50 ms: Medium, good for morph/drive
    /// - 100+ ms: Slow, for character/mode transitions
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Get the next smoothed value (advances by one sample).
    ///
    /// Call this once per sample in the audio processing loop.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        // One-pole lowpass: y[n] = y[n-1] + coeff * (target - y[n-1])
        self.current = self.current + self.coeff * (self.target - self.current);
        self.current
    }

    /// Get the current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Get the target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Check if the parameter has reached its target (within epsilon).
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Skip ahead to the target value immediately.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// Recalculate the smoothing coefficient from sample rate and time.
    ///
    /// A one-pole lowpass has the difference equation
    /// `y[n] = y[n-1] + coeff * (target - y[n-1])`, a first-order IIR with
    /// pole at `(1-coeff)`. The time constant tau (time to reach 63.2% of
    /// target) relates to the coefficient by
    ///
    ///   `coeff = 1 - exp(-1 / (tau * sample_rate))`
    ///
    /// where `tau = smoothing_time_ms / 1000`. After 5*tau the parameter
    /// reaches 99.3% of the target -- effectively settled for audio purposes.
    ///
    /// When smoothing_time_ms is 0, coeff is set to 1.0 for instant response.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0; // Instant (no smoothing)
        } else {
            let time_constant = self.smoothing_time_ms / 1000.0;
            let samples = time_constant * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
