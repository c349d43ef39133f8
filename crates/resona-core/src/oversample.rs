//! 2× polyphase oversampling wrapper for anti-aliased nonlinear processing.
//!
//! Nonlinear stages (saturating filters, waveshapers) generate harmonics that
//! can exceed Nyquist and alias back into the audible range. Oversampling
//! mitigates this by:
//!
//! 1. **Upsampling**: polyphase FIR interpolation to 2× the base rate
//! 2. **Processing**: run the wrapped effect at 2× (harmonics stay below Nyquist)
//! 3. **Downsampling**: FIR lowpass + decimation back to the base rate
//!
//! Both halves share one 32-tap Kaiser-windowed sinc prototype (beta = 8,
//! ~80 dB stopband) computed once at construction. The upsampler runs it as
//! two 16-tap polyphase branches over base-rate input history; the
//! downsampler runs the full filter at the 2× rate and keeps every other
//! output.
//!
//! ## Auto-bypass
//!
//! At base rates of 96 kHz and above, the host is already giving the
//! nonlinearity enough headroom; the wrapper switches to a direct path with
//! zero added latency. The decision is made in
//! [`set_sample_rate`](Effect::set_sample_rate), never per sample.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resona_core::{Effect, Oversampled2x};
//!
//! let mut wrapped = Oversampled2x::new(saturating_core, 48000.0);
//! let output = wrapped.process(0.5); // inner effect ran twice at 96 kHz
//! ```
//!
//! Reference: A.V. Oppenheim & R.W. Schafer, "Discrete-Time Signal
//! Processing", Chapter 7 (FIR design by windowing) and Chapter 4
//! (polyphase decimation/interpolation).

use core::f32::consts::{PI, TAU};
use libm::{sinf, sqrtf};

use crate::Effect;

/// Oversampling factor. Fixed at 2×: the solver's saturation curves are
/// gentle enough that second-order images dominate, and 2× keeps the
/// per-sample work bounded for the real-time budget.
const FACTOR: usize = 2;

/// Prototype lowpass length. 16 taps per polyphase branch.
const TAPS: usize = 32;

/// Taps per polyphase branch.
const PHASE_TAPS: usize = TAPS / FACTOR;

/// Kaiser window beta for ~80 dB stopband attenuation.
const KAISER_BETA: f32 = 8.0;

/// Prototype cutoff as a fraction of the 2× sample rate (= base Nyquist).
const CUTOFF: f32 = 0.25;

/// Base sample rate at or above which oversampling is bypassed.
const BYPASS_RATE_HZ: f32 = 96_000.0;

/// Zeroth-order modified Bessel function of the first kind.
///
/// Power-series evaluation, converges quickly for the beta values used in
/// Kaiser window design (terms shrink factorially).
fn bessel_i0(x: f32) -> f32 {
    let half = x * 0.5;
    let mut sum = 1.0f32;
    let mut term = 1.0f32;
    for k in 1..=25 {
        let factor = half / k as f32;
        term *= factor * factor;
        sum += term;
        if term < sum * 1e-9 {
            break;
        }
    }
    sum
}

/// Design the shared Kaiser-windowed sinc lowpass prototype.
///
/// Even-length symmetric FIR: group delay is (TAPS-1)/2 = 15.5 samples at
/// the 2× rate. Coefficients are normalized to unity DC gain.
fn design_prototype() -> [f32; TAPS] {
    let mid = (TAPS - 1) as f32 / 2.0;
    let window_denom = bessel_i0(KAISER_BETA);
    let mut h = [0.0f32; TAPS];
    let mut sum = 0.0;
    for (n, tap) in h.iter_mut().enumerate() {
        let t = n as f32 - mid;
        // Ideal lowpass impulse response. t is never zero for even length,
        // but keep the limit value for robustness.
        let sinc = if t.abs() < 1e-6 {
            2.0 * CUTOFF
        } else {
            sinf(TAU * CUTOFF * t) / (PI * t)
        };
        let ratio = t / (mid + 0.5);
        let window = bessel_i0(KAISER_BETA * sqrtf((1.0 - ratio * ratio).max(0.0))) / window_denom;
        *tap = sinc * window;
        sum += *tap;
    }
    for tap in &mut h {
        *tap /= sum;
    }
    h
}

/// 2× oversampling wrapper for any effect.
///
/// Wraps an effect with polyphase upsampling and FIR downsampling so the
/// inner effect runs at twice the base sample rate. See the module docs for
/// the filter design and the auto-bypass rule.
pub struct Oversampled2x<E: Effect> {
    /// The wrapped effect
    effect: E,
    /// Base sample rate (before oversampling)
    sample_rate: f32,
    /// True when the base rate is high enough to skip oversampling
    bypassed: bool,
    /// Shared lowpass prototype, split into polyphase branches for upsampling
    coeffs: [f32; TAPS],
    /// Base-rate input history for the polyphase interpolator
    up_history: [f32; PHASE_TAPS],
    /// 2×-rate history for the decimation filter
    down_history: [f32; TAPS],
}

impl<E: Effect> Oversampled2x<E> {
    /// Create a new oversampled effect wrapper.
    ///
    /// The inner effect's sample rate is set to the effective processing
    /// rate (2× the base rate, or the base rate itself when bypassed).
    pub fn new(effect: E, sample_rate: f32) -> Self {
        let mut wrapper = Self {
            effect,
            sample_rate,
            bypassed: false,
            coeffs: design_prototype(),
            up_history: [0.0; PHASE_TAPS],
            down_history: [0.0; TAPS],
        };
        wrapper.configure_rate(sample_rate);
        wrapper
    }

    /// Get a reference to the inner effect.
    pub fn inner(&self) -> &E {
        &self.effect
    }

    /// Get a mutable reference to the inner effect.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.effect
    }

    /// Whether oversampling is currently bypassed (base rate ≥ 96 kHz).
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Effective rate seen by the inner effect.
    pub fn effective_rate(&self) -> f32 {
        if self.bypassed {
            self.sample_rate
        } else {
            self.sample_rate * FACTOR as f32
        }
    }

    fn configure_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.bypassed = sample_rate >= BYPASS_RATE_HZ;
        self.effect.set_sample_rate(self.effective_rate());
    }

    /// Interpolate one base-rate input into FACTOR sub-samples.
    ///
    /// Polyphase form: each output phase convolves the base-rate history
    /// with every FACTOR-th prototype tap. The ×FACTOR gain restores unity
    /// passband level after zero-stuffing.
    #[inline]
    fn upsample(&mut self, input: f32, sub: &mut [f32; FACTOR]) {
        for i in (1..PHASE_TAPS).rev() {
            self.up_history[i] = self.up_history[i - 1];
        }
        self.up_history[0] = input;

        for (phase, out) in sub.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (j, &x) in self.up_history.iter().enumerate() {
                acc += x * self.coeffs[j * FACTOR + phase];
            }
            *out = acc * FACTOR as f32;
        }
    }

    /// Push FACTOR processed sub-samples through the decimation filter and
    /// return the one base-rate output (convolution evaluated only at the
    /// decimation point).
    #[inline]
    fn downsample(&mut self, sub: &[f32; FACTOR]) -> f32 {
        let mut output = 0.0;
        for (i, &s) in sub.iter().enumerate() {
            for j in (1..TAPS).rev() {
                self.down_history[j] = self.down_history[j - 1];
            }
            self.down_history[0] = s;

            if i == FACTOR - 1 {
                for (j, &coeff) in self.coeffs.iter().enumerate() {
                    output += self.down_history[j] * coeff;
                }
            }
        }
        output
    }
}

impl<E: Effect> Effect for Oversampled2x<E> {
    fn process(&mut self, input: f32) -> f32 {
        if self.bypassed {
            return self.effect.process(input);
        }

        let mut sub = [0.0f32; FACTOR];
        self.upsample(input, &mut sub);

        for s in &mut sub {
            *s = self.effect.process(*s);
        }

        self.downsample(&sub)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.configure_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.up_history = [0.0; PHASE_TAPS];
        self.down_history = [0.0; TAPS];
        self.effect.reset();
    }

    fn latency_samples(&self) -> usize {
        if self.bypassed {
            return self.effect.latency_samples();
        }
        // Each FIR contributes (TAPS-1)/2 samples of group delay at the 2×
        // rate; both together are ~TAPS/2 - 1 base-rate samples. Hosts want
        // a constant integer, so round up.
        let filter_latency = TAPS / FACTOR;
        filter_latency + self.effect.latency_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    /// Simple pass-through effect for testing
    struct Passthrough;

    impl Effect for Passthrough {
        fn process(&mut self, input: f32) -> f32 {
            input
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {}
    }

    /// Records the sample rate it was last configured with
    struct RateProbe {
        rate: f32,
    }

    impl Effect for RateProbe {
        fn process(&mut self, input: f32) -> f32 {
            input
        }
        fn set_sample_rate(&mut self, sample_rate: f32) {
            self.rate = sample_rate;
        }
        fn reset(&mut self) {}
    }

    #[test]
    fn prototype_unity_dc_gain() {
        let h = design_prototype();
        let sum: f32 = h.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "DC gain should be 1, got {sum}");
    }

    #[test]
    fn prototype_symmetric() {
        let h = design_prototype();
        for i in 0..TAPS / 2 {
            assert!(
                (h[i] - h[TAPS - 1 - i]).abs() < 1e-7,
                "tap {i} not symmetric: {} vs {}",
                h[i],
                h[TAPS - 1 - i]
            );
        }
    }

    #[test]
    fn passthrough_dc_unity() {
        let mut oversampled = Oversampled2x::new(Passthrough, SAMPLE_RATE);

        // Let both filters settle with a DC signal
        for _ in 0..200 {
            oversampled.process(1.0);
        }

        let output = oversampled.process(1.0);
        assert!(
            (output - 1.0).abs() < 0.01,
            "Passthrough should be near unity, got {}",
            output
        );
    }

    #[test]
    fn passthrough_sine_near_unity() {
        let mut oversampled = Oversampled2x::new(Passthrough, SAMPLE_RATE);
        let omega = TAU * 1000.0 / SAMPLE_RATE;

        for i in 0..2000 {
            oversampled.process(sinf(i as f32 * omega));
        }

        let mut peak = 0.0f32;
        for i in 2000..2096 {
            let out = oversampled.process(sinf(i as f32 * omega));
            peak = peak.max(out.abs());
        }
        assert!(
            (peak - 1.0).abs() < 0.05,
            "1 kHz tone should pass near unity, peak {peak}"
        );
    }

    #[test]
    fn inner_runs_at_double_rate() {
        let oversampled = Oversampled2x::new(RateProbe { rate: 0.0 }, 48000.0);
        assert!(!oversampled.is_bypassed());
        assert_eq!(oversampled.inner().rate, 96000.0);
        assert_eq!(oversampled.effective_rate(), 96000.0);
    }

    #[test]
    fn bypass_at_high_rates() {
        let mut oversampled = Oversampled2x::new(RateProbe { rate: 0.0 }, 96000.0);
        assert!(oversampled.is_bypassed());
        assert_eq!(oversampled.inner().rate, 96000.0);
        assert_eq!(oversampled.latency_samples(), 0);

        // Bypassed path is bit-transparent
        assert_eq!(oversampled.process(0.25), 0.25);

        // Dropping back to 48 kHz re-engages oversampling
        oversampled.set_sample_rate(48000.0);
        assert!(!oversampled.is_bypassed());
        assert_eq!(oversampled.inner().rate, 96000.0);
        assert!(oversampled.latency_samples() > 0);
    }

    #[test]
    fn latency_constant_when_engaged() {
        let oversampled = Oversampled2x::new(Passthrough, 48000.0);
        assert_eq!(oversampled.latency_samples(), TAPS / FACTOR);
    }

    #[test]
    fn reset_clears_state() {
        let mut oversampled = Oversampled2x::new(Passthrough, SAMPLE_RATE);

        for _ in 0..100 {
            oversampled.process(1.0);
        }

        oversampled.reset();

        let mut output = 0.0;
        for _ in 0..50 {
            output = oversampled.process(0.0);
        }
        assert!(
            output.abs() < 1e-6,
            "After reset and zero input, output should be zero, got {}",
            output
        );
    }

    #[test]
    fn impulse_response_matches_groupdelay() {
        let mut oversampled = Oversampled2x::new(Passthrough, SAMPLE_RATE);

        let mut peak_idx = 0;
        let mut peak = 0.0f32;
        for i in 0..64 {
            let input = if i == 0 { 1.0 } else { 0.0 };
            let out = oversampled.process(input).abs();
            if out > peak {
                peak = out;
                peak_idx = i;
            }
        }

        let reported = oversampled.latency_samples();
        assert!(
            (peak_idx as isize - reported as isize).unsigned_abs() <= 1,
            "impulse peak at {peak_idx}, reported latency {reported}"
        );
    }
}
