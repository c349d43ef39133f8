//! Integration tests for resona-core DSP primitives.
//!
//! Signal-level verification across modules: DC blocker frequency response,
//! SmoothedParam convergence timing, oversampler transparency and latency.

use resona_core::{DcBlocker, Effect, Oversampled2x, SmoothedParam};

const SAMPLE_RATE: f32 = 48000.0;
const TAU: f32 = core::f32::consts::TAU;

/// Generate a sine wave buffer at the given frequency and sample rate.
fn generate_sine(freq_hz: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / sample_rate))
        .collect()
}

/// Measure RMS amplitude of a signal buffer.
fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

/// Convert linear amplitude to dB.
fn to_db(linear: f32) -> f32 {
    20.0 * libm::log10f(linear.max(1e-10))
}

// ============================================================================
// 1. DC blocker
// ============================================================================

#[test]
fn dc_blocker_removes_offset_keeps_audio() {
    let mut blocker = DcBlocker::default();

    // 440 Hz tone riding on a 0.5 DC offset
    let input: Vec<f32> = generate_sine(440.0, SAMPLE_RATE, 48000)
        .iter()
        .map(|x| x * 0.5 + 0.5)
        .collect();

    let output: Vec<f32> = input.iter().map(|&x| blocker.process(x)).collect();
    let tail = &output[24000..];

    let mean: f32 = tail.iter().sum::<f32>() / tail.len() as f32;
    assert!(mean.abs() < 0.01, "residual DC: {mean}");

    // AC content survives near unity
    let ac_rms = rms(tail);
    let expected = 0.5 / libm::sqrtf(2.0);
    assert!(
        (ac_rms / expected) > 0.95,
        "tone attenuated: {} dB",
        to_db(ac_rms / expected)
    );
}

#[test]
fn dc_blocker_step_response_decays() {
    let mut blocker = DcBlocker::default();
    let mut last = 0.0;
    for _ in 0..48000 {
        last = blocker.process(1.0);
    }
    assert!(last.abs() < 1e-3, "step not rejected after 1 s: {last}");
}

// ============================================================================
// 2. SmoothedParam timing
// ============================================================================

#[test]
fn smoothed_param_reaches_target_in_configured_time() {
    let mut param = SmoothedParam::with_config(0.0, SAMPLE_RATE, 10.0);
    param.set_target(1.0);

    // One-pole smoothing: ~63% after one time constant, >99% after five
    let one_tau = (SAMPLE_RATE * 0.010) as usize;
    for _ in 0..one_tau {
        param.advance();
    }
    assert!((param.get() - 0.632).abs() < 0.02, "one tau: {}", param.get());

    for _ in 0..one_tau * 4 {
        param.advance();
    }
    assert!(param.get() > 0.99, "five tau: {}", param.get());
}

#[test]
fn smoothed_param_rate_change_preserves_value() {
    let mut param = SmoothedParam::with_config(0.0, 48000.0, 20.0);
    param.set_target(1.0);
    for _ in 0..100 {
        param.advance();
    }
    let before = param.get();
    param.set_sample_rate(96000.0);
    assert_eq!(param.get(), before, "value jumped on rate change");
}

// ============================================================================
// 3. Oversampler transparency
// ============================================================================

struct Passthrough;

impl Effect for Passthrough {
    fn process(&mut self, input: f32) -> f32 {
        input
    }
    fn set_sample_rate(&mut self, _: f32) {}
    fn reset(&mut self) {}
}

#[test]
fn oversampler_passband_flat_within_half_db() {
    for freq in [100.0, 1000.0, 5000.0, 10000.0] {
        let mut oversampled = Oversampled2x::new(Passthrough, SAMPLE_RATE);
        let input = generate_sine(freq, SAMPLE_RATE, 9600);
        let output: Vec<f32> = input.iter().map(|&x| oversampled.process(x)).collect();

        let gain_db = to_db(rms(&output[4800..]) / rms(&input[4800..]));
        assert!(
            gain_db.abs() < 0.5,
            "{freq} Hz passband deviation {gain_db:.2} dB"
        );
    }
}

#[test]
fn oversampler_latency_is_what_it_reports() {
    let mut oversampled = Oversampled2x::new(Passthrough, SAMPLE_RATE);
    let reported = oversampled.latency_samples();

    let mut peak_idx = 0;
    let mut peak = 0.0f32;
    for i in 0..128 {
        let out = oversampled.process(if i == 0 { 1.0 } else { 0.0 }).abs();
        if out > peak {
            peak = out;
            peak_idx = i;
        }
    }
    assert!(
        (peak_idx as isize - reported as isize).unsigned_abs() <= 1,
        "impulse peak at {peak_idx}, reported {reported}"
    );
}

// ============================================================================
// 4. Cross-module: oversampled nonlinearity reduces aliasing
// ============================================================================

/// Hard cubic shaper, rich in high harmonics.
struct Cuber;

impl Effect for Cuber {
    fn process(&mut self, input: f32) -> f32 {
        input - input * input * input / 3.0
    }
    fn set_sample_rate(&mut self, _: f32) {}
    fn reset(&mut self) {}
}

#[test]
fn oversampling_attenuates_alias_products() {
    // 9 kHz through a cuber puts the 3rd harmonic at 27 kHz, which aliases
    // to 21 kHz at 48 kHz. Oversampled, the alias must be well below the
    // naive version.
    let freq = 9000.0;
    let input = generate_sine(freq, SAMPLE_RATE, 48000);

    let naive: Vec<f32> = {
        let mut fx = Cuber;
        input.iter().map(|&x| fx.process(x)).collect()
    };
    let clean: Vec<f32> = {
        let mut fx = Oversampled2x::new(Cuber, SAMPLE_RATE);
        input.iter().map(|&x| fx.process(x)).collect()
    };

    let alias_freq = SAMPLE_RATE - 3.0 * freq; // 21 kHz
    let bin = |signal: &[f32]| -> f32 {
        let n = signal.len();
        let omega = TAU * alias_freq / SAMPLE_RATE;
        let (mut re, mut im) = (0.0f32, 0.0f32);
        for (i, &x) in signal.iter().enumerate() {
            re += x * libm::cosf(omega * i as f32);
            im += x * libm::sinf(omega * i as f32);
        }
        libm::sqrtf(re * re + im * im) * 2.0 / n as f32
    };

    let naive_alias = bin(&naive[24000..]);
    let clean_alias = bin(&clean[24000..]);
    assert!(
        clean_alias < naive_alias * 0.2,
        "alias not suppressed: naive {naive_alias}, oversampled {clean_alias}"
    );
}
