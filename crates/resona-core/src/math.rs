//! Mathematical utility functions for DSP.
//!
//! Common operations for real-time audio processing. All functions are
//! allocation-free and suitable for `no_std`.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`prewarp_g`] - Bilinear-transform cutoff pre-warping for ZDF filters
//! - [`lerp`] - Linear interpolation
//! - [`flush_denormal`] - Subnormal float flushing for feedback loops
//! - [`wet_dry_mix`] - Dry/wet crossfade

use core::f32::consts::PI;
use libm::{expf, logf, tanf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use resona_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// # Example
/// ```rust
/// use resona_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Pre-warped integrator gain for trapezoidal (bilinear) discretization.
///
/// `g = tan(pi * fc / fs)` matches the digital filter's response to the
/// analog prototype exactly at the cutoff frequency. The caller is
/// responsible for clamping `g` to its stable range.
///
/// Reference: Zavalishin, "The Art of VA Filter Design", Chapter 3.
#[inline]
pub fn prewarp_g(cutoff_hz: f32, sample_rate: f32) -> f32 {
    tanf(PI * cutoff_hz / sample_rate)
}

/// Linear interpolation between two values.
///
/// # Arguments
/// * `a` - Start value (at t=0)
/// * `b` - End value (at t=1)
/// * `t` - Interpolation factor (0.0 to 1.0)
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Subnormal floats (~1e-38 to 1e-45) cause severe CPU performance
/// degradation on most architectures (up to 100x slowdown). This function
/// replaces values below 1e-20 with zero, providing margin before the
/// IEEE 754 subnormal range begins.
///
/// Use this after every state write in feedback structures where signal
/// can decay indefinitely toward zero.
///
/// Reference: IEEE 754-2008, Section 3.4 (Subnormal numbers)
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Crossfade between dry and wet signals.
///
/// Equivalent to `dry * (1 - mix) + wet * mix` but uses one fewer multiply:
/// `dry + (wet - dry) * mix`.
///
/// # Arguments
///
/// * `dry` - Unprocessed signal
/// * `wet` - Processed signal
/// * `mix` - Blend factor in \[0.0, 1.0\]: 0.0 = all dry, 1.0 = all wet
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_linear_roundtrip() {
        let original = 0.5;
        let db = linear_to_db(original);
        let back = db_to_linear(db);
        assert!(
            (original - back).abs() < 1e-5,
            "Roundtrip failed: {} -> {} -> {}",
            original,
            db,
            back
        );
    }

    #[test]
    fn test_db_known_values() {
        // 0 dB = 1.0 linear
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        // -6 dB ≈ 0.5 linear
        assert!((db_to_linear(-6.0206) - 0.5).abs() < 0.001);
        // +6 dB ≈ 2.0 linear
        assert!((db_to_linear(6.0206) - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_prewarp_known_values() {
        // At fc = fs/4, g = tan(pi/4) = 1
        assert!((prewarp_g(12000.0, 48000.0) - 1.0).abs() < 1e-5);
        // Low frequencies: g approaches pi*fc/fs
        let g = prewarp_g(100.0, 48000.0);
        let approx = PI * 100.0 / 48000.0;
        assert!((g - approx).abs() < 1e-5, "expected ~{approx}, got {g}");
    }

    #[test]
    fn test_prewarp_monotonic() {
        let mut prev = 0.0;
        for freq in [20.0, 100.0, 1000.0, 5000.0, 15000.0, 20000.0] {
            let g = prewarp_g(freq, 48000.0);
            assert!(g > prev, "g should increase with cutoff");
            prev = g;
        }
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
    }

    #[test]
    fn test_wet_dry_mix() {
        // All dry
        assert_eq!(wet_dry_mix(1.0, 0.5, 0.0), 1.0);
        // All wet
        assert_eq!(wet_dry_mix(1.0, 0.5, 1.0), 0.5);
        // Equivalent to dry*(1-mix)+wet*mix
        let dry = 0.3;
        let wet = 0.8;
        let mix = 0.7;
        let expected = dry * (1.0 - mix) + wet * mix;
        assert!((wet_dry_mix(dry, wet, mix) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_flush_denormal() {
        // Normal values pass through
        assert_eq!(flush_denormal(1.0), 1.0);
        assert_eq!(flush_denormal(-0.5), -0.5);
        assert_eq!(flush_denormal(1e-10), 1e-10);

        // Subnormal-range values are flushed to zero
        assert_eq!(flush_denormal(1e-21), 0.0);
        assert_eq!(flush_denormal(-1e-21), 0.0);
        assert_eq!(flush_denormal(1e-38), 0.0);
        assert_eq!(flush_denormal(0.0), 0.0);
    }
}
