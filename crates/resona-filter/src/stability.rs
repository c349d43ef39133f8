//! Coefficient derivation and stability clamping for the ZDF ladder.
//!
//! Every sample the engine turns (cutoff, resonance, mode) into the pair
//! (g, k): the pre-warped integrator gain and the global feedback amount.
//! Both are clamped at the point of computation so the solver downstream
//! never sees an unstable pair, whatever the host throws at the parameters.
//!
//! The feedback bound comes from the bilinear-discretized ladder: the loop
//! reaches the Nyquist oscillation threshold at `k = 4(1-g)/(1+g)`, and the
//! engine keeps a 5% margin below it. Ringing at max vintage resonance
//! rides the edge of the k=4 resonant threshold and is intended; it stays
//! bounded because the feedback passes through the saturator.

use resona_core::{lerp, prewarp_g};

/// Integrator gain bounds. The lower bound keeps `1+g` well away from zero.
const G_MIN: f32 = -0.99;
const G_MAX: f32 = 0.98;

/// Safety margin applied to the Nyquist feedback bound.
const K_MARGIN: f32 = 0.95;

/// Vintage feedback law gain (squared-response curve).
const K_VINTAGE: f32 = 4.1;

/// Modern feedback law gain (linear curve).
const K_MODERN: f32 = 4.0;

/// Effective resonance ceiling: normalized 0..1 maps to 0..0.95.
const RESONANCE_CEILING: f32 = 0.95;

/// Fraction of the sample rate the cutoff is pinned below. Past fs/2 the
/// tangent wraps and would hand back in-range values for bogus cutoffs.
const CUTOFF_MAX_RATIO: f32 = 0.49;

/// Derive the pre-warped integrator gain for one stage.
///
/// `g = tan(pi * fc / sr)` with `fc` pinned below Nyquist, then clamped to
/// (-0.99, 0.98). Out-of-range cutoffs saturate monotonically instead of
/// aliasing back through the tangent's period.
#[inline]
pub fn stage_g(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let fc = cutoff_hz.clamp(0.0, sample_rate * CUTOFF_MAX_RATIO);
    prewarp_g(fc, sample_rate).clamp(G_MIN, G_MAX)
}

/// Derive the clamped feedback coefficient.
///
/// Normalized resonance maps to 0–0.95 effective, then through the
/// mode-blended law (vintage `r²·4.1`, modern `r·4.0`), then under the
/// Nyquist bound `0.95 · 4(1-g)/(1+g)` evaluated at the largest stage g
/// (the stage closest to Nyquist constrains the loop).
///
/// The constants 4.1/4.0/0.95 are calibration values, not physics; they
/// are tuned so max vintage resonance drives the loop to the edge of the
/// k=4 oscillation threshold while modern stops further below it.
#[inline]
pub fn feedback_k(resonance: f32, mode: f32, g_max: f32) -> f32 {
    let r = resonance.clamp(0.0, 1.0) * RESONANCE_CEILING;
    let vintage = r * r * K_VINTAGE;
    let modern = r * K_MODERN;
    let k = lerp(vintage, modern, mode.clamp(0.0, 1.0));
    k.min(nyquist_bound(g_max))
}

/// The margined Nyquist stability bound for a given integrator gain.
#[inline]
pub fn nyquist_bound(g: f32) -> f32 {
    K_MARGIN * 4.0 * (1.0 - g) / (1.0 + g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn g_clamped_to_stable_range() {
        // Absurd cutoffs pin at the top of the range instead of wrapping
        // through the tangent's period back to in-range values
        assert_eq!(stage_g(1_000_000.0, 48000.0), G_MAX);
        assert_eq!(stage_g(30000.0, 48000.0), G_MAX);
        assert_eq!(stage_g(24000.0, 48000.0), G_MAX);
        let g = stage_g(20.0, 48000.0);
        assert!(g > 0.0 && g < 0.01);
        // Negative cutoffs pin at zero
        assert_eq!(stage_g(-500.0, 48000.0), 0.0);
    }

    #[test]
    fn g_tracks_prewarp_in_band() {
        for freq in [20.0, 440.0, 2000.0, 10000.0, 20000.0] {
            let g = stage_g(freq, 48000.0);
            assert!((g - prewarp_g(freq, 48000.0)).abs() < 1e-6);
        }
    }

    #[test]
    fn k_satisfies_nyquist_bound_over_grid() {
        for res_step in 0..=10 {
            let resonance = res_step as f32 / 10.0;
            for mode_step in 0..=4 {
                let mode = mode_step as f32 / 4.0;
                for freq in [20.0, 200.0, 2000.0, 8000.0, 20000.0] {
                    let g = stage_g(freq, 48000.0);
                    let k = feedback_k(resonance, mode, g);
                    let bound = nyquist_bound(g);
                    assert!(
                        k <= bound + 1e-6,
                        "k={k} exceeds bound={bound} at res={resonance} mode={mode} f={freq}"
                    );
                }
            }
        }
    }

    #[test]
    fn vintage_law_is_squared() {
        // Away from the bound, vintage follows r²·4.1
        let g = stage_g(200.0, 48000.0);
        let k = feedback_k(0.5, 0.0, g);
        let r = 0.5 * RESONANCE_CEILING;
        assert!((k - r * r * K_VINTAGE).abs() < 1e-5);
    }

    #[test]
    fn modern_law_is_linear() {
        let g = stage_g(200.0, 48000.0);
        let k = feedback_k(0.5, 1.0, g);
        let r = 0.5 * RESONANCE_CEILING;
        assert!((k - r * K_MODERN).abs() < 1e-5);
    }

    #[test]
    fn max_vintage_resonance_approaches_oscillation() {
        // At low cutoff the bound is loose; max vintage resonance lands
        // near the k=4 oscillation threshold (0.95² · 4.1 ≈ 3.70).
        let g = stage_g(100.0, 48000.0);
        let k = feedback_k(1.0, 0.0, g);
        assert!(k > 3.5, "max vintage k should be near 4, got {k}");
    }

    #[test]
    fn resonance_clamped_before_mapping() {
        let g = stage_g(1000.0, 48000.0);
        assert_eq!(feedback_k(5.0, 0.0, g), feedback_k(1.0, 0.0, g));
        assert_eq!(feedback_k(-1.0, 0.0, g), feedback_k(0.0, 0.0, g));
    }

    #[test]
    fn zero_resonance_gives_zero_feedback() {
        for mode in [0.0, 0.5, 1.0] {
            assert_eq!(feedback_k(0.0, mode, 0.1), 0.0);
        }
    }
}
