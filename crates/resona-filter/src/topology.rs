//! Continuous topology morphing across the ladder's analytic responses.
//!
//! The four-stage ladder exposes five taps per sample: the post-feedback
//! stage-chain input `u` and the four stage outputs `y1..y4`. Every classic
//! response of the circuit is a fixed linear combination of those taps, so a
//! "topology" is just a weight vector and morphing between topologies is a
//! lerp of weight vectors — no per-shape filter instances, no virtual
//! dispatch, and no discontinuity anywhere along the control.
//!
//! The weights follow from the stage transfer `H = 1/(1+s)` (normalized):
//! each `y_i = H^i · u`, and e.g. a 2-pole highpass is `(1-H)² = 1 - 2H + H²`,
//! giving `[1, -2, 1, 0, 0]` over `[u, y1, y2, y3, y4]`. Bandpass shapes use
//! `H·(1-H)` products scaled to unity peak.

use resona_core::lerp;

/// Number of ladder taps entering the mixer: `[u, y1, y2, y3, y4]`.
pub const NUM_TAPS: usize = 5;

/// The fixed, ordered response set the morph control sweeps through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// 4-pole lowpass, 24 dB/oct.
    Lp24,
    /// 2-pole lowpass, 12 dB/oct.
    Lp12,
    /// 2-pole bandpass, 12 dB/oct skirts.
    Bp12,
    /// 1-pole bandpass, 6 dB/oct skirts.
    Bp6,
    /// 4-pole highpass, 24 dB/oct.
    Hp24,
    /// 2-pole highpass, 12 dB/oct.
    Hp12,
    /// Band-reject notch.
    Notch,
    /// Allpass (flat magnitude, phase rotation).
    Allpass,
}

impl Topology {
    /// Morph order, LP-heavy end first.
    pub const ALL: [Topology; 8] = [
        Topology::Lp24,
        Topology::Lp12,
        Topology::Bp12,
        Topology::Bp6,
        Topology::Hp24,
        Topology::Hp12,
        Topology::Notch,
        Topology::Allpass,
    ];

    /// Tap weights over `[u, y1, y2, y3, y4]`.
    pub const fn weights(self) -> [f32; NUM_TAPS] {
        match self {
            Topology::Lp24 => [0.0, 0.0, 0.0, 0.0, 1.0],
            Topology::Lp12 => [0.0, 0.0, 1.0, 0.0, 0.0],
            // 4·H²·(1-H)² = 4y2 - 8y3 + 4y4
            Topology::Bp12 => [0.0, 0.0, 4.0, -8.0, 4.0],
            // 2·H·(1-H) = 2y1 - 2y2
            Topology::Bp6 => [0.0, 2.0, -2.0, 0.0, 0.0],
            // (1-H)^4
            Topology::Hp24 => [1.0, -4.0, 6.0, -4.0, 1.0],
            // (1-H)^2
            Topology::Hp12 => [1.0, -2.0, 1.0, 0.0, 0.0],
            // LP12 + HP12
            Topology::Notch => [1.0, -2.0, 2.0, 0.0, 0.0],
            // 1 - 4H + 4H² keeps |H|=1 with a 2nd-order phase flip
            Topology::Allpass => [1.0, -4.0, 4.0, 0.0, 0.0],
        }
    }
}

/// Number of morph segments between adjacent responses.
const NUM_SEGMENTS: usize = Topology::ALL.len() - 1;

/// Blends the ladder taps through the morphable response set.
///
/// [`set_morph`](Self::set_morph) positions the control on the 0..1 line;
/// [`mix`](Self::mix) folds one sample's taps down to a scalar output.
#[derive(Debug, Clone)]
pub struct TopologyMixer {
    /// Active blended weights.
    weights: [f32; NUM_TAPS],
}

impl TopologyMixer {
    /// Create a mixer at morph position 0 (pure LP24).
    pub fn new() -> Self {
        Self {
            weights: Topology::Lp24.weights(),
        }
    }

    /// Position the morph control.
    ///
    /// `p` in \[0, 1\] spans the whole response set; each adjacent pair
    /// occupies one equal segment. The blend weight is exactly 0/1 at the
    /// segment edges, so crossing a boundary is continuous.
    #[inline]
    pub fn set_morph(&mut self, p: f32) {
        let scaled = p.clamp(0.0, 1.0) * NUM_SEGMENTS as f32;
        let segment = (scaled as usize).min(NUM_SEGMENTS - 1);
        let frac = scaled - segment as f32;

        let a = Topology::ALL[segment].weights();
        let b = Topology::ALL[segment + 1].weights();
        for ((w, &wa), &wb) in self.weights.iter_mut().zip(a.iter()).zip(b.iter()) {
            *w = lerp(wa, wb, frac);
        }
    }

    /// Combine one sample's taps `[u, y1, y2, y3, y4]` into the output.
    #[inline]
    pub fn mix(&self, taps: &[f32; NUM_TAPS]) -> f32 {
        let mut acc = 0.0;
        for (&w, &t) in self.weights.iter().zip(taps.iter()) {
            acc += w * t;
        }
        acc
    }

    /// The currently blended weights.
    pub fn weights(&self) -> &[f32; NUM_TAPS] {
        &self.weights
    }
}

impl Default for TopologyMixer {
    fn default() -> Self {
        Self::new()
    }
}
