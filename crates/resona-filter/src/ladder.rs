//! Four-stage ZDF ladder with a bounded Newton-Raphson feedback solve.
//!
//! # Topology
//!
//! Each stage is a trapezoidally-discretized one-pole lowpass after
//! Zavalishin's TPT form. With `G_i = g_i/(1+g_i)` and state contribution
//! `B_i = s_i/(1+g_i)`, a stage is the affine map `y_i = G_i·u_i + B_i`, so
//! the whole chain collapses to `y4 = A·u + S` with `A = ΠG_i` and `S` the
//! accumulated state term. Global feedback `u = xin - k·sat(y4·d)/d` closes
//! the loop through the saturator, making `y4` implicit. The input term
//! `xin` crossfades from the raw sample to `sat(x·d)/d` as drive comes up,
//! so zero drive leaves the input path linear.
//!
//! # Implicit solve
//!
//! ```text
//! f(y)  = A·(xin - k·sat(y·d)/d) + S - y
//! f'(y) = -A·k·sat'(y·d) - 1
//! ```
//!
//! `f'` is always ≤ -1 (the saturator derivative is non-negative), so the
//! Newton step never divides by zero. Exactly three iterations run per
//! sub-sample — bounded work, never a convergence loop — warm-started from
//! the previous sub-sample's solution, which is close under audio-rate
//! continuity. After the solve, one explicit forward pass through the
//! stages yields the taps and the trapezoidal state updates
//! `s_i ← 2·y_i - s_i` (denormal-flushed).
//!
//! # Fail-soft
//!
//! A transient NaN/Inf (host handing over garbage, extreme modulation) must
//! never latch. The state is snapshotted before each sub-sample; if the
//! solve produces a non-finite tap, the snapshot is restored, the previous
//! good taps are replayed, and a fault counter ticks up. Worst observable
//! impact is one repeated sample.
//!
//! Reference: Zavalishin, "The Art of VA Filter Design", rev. 2.1.2,
//! Chapters 3 and 5.

use resona_core::{flush_denormal, lerp};

use crate::analog::{NUM_STAGES, saturate_with_deriv};
use crate::topology::NUM_TAPS;

/// Newton-Raphson iteration count. Fixed: real-time budget over last-ulp
/// accuracy. Three steps from a warm start leave residuals far below
/// audibility.
const NR_ITERATIONS: usize = 3;

/// Per-sample coefficient set consumed by [`ZdfLadder::process`].
///
/// Derived once per (base-rate) sample by the engine from the smoothed
/// parameters, the stability clamps, and the analog stage factors.
#[derive(Debug, Clone, Copy)]
pub struct LadderCoeffs {
    /// Per-stage clamped integrator gains.
    pub g: [f32; NUM_STAGES],
    /// Clamped global feedback amount.
    pub k: f32,
    /// Saturation pre-gain `d = 1 + 3·drive`. The `/d` normalization keeps
    /// small-signal gain at unity, so drive adds harmonics without changing
    /// the response at low levels.
    pub drive_gain: f32,
    /// Saturation asymmetry (transistor curve).
    pub asymmetry: f32,
    /// Vintage/modern saturator blend.
    pub mode: f32,
}

impl Default for LadderCoeffs {
    fn default() -> Self {
        Self {
            g: [0.1; NUM_STAGES],
            k: 0.0,
            drive_gain: 1.0,
            asymmetry: 0.0,
            mode: 0.0,
        }
    }
}

/// One channel's four-stage ladder core.
#[derive(Debug, Clone)]
pub struct ZdfLadder {
    /// Integrator states s1..s4.
    s: [f32; NUM_STAGES],
    /// Previous solved stage-4 output (Newton warm start).
    y4_prev: f32,
    /// Last fully-finite tap set, replayed on a numeric fault.
    last_good_taps: [f32; NUM_TAPS],
    /// Recovered numeric faults since construction (diagnostic only).
    faults: u32,
}

impl ZdfLadder {
    /// Create a ladder with zeroed state.
    pub fn new() -> Self {
        Self {
            s: [0.0; NUM_STAGES],
            y4_prev: 0.0,
            last_good_taps: [0.0; NUM_TAPS],
            faults: 0,
        }
    }

    /// Process one (sub-)sample, returning the taps `[u, y1, y2, y3, y4]`.
    #[inline]
    pub fn process(&mut self, input: f32, coeffs: &LadderCoeffs) -> [f32; NUM_TAPS] {
        let snapshot_s = self.s;
        let snapshot_y4 = self.y4_prev;

        let taps = self.solve(input, coeffs);

        if taps.iter().all(|t| t.is_finite()) {
            self.last_good_taps = taps;
            taps
        } else {
            // Fail-soft: drop this sample's state transition entirely
            self.s = snapshot_s;
            self.y4_prev = snapshot_y4;
            self.faults = self.faults.saturating_add(1);
            self.last_good_taps
        }
    }

    #[inline]
    fn solve(&mut self, input: f32, coeffs: &LadderCoeffs) -> [f32; NUM_TAPS] {
        let d = coeffs.drive_gain;
        let inv_d = 1.0 / d;

        // Stage decomposition y_i = G_i·u_i + B_i
        let mut big_g = [0.0f32; NUM_STAGES];
        let mut big_b = [0.0f32; NUM_STAGES];
        for i in 0..NUM_STAGES {
            let denom = 1.0 + coeffs.g[i];
            big_g[i] = coeffs.g[i] / denom;
            big_b[i] = self.s[i] / denom;
        }

        // Chain: y4 = A·u + S
        let a = big_g[0] * big_g[1] * big_g[2] * big_g[3];
        let s_term = ((big_b[0] * big_g[1] + big_b[1]) * big_g[2] + big_b[2]) * big_g[3] + big_b[3];

        // Input conditioning, crossfaded by the drive amount so the input
        // path is bit-transparent at d = 1 and fully saturated at d = 4.
        // Keeps drive audible even with the feedback loop open (k = 0).
        let drive_amount = ((d - 1.0) * (1.0 / 3.0)).clamp(0.0, 1.0);
        let (sat_in, _) = saturate_with_deriv(input * d, coeffs.asymmetry, coeffs.mode);
        let xin = lerp(input, sat_in * inv_d, drive_amount);

        // Newton-Raphson on f(y) = A·(xin - k·sat(y·d)/d) + S - y
        let mut y = self.y4_prev;
        for _ in 0..NR_ITERATIONS {
            let (sat_fb, sat_fb_deriv) = saturate_with_deriv(y * d, coeffs.asymmetry, coeffs.mode);
            let f = a * (xin - coeffs.k * sat_fb * inv_d) + s_term - y;
            let df = -a * coeffs.k * sat_fb_deriv - 1.0;
            y -= f / df;
        }

        // Explicit forward pass with the solved feedback
        let (sat_fb, _) = saturate_with_deriv(y * d, coeffs.asymmetry, coeffs.mode);
        let u = xin - coeffs.k * sat_fb * inv_d;

        let mut taps = [0.0f32; NUM_TAPS];
        taps[0] = u;
        let mut stage_in = u;
        for i in 0..NUM_STAGES {
            let y_i = big_g[i] * stage_in + big_b[i];
            self.s[i] = flush_denormal(2.0 * y_i - self.s[i]);
            taps[i + 1] = y_i;
            stage_in = y_i;
        }
        self.y4_prev = taps[NUM_STAGES];

        taps
    }

    /// Zero all integrator state and the warm-start memory.
    pub fn reset(&mut self) {
        self.s = [0.0; NUM_STAGES];
        self.y4_prev = 0.0;
        self.last_good_taps = [0.0; NUM_TAPS];
    }

    /// Recovered numeric faults since construction.
    pub fn fault_count(&self) -> u32 {
        self.faults
    }
}

impl Default for ZdfLadder {
    fn default() -> Self {
        Self::new()
    }
}
