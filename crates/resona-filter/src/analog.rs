//! Analog imperfection modeling: component tolerances, thermal drift, and
//! the saturation curves consumed by the implicit solver.
//!
//! Real ladder filters never have four identical stages. Each stage's
//! corner frequency lands within a manufacturing tolerance band, and the
//! whole circuit drifts slowly as it warms. Both effects are modeled here
//! from a per-instance deterministic RNG, so two engines with the same seed
//! produce identical "hardware" and test runs are reproducible. There is no
//! process-wide RNG state.
//!
//! The saturation curves expose closed-form derivatives; the Newton-Raphson
//! solver depends on them (no numeric differentiation in the audio path).

use core::f32::consts::TAU;
use libm::{cosf, expf, logf, sqrtf};

use resona_core::lerp;

/// Ladder stage count.
pub const NUM_STAGES: usize = 4;

/// Tolerance sigma in vintage mode (loose 5% components).
const SIGMA_VINTAGE: f32 = 0.05;

/// Tolerance sigma in modern mode (tight 1% components).
const SIGMA_MODERN: f32 = 0.01;

/// Thermal drift bound, as a fraction of cutoff.
const DRIFT_DEPTH: f32 = 0.02;

/// Drift lowpass bandwidth in Hz (well below audio rate).
const DRIFT_BANDWIDTH_HZ: f32 = 0.5;

/// Samples between drift updates. The drift signal is band-limited far
/// below the update rate, so decimating the update is inaudible and keeps
/// it out of the per-sample budget.
const DRIFT_UPDATE_INTERVAL: u32 = 32;

/// SplitMix64 generator.
///
/// Small, fast, and deterministic from a seed; statistically strong enough
/// for component tolerances and drift noise. Never shared across instances.
///
/// Reference: Steele, Lea & Flood, "Fast Splittable Pseudorandom Number
/// Generators" (OOPSLA 2014).
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    /// Create a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    /// Uniform value in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        // Top 24 bits give a full-precision f32 mantissa
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform value in [-1, 1).
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }

    /// Standard normal draw via Box-Muller, clamped to ±3.
    ///
    /// The clamp keeps a pathological draw from producing an unusable
    /// component; real parts binned outside ±3 sigma don't ship.
    pub fn next_gaussian(&mut self) -> f32 {
        let u1 = self.next_f32().max(1e-7);
        let u2 = self.next_f32();
        let g = sqrtf(-2.0 * logf(u1)) * cosf(TAU * u2);
        g.clamp(-3.0, 3.0)
    }
}

/// Slow thermal drift: white noise through a sub-1 Hz one-pole lowpass,
/// updated every [`DRIFT_UPDATE_INTERVAL`] samples and bounded to ±2%.
#[derive(Debug, Clone)]
struct ThermalDrift {
    rng: SplitMix64,
    /// Lowpass state
    state: f32,
    /// One-pole coefficient at the decimated update rate
    coeff: f32,
    /// Samples until the next update
    countdown: u32,
    /// Current drift value, fraction of cutoff in [-0.02, 0.02]
    value: f32,
}

impl ThermalDrift {
    fn new(seed: u64) -> Self {
        Self {
            rng: SplitMix64::new(seed),
            state: 0.0,
            coeff: 0.0,
            countdown: 0,
            value: 0.0,
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        let update_rate = sample_rate / DRIFT_UPDATE_INTERVAL as f32;
        self.coeff = 1.0 - expf(-TAU * DRIFT_BANDWIDTH_HZ / update_rate);
    }

    /// Advance one sample; returns the current drift fraction.
    #[inline]
    fn tick(&mut self) -> f32 {
        if self.countdown == 0 {
            self.countdown = DRIFT_UPDATE_INTERVAL;
            let noise = self.rng.next_bipolar();
            self.state += self.coeff * (noise - self.state);
            // The lowpass attenuates the noise heavily; the makeup gain
            // spreads the walk across the full ±DRIFT_DEPTH band.
            self.value = (self.state * DRIFT_DEPTH * 8.0).clamp(-DRIFT_DEPTH, DRIFT_DEPTH);
        }
        self.countdown -= 1;
        self.value
    }

    fn reset_phase(&mut self) {
        self.countdown = 0;
    }
}

/// Per-channel analog character model.
///
/// Holds the per-stage tolerance draws (made once per `prepare`) and the
/// running thermal drift. Both can be disabled independently, which gives
/// bit-identical channels for tests and A/B comparison.
#[derive(Debug, Clone)]
pub struct AnalogModel {
    seed: u64,
    /// Unit-normal tolerance draws per stage; scaled by the mode sigma at
    /// use time so the vintage/modern blend stays continuous.
    stage_draws: [f32; NUM_STAGES],
    drift: ThermalDrift,
    tolerance_enabled: bool,
    drift_enabled: bool,
}

impl AnalogModel {
    /// Create a model for one channel. Tolerances are drawn in
    /// [`redraw`](Self::redraw), called from `prepare()`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            stage_draws: [0.0; NUM_STAGES],
            drift: ThermalDrift::new(seed ^ 0xD1F7_0000_0000_0001),
            tolerance_enabled: true,
            drift_enabled: true,
        }
    }

    /// Draw fresh per-stage tolerances from the instance seed.
    ///
    /// Deterministic: the same seed always yields the same component set.
    pub fn redraw(&mut self) {
        let mut rng = SplitMix64::new(self.seed);
        for draw in &mut self.stage_draws {
            *draw = rng.next_gaussian();
        }
    }

    /// Reconfigure the drift filter for a new sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.drift.set_sample_rate(sample_rate);
    }

    /// Enable/disable component tolerances (enabled by default).
    pub fn set_tolerance_enabled(&mut self, enabled: bool) {
        self.tolerance_enabled = enabled;
    }

    /// Enable/disable thermal drift (enabled by default).
    pub fn set_drift_enabled(&mut self, enabled: bool) {
        self.drift_enabled = enabled;
    }

    /// Advance the drift signal one sample and return the per-stage cutoff
    /// factors for this sample.
    ///
    /// Each factor multiplies the stage's target cutoff: tolerance scales
    /// with the mode blend (5% sigma vintage, 1% modern), drift adds a
    /// shared ±2% wander.
    #[inline]
    pub fn stage_factors(&mut self, mode: f32) -> [f32; NUM_STAGES] {
        let drift = if self.drift_enabled {
            self.drift.tick()
        } else {
            0.0
        };
        let sigma = if self.tolerance_enabled {
            lerp(SIGMA_VINTAGE, SIGMA_MODERN, mode)
        } else {
            0.0
        };
        let mut factors = [1.0f32; NUM_STAGES];
        for (factor, &draw) in factors.iter_mut().zip(self.stage_draws.iter()) {
            *factor = (1.0 + draw * sigma) * (1.0 + drift);
        }
        factors
    }

    /// Restart the drift update phase (state survives, as a warm circuit
    /// stays warm across a transport stop).
    pub fn reset(&mut self) {
        self.drift.reset_phase();
    }
}

// ---------------------------------------------------------------------------
// Saturation curves
// ---------------------------------------------------------------------------

/// Asymmetric exponential "transistor" saturator.
///
/// Positive half: `(1 - e^(-k·x)) / k` with `k = 1 + asymmetry`; negative
/// half: `e^x - 1`. Both halves have unity slope at the origin, so the
/// small-signal frequency response is untouched and asymmetry only shapes
/// the overdriven waveform (even harmonics).
#[inline]
pub fn transistor_sat(x: f32, asymmetry: f32) -> f32 {
    if x >= 0.0 {
        let k = 1.0 + asymmetry;
        (1.0 - expf(-k * x)) / k
    } else {
        expf(x) - 1.0
    }
}

/// Derivative of [`transistor_sat`] with respect to `x`.
#[inline]
pub fn transistor_sat_deriv(x: f32, asymmetry: f32) -> f32 {
    if x >= 0.0 {
        expf(-(1.0 + asymmetry) * x)
    } else {
        expf(x)
    }
}

/// Polynomial "vintage" waveshaper: `x - x³/3`, flat beyond |x| = 1.
///
/// Saturates at ±2/3 with only odd harmonics. Unity slope at the origin.
#[inline]
pub fn vintage_sat(x: f32) -> f32 {
    let x = x.clamp(-1.0, 1.0);
    x - x * x * x * (1.0 / 3.0)
}

/// Derivative of [`vintage_sat`] with respect to `x`.
#[inline]
pub fn vintage_sat_deriv(x: f32) -> f32 {
    if x.abs() >= 1.0 { 0.0 } else { 1.0 - x * x }
}

/// Mode-blended saturator value and derivative in one evaluation.
///
/// `mode` = 0 selects the vintage polynomial, 1 the transistor exponential;
/// in between the curves crossfade so a mode sweep never clicks.
#[inline]
pub fn saturate_with_deriv(x: f32, asymmetry: f32, mode: f32) -> (f32, f32) {
    let v = vintage_sat(x);
    let dv = vintage_sat_deriv(x);
    let t = transistor_sat(x, asymmetry);
    let dt = transistor_sat_deriv(x, asymmetry);
    (lerp(v, t, mode), lerp(dv, dt, mode))
}
