//! Parameter surface: ids, descriptors, smoothing table, atomic publishing.
//!
//! The engine exposes seven normalized parameters. A control/UI thread
//! publishes targets through [`ParamSender`] (one atomic store per set); the
//! audio thread owns a [`ParamTable`] that pulls the latest targets and
//! advances one [`SmoothedParam`] per slot each sample. Because an `f32`
//! travels as a single `u32` bit pattern, the audio thread can never observe
//! a torn value.
//!
//! Smoothing runs in the normalized domain. For the log-mapped cutoff this
//! means smoothing happens in log-frequency space, which glides musically
//! across octaves.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use core::sync::atomic::{AtomicU32, Ordering};

use resona_core::{ParamDescriptor, ParamScale, ParamUnit, SmoothedParam};

/// Number of engine parameters.
pub const PARAM_COUNT: usize = 7;

/// Stable parameter identifier.
///
/// The discriminants are the wire indices used by `set_parameter` and must
/// never change once published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ParamId {
    /// Filter cutoff, log-mapped 20 Hz – 20 kHz.
    Cutoff = 0,
    /// Resonance, 0–0.95 effective (law depends on mode).
    Resonance = 1,
    /// Saturation drive.
    Drive = 2,
    /// Topology morph position across the response set.
    Morph = 3,
    /// Saturation asymmetry (transistor curve only).
    Asymmetry = 4,
    /// Vintage (0) to modern (1) character blend.
    Mode = 5,
    /// Dry/wet mix.
    Mix = 6,
}

impl ParamId {
    /// All parameters in wire order.
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Cutoff,
        ParamId::Resonance,
        ParamId::Drive,
        ParamId::Morph,
        ParamId::Asymmetry,
        ParamId::Mode,
        ParamId::Mix,
    ];

    /// Convert a wire index to an id.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The wire index of this id.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Display/mapping descriptors, indexed by [`ParamId`].
pub static DESCRIPTORS: [ParamDescriptor; PARAM_COUNT] = [
    ParamDescriptor::new("Cutoff", "Cutoff", ParamUnit::Hertz, 20.0, 20000.0, 1000.0)
        .with_scale(ParamScale::Logarithmic),
    ParamDescriptor::new("Resonance", "Reso", ParamUnit::None, 0.0, 1.0, 0.0),
    ParamDescriptor::new("Drive", "Drive", ParamUnit::None, 0.0, 1.0, 0.0),
    ParamDescriptor::new("Morph", "Morph", ParamUnit::None, 0.0, 1.0, 0.0),
    ParamDescriptor::new("Asymmetry", "Asym", ParamUnit::None, 0.0, 1.0, 0.0),
    ParamDescriptor::new("Mode", "Mode", ParamUnit::None, 0.0, 1.0, 0.0),
    ParamDescriptor::new("Mix", "Mix", ParamUnit::Percent, 0.0, 100.0, 100.0),
];

/// Default slew times in milliseconds, indexed by [`ParamId`].
///
/// Fast for pitch-critical controls (cutoff), slow for character switches
/// (asymmetry, mode) where an audible glide is the point.
pub const SLEW_MS: [f32; PARAM_COUNT] = [5.0, 10.0, 50.0, 20.0, 100.0, 200.0, 20.0];

/// Normalized parameter targets shared between threads.
///
/// One `AtomicU32` per slot holding the f32 bit pattern. Relaxed ordering is
/// sufficient: each slot is an independent single value and the audio thread
/// only needs *some* recent complete value, never an ordering between slots.
struct SharedTargets {
    bits: [AtomicU32; PARAM_COUNT],
}

impl SharedTargets {
    fn store(&self, id: ParamId, value: f32) {
        self.bits[id.index()].store(value.to_bits(), Ordering::Relaxed);
    }

    fn load(&self, id: ParamId) -> f32 {
        f32::from_bits(self.bits[id.index()].load(Ordering::Relaxed))
    }
}

/// Cloneable control-thread handle for publishing parameter targets.
///
/// Obtained from [`ParamTable::sender`]. Values are clamped to \[0, 1\]
/// before publishing; out-of-range input is never rejected.
#[derive(Clone)]
pub struct ParamSender {
    shared: Arc<SharedTargets>,
}

impl ParamSender {
    /// Publish a new normalized target for one parameter.
    pub fn set(&self, id: ParamId, normalized: f32) {
        self.shared.store(id, normalized.clamp(0.0, 1.0));
    }

    /// Read back the last published normalized target.
    pub fn get(&self, id: ParamId) -> f32 {
        self.shared.load(id)
    }
}

/// One sample's worth of smoothed normalized parameter values.
#[derive(Debug, Clone, Copy)]
pub struct ParamFrame {
    /// Smoothed cutoff (normalized, log-mapped).
    pub cutoff: f32,
    /// Smoothed resonance.
    pub resonance: f32,
    /// Smoothed drive.
    pub drive: f32,
    /// Smoothed morph position.
    pub morph: f32,
    /// Smoothed asymmetry.
    pub asymmetry: f32,
    /// Smoothed mode blend.
    pub mode: f32,
    /// Smoothed dry/wet mix.
    pub mix: f32,
}

/// Fixed-size parameter table owned by the audio thread.
///
/// Holds the smoothing state for every parameter plus the shared atomic
/// target slots. No allocation after construction.
pub struct ParamTable {
    shared: Arc<SharedTargets>,
    smoothers: [SmoothedParam; PARAM_COUNT],
}

impl ParamTable {
    /// Create a table with every parameter at its descriptor default.
    pub fn new() -> Self {
        let shared = Arc::new(SharedTargets {
            bits: [const { AtomicU32::new(0) }; PARAM_COUNT],
        });
        let mut smoothers: [SmoothedParam; PARAM_COUNT] = Default::default();
        for id in ParamId::ALL {
            let desc = &DESCRIPTORS[id.index()];
            let normalized_default = desc.normalize(desc.default);
            shared.store(id, normalized_default);
            smoothers[id.index()].set_immediate(normalized_default);
        }
        Self { shared, smoothers }
    }

    /// Reconfigure smoothing coefficients for a new sample rate.
    ///
    /// Called from `prepare()`. Smoother current values are preserved.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for id in ParamId::ALL {
            let smoother = &mut self.smoothers[id.index()];
            smoother.set_sample_rate(sample_rate);
            smoother.set_smoothing_time_ms(SLEW_MS[id.index()]);
        }
    }

    /// Create a control-thread handle sharing this table's target slots.
    pub fn sender(&self) -> ParamSender {
        ParamSender {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Set a normalized target (clamped to \[0, 1\]).
    ///
    /// Usable from the audio thread or, via [`ParamSender`], any other.
    pub fn set(&self, id: ParamId, normalized: f32) {
        self.shared.store(id, normalized.clamp(0.0, 1.0));
    }

    /// The last published normalized target for a parameter.
    pub fn target(&self, id: ParamId) -> f32 {
        self.shared.load(id)
    }

    /// The current smoothed normalized value for a parameter.
    pub fn current(&self, id: ParamId) -> f32 {
        self.smoothers[id.index()].get()
    }

    /// Snap every smoother to its published target (no glide).
    pub fn snap_to_targets(&mut self) {
        for id in ParamId::ALL {
            let target = self.shared.load(id);
            self.smoothers[id.index()].set_immediate(target);
        }
    }

    /// Pull the latest targets and advance every smoother by one sample.
    #[inline]
    pub fn tick(&mut self) -> ParamFrame {
        let mut values = [0.0f32; PARAM_COUNT];
        for id in ParamId::ALL {
            let smoother = &mut self.smoothers[id.index()];
            smoother.set_target(self.shared.load(id));
            values[id.index()] = smoother.advance();
        }
        ParamFrame {
            cutoff: values[ParamId::Cutoff.index()],
            resonance: values[ParamId::Resonance.index()],
            drive: values[ParamId::Drive.index()],
            morph: values[ParamId::Morph.index()],
            asymmetry: values[ParamId::Asymmetry.index()],
            mode: values[ParamId::Mode.index()],
            mix: values[ParamId::Mix.index()],
        }
    }
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::new()
    }
}
