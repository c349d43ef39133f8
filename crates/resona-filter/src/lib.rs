//! Resona Filter - Morphing nonlinear ladder filter engine
//!
//! A zero-delay-feedback four-stage ladder with global saturating feedback,
//! continuously morphable output topology, and light analog-style
//! per-instance variation, built on resona-core:
//!
//! - [`MorphFilter`] - The engine: lifecycle, parameters, interleaved I/O
//! - [`ZdfLadder`] - Four-stage ZDF core with Newton-Raphson feedback solve
//! - [`TopologyMixer`] - Morphable tap mixer (LP24 … Allpass)
//! - [`AnalogModel`] - Component tolerances and thermal cutoff drift
//! - [`ParamId`] / [`ParamSender`] - Lock-free parameter control surface
//!
//! ## Example
//!
//! ```rust
//! use resona_filter::{MorphFilter, ParamId};
//!
//! let mut filter = MorphFilter::new(0x5EED);
//! filter.prepare(48000.0, 512)?;
//!
//! filter.set_parameter(ParamId::Cutoff, 0.6);
//! filter.set_parameter(ParamId::Resonance, 0.5);
//! filter.set_parameter(ParamId::Morph, 0.0); // 24 dB/oct lowpass
//!
//! let mut block = vec![0.0f32; 1024]; // stereo interleaved
//! filter.process(&mut block, 2);
//! # Ok::<(), resona_filter::PrepareError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod analog;
pub mod engine;
pub mod ladder;
pub mod params;
pub mod stability;
pub mod topology;

// Re-export main types at crate root
pub use analog::{AnalogModel, saturate_with_deriv};
pub use engine::{MAX_CHANNELS, MorphFilter, PrepareError};
pub use ladder::{LadderCoeffs, ZdfLadder};
pub use params::{DESCRIPTORS, PARAM_COUNT, ParamId, ParamSender};
pub use topology::{Topology, TopologyMixer};
