//! Resona Core - DSP primitives for the resona filter engine
//!
//! This crate provides the foundational building blocks shared by the filter
//! engine, designed for real-time audio processing with zero allocation in
//! the audio path.
//!
//! # Core Abstractions
//!
//! - [`Effect`] - Object-safe trait for all audio processors
//! - [`SmoothedParam`] - Exponential parameter smoothing (RC-like response)
//! - [`ParamDescriptor`] - Parameter metadata with normalized-value mapping
//! - [`DcBlocker`] - First-order highpass for DC/bias removal
//! - [`Oversampled2x`] - 2× polyphase oversampling wrapper for nonlinear stages
//! - Math utilities: [`db_to_linear`], [`flush_denormal`], [`prewarp_g`], etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded audio applications.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! resona-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Bounded work**: Every processing call completes in a fixed number of ops

#![cfg_attr(not(feature = "std"), no_std)]

pub mod dc_blocker;
pub mod effect;
pub mod math;
pub mod oversample;
pub mod param;
pub mod param_info;

// Re-export main types at crate root
pub use dc_blocker::DcBlocker;
pub use effect::Effect;
pub use math::{db_to_linear, flush_denormal, lerp, linear_to_db, prewarp_g, wet_dry_mix};
pub use oversample::Oversampled2x;
pub use param::SmoothedParam;
pub use param_info::{ParamDescriptor, ParamScale, ParamUnit};
