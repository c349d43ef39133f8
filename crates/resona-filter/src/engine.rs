//! The `MorphFilter` engine: lifecycle, per-sample coefficient derivation,
//! and the interleaved processing entry point.
//!
//! Signal path per channel:
//!
//! ```text
//! in → [ 2× Oversampled { ZdfLadder → TopologyMixer } ] → DC×2 → mix → out
//! ```
//!
//! Parameter targets arrive through atomics (see [`crate::params`]) and are
//! smoothed once per base-rate sample; the derived ladder coefficients are
//! held constant across that sample's sub-samples. Everything after
//! [`MorphFilter::prepare`] is allocation-free and bounded-time.

use resona_core::{DcBlocker, Effect, Oversampled2x, wet_dry_mix};

use crate::analog::{AnalogModel, NUM_STAGES};
use crate::ladder::{LadderCoeffs, ZdfLadder};
use crate::params::{DESCRIPTORS, ParamFrame, ParamId, ParamSender, ParamTable};
use crate::stability::{feedback_k, stage_g};
use crate::topology::TopologyMixer;

/// Maximum channel count handled per instance.
pub const MAX_CHANNELS: usize = 2;

/// Second DC blocker pole radius. Two cascaded first-order blockers give a
/// 12 dB/oct rejection of drift injected by asymmetric saturation.
const DC_COEFF: f32 = 0.995;

/// Error returned by [`MorphFilter::prepare`] for unusable host configs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrepareError {
    /// Sample rate was zero, negative, or non-finite.
    InvalidSampleRate(f32),
    /// Maximum block size was zero.
    InvalidBlockSize(usize),
}

impl core::fmt::Display for PrepareError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PrepareError::InvalidSampleRate(rate) => {
                write!(f, "invalid sample rate: {rate}")
            }
            PrepareError::InvalidBlockSize(size) => {
                write!(f, "invalid maximum block size: {size}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PrepareError {}

/// Ladder plus tap mixer, run at the oversampled rate.
///
/// The coefficient set is written once per base-rate sample by the engine;
/// the `Effect` impl only consumes it, so both sub-samples of a base sample
/// see identical coefficients.
struct LadderCore {
    ladder: ZdfLadder,
    mixer: TopologyMixer,
    coeffs: LadderCoeffs,
}

impl LadderCore {
    fn new() -> Self {
        Self {
            ladder: ZdfLadder::new(),
            mixer: TopologyMixer::new(),
            coeffs: LadderCoeffs::default(),
        }
    }

    fn fault_count(&self) -> u32 {
        self.ladder.fault_count()
    }
}

impl Effect for LadderCore {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let taps = self.ladder.process(input, &self.coeffs);
        self.mixer.mix(&taps)
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {
        // Coefficients are derived externally at the effective rate.
    }

    fn reset(&mut self) {
        self.ladder.reset();
    }
}

/// All per-channel state.
struct ChannelState {
    oversampler: Oversampled2x<LadderCore>,
    analog: AnalogModel,
    dc: [DcBlocker; 2],
    /// Last finite input sample, substituted when the host hands us NaN/inf
    /// so the dry path stays defined.
    last_input: f32,
    input_faults: u32,
}

impl ChannelState {
    fn new(seed: u64, sample_rate: f32) -> Self {
        Self {
            oversampler: Oversampled2x::new(LadderCore::new(), sample_rate),
            analog: AnalogModel::new(seed),
            dc: [DcBlocker::with_coeff(DC_COEFF), DcBlocker::with_coeff(DC_COEFF)],
            last_input: 0.0,
            input_faults: 0,
        }
    }
}

/// Morphing nonlinear ladder filter.
///
/// One instance handles up to [`MAX_CHANNELS`] interleaved channels with a
/// shared parameter set and independent per-channel state (component
/// tolerances included, so stereo material decorrelates slightly like two
/// hardware units would).
///
/// # Example
///
/// ```rust
/// use resona_filter::{MorphFilter, ParamId};
///
/// let mut filter = MorphFilter::new(0x5EED);
/// filter.prepare(48000.0, 512).unwrap();
/// filter.set_parameter(ParamId::Resonance, 0.5);
///
/// let mut block = [0.1f32; 512]; // stereo interleaved, 256 frames
/// filter.process(&mut block, 2);
/// ```
pub struct MorphFilter {
    sample_rate: f32,
    max_block_size: usize,
    prepared: bool,
    seed: u64,
    params: ParamTable,
    channels: [ChannelState; MAX_CHANNELS],
}

impl MorphFilter {
    /// Create an unprepared engine.
    ///
    /// The seed determines each channel's component-tolerance draws; two
    /// instances built from the same seed render identically. No audio may
    /// be processed before [`prepare`](Self::prepare).
    pub fn new(seed: u64) -> Self {
        // Adjacent seeds decorrelate fully under SplitMix64, so a simple
        // per-channel offset is enough.
        let channels = [
            ChannelState::new(seed, 48000.0),
            ChannelState::new(seed.wrapping_add(1), 48000.0),
        ];
        Self {
            sample_rate: 48000.0,
            max_block_size: 0,
            prepared: false,
            seed,
            params: ParamTable::new(),
            channels,
        }
    }

    /// Configure for a host session: sample rate, maximum block size.
    ///
    /// Redraws component tolerances from the instance seed, reconfigures the
    /// oversampler (engaged below 96 kHz, bypassed at or above), rebuilds
    /// smoothing coefficients, and clears all audio state. May allocate; the
    /// audio thread must not be running `process` concurrently.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<(), PrepareError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(PrepareError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(PrepareError::InvalidBlockSize(max_block_size));
        }

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.params.set_sample_rate(sample_rate);

        for channel in &mut self.channels {
            channel.oversampler.set_sample_rate(sample_rate);
            channel.analog.set_sample_rate(sample_rate);
            channel.analog.redraw();
            channel.oversampler.reset();
            for dc in &mut channel.dc {
                dc.reset();
            }
            channel.last_input = 0.0;
        }

        self.prepared = true;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate,
            max_block_size,
            oversampling = !self.channels[0].oversampler.is_bypassed(),
            latency = self.latency_samples(),
            "prepared morph filter"
        );

        Ok(())
    }

    /// Process an interleaved block in place.
    ///
    /// `buffer` holds `buffer.len() / num_channels` frames. Channels beyond
    /// [`MAX_CHANNELS`] pass through untouched. Calling before `prepare`
    /// leaves the buffer unmodified.
    pub fn process(&mut self, buffer: &mut [f32], num_channels: usize) {
        if !self.prepared || num_channels == 0 {
            return;
        }
        let active = num_channels.min(MAX_CHANNELS);

        for frame in buffer.chunks_exact_mut(num_channels) {
            let params = self.params.tick();
            for (ch, sample) in frame.iter_mut().enumerate().take(active) {
                *sample = process_channel(&mut self.channels[ch], *sample, &params);
            }
        }
    }

    /// Zero all audio state: ladder integrators, oversampler FIR history,
    /// DC blockers, drift phase.
    ///
    /// Component tolerances and the smoothed parameter positions are
    /// preserved, so resuming playback neither re-randomizes the character
    /// nor replays a parameter glide.
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.oversampler.reset();
            channel.analog.reset();
            for dc in &mut channel.dc {
                dc.reset();
            }
            channel.last_input = 0.0;
        }
    }

    /// Total latency in base-rate samples (oversampler group delay, or zero
    /// when bypassed).
    pub fn latency_samples(&self) -> usize {
        self.channels[0].oversampler.latency_samples()
    }

    /// Number of exposed parameters.
    pub fn num_parameters(&self) -> usize {
        DESCRIPTORS.len()
    }

    /// Descriptor for one parameter.
    pub fn parameter_descriptor(&self, id: ParamId) -> &'static resona_core::ParamDescriptor {
        &DESCRIPTORS[id.index()]
    }

    /// Display name for one parameter.
    pub fn parameter_name(&self, id: ParamId) -> &'static str {
        DESCRIPTORS[id.index()].name
    }

    /// Set a normalized \[0, 1\] parameter target. The audible value glides
    /// over that parameter's slew time.
    pub fn set_parameter(&self, id: ParamId, normalized: f32) {
        self.params.set(id, normalized);
    }

    /// The last published normalized target.
    pub fn parameter(&self, id: ParamId) -> f32 {
        self.params.target(id)
    }

    /// Cheap cloneable handle for setting parameters from another thread.
    pub fn param_sender(&self) -> ParamSender {
        self.params.sender()
    }

    /// Skip all parameter glides and jump smoothers to their targets.
    pub fn snap_parameters(&mut self) {
        self.params.snap_to_targets();
    }

    /// Enable or disable per-stage component tolerances (default on).
    pub fn set_tolerance_enabled(&mut self, enabled: bool) {
        for channel in &mut self.channels {
            channel.analog.set_tolerance_enabled(enabled);
        }
    }

    /// Enable or disable thermal cutoff drift (default on).
    pub fn set_drift_enabled(&mut self, enabled: bool) {
        for channel in &mut self.channels {
            channel.analog.set_drift_enabled(enabled);
        }
    }

    /// Recovered numeric faults since construction, summed over channels.
    /// Counts both non-finite ladder taps and non-finite host input.
    pub fn numeric_faults(&self) -> u32 {
        self.channels
            .iter()
            .map(|c| {
                c.oversampler
                    .inner()
                    .fault_count()
                    .saturating_add(c.input_faults)
            })
            .sum()
    }

    /// The tolerance seed this instance was built with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Derive this sample's ladder coefficients and run one channel.
#[inline]
fn process_channel(channel: &mut ChannelState, input: f32, params: &ParamFrame) -> f32 {
    // The ladder recovers from non-finite values internally, but the dry
    // branch of the wet/dry mix would pass them straight through. Hold the
    // last finite sample instead and count the fault.
    let input = if input.is_finite() {
        channel.last_input = input;
        input
    } else {
        channel.input_faults = channel.input_faults.saturating_add(1);
        channel.last_input
    };

    let cutoff_hz = DESCRIPTORS[ParamId::Cutoff.index()].denormalize(params.cutoff);
    let effective_rate = channel.oversampler.effective_rate();
    let factors = channel.analog.stage_factors(params.mode);

    let mut g = [0.0f32; NUM_STAGES];
    let mut g_max = 0.0f32;
    for i in 0..NUM_STAGES {
        g[i] = stage_g(cutoff_hz * factors[i], effective_rate);
        g_max = g_max.max(g[i]);
    }

    let core = channel.oversampler.inner_mut();
    core.coeffs = LadderCoeffs {
        g,
        k: feedback_k(params.resonance, params.mode, g_max),
        drive_gain: 1.0 + 3.0 * params.drive,
        asymmetry: params.asymmetry,
        mode: params.mode,
    };
    core.mixer.set_morph(params.morph);

    let wet = channel.oversampler.process(input);
    let wet = channel.dc[0].process(wet);
    let wet = channel.dc[1].process(wet);
    wet_dry_mix(input, wet, params.mix)
}
