//! Core Effect trait.
//!
//! The [`Effect`] trait is the foundation of the DSP layer. Every processor in
//! the filter engine implements it, giving a consistent interface for
//! single-sample and block-based processing.
//!
//! ## Design Decisions
//!
//! - **Mono processing**: Single `f32` input/output. Multichannel engines
//!   run one instance per channel, keeping channel state strictly separate.
//!
//! - **Object-safe**: The trait supports `dyn Effect` when runtime dispatch
//!   is needed, though static dispatch is preferred in the audio path.
//!
//! - **No allocations**: All methods are designed to be called in real-time
//!   audio contexts with zero heap allocations.

/// Core trait for all audio processors.
///
/// # Example
///
/// ```rust
/// use resona_core::Effect;
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         input * self.gain
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {
///         // Gain doesn't depend on sample rate
///     }
///
///     fn reset(&mut self) {
///         // Gain has no internal state to reset
///     }
/// }
/// ```
pub trait Effect {
    /// Process a single sample.
    ///
    /// This is the core processing function. For effects with internal state
    /// (filters, delay lines), this advances the state by one sample.
    ///
    /// # Arguments
    /// * `input` - Input sample, typically in range [-1.0, 1.0]
    ///
    /// # Returns
    /// Processed output sample
    fn process(&mut self, input: f32) -> f32;

    /// Process a block of samples.
    ///
    /// Default implementation calls `process()` for each sample. Effects
    /// may override this for more efficient block processing.
    ///
    /// # Panics
    /// Default implementation debug-panics if `input.len() != output.len()`
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers must have same length"
        );
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block of samples in-place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Update the sample rate.
    ///
    /// Called when the sample rate changes. Effects recalculate any
    /// rate-dependent coefficients here (filter coefficients, smoothing
    /// increments, oversampling decisions).
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Reset internal state.
    ///
    /// Clears all internal state (filter history, delay lines) without
    /// changing parameters. Called when playback stops/starts to prevent
    /// artifacts.
    fn reset(&mut self);

    /// Report processing latency in samples.
    ///
    /// Used for latency compensation in hosts. Most effects have zero
    /// latency; FIR-based oversampling is the exception here.
    ///
    /// Default returns 0 (no latency).
    fn latency_samples(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain(f32);

    impl Effect for Gain {
        fn process(&mut self, input: f32) -> f32 {
            input * self.0
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {}
    }

    #[test]
    fn test_process_block_default() {
        let mut gain = Gain(2.0);
        let input = [1.0, 2.0, 3.0];
        let mut output = [0.0; 3];
        gain.process_block(&input, &mut output);
        assert_eq!(output, [2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_process_block_inplace() {
        let mut gain = Gain(0.5);
        let mut buffer = [2.0, 4.0];
        gain.process_block_inplace(&mut buffer);
        assert_eq!(buffer, [1.0, 2.0]);
    }

    #[test]
    fn test_default_latency_zero() {
        let gain = Gain(1.0);
        assert_eq!(gain.latency_samples(), 0);
    }
}
