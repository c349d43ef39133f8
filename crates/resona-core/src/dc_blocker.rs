//! DC blocking filter for removing DC offset and saturation bias.
//!
//! First-order highpass after Julius O. Smith's DC blocker:
//!
//! ```text
//! H(z) = (1 - z^-1) / (1 - R*z^-1)
//! ```
//!
//! R is a pole coefficient close to 1.0 that sets the cutoff
//! (`fc = (1-R)/(2*pi) * fs`). Asymmetric saturation rectifies the signal
//! slightly, so nonlinear stages need one or two of these downstream to
//! drain the resulting bias.
//!
//! Reference: Julius O. Smith, "Introduction to Digital Filters with Audio
//! Applications", DC Blocker chapter.

/// DC blocking filter using a first-order highpass.
///
/// Implements `y[n] = x[n] - x[n-1] + R * y[n-1]`.
///
/// ## Example
///
/// ```rust
/// use resona_core::DcBlocker;
///
/// let mut blocker = DcBlocker::with_coeff(0.995);
/// let output = blocker.process(0.5 + 0.1); // signal with 0.1 DC offset
/// ```
#[derive(Debug, Clone)]
pub struct DcBlocker {
    /// R coefficient (pole position, controls cutoff frequency)
    coeff: f32,
    /// Previous input sample x[n-1]
    x_prev: f32,
    /// Previous output sample y[n-1]
    y_prev: f32,
}

impl DcBlocker {
    /// Create a DC blocker with a specific R coefficient.
    ///
    /// # Arguments
    /// * `coeff` - R coefficient (typically 0.99 to 0.999). Higher values
    ///   give a lower cutoff frequency. Values are clamped to [0.9, 0.9999].
    pub fn with_coeff(coeff: f32) -> Self {
        Self {
            coeff: coeff.clamp(0.9, 0.9999),
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// Process a single sample through the DC blocker.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x_prev + self.coeff * self.y_prev;
        self.x_prev = input;
        // The recursive state decays forever on silence; flush it
        self.y_prev = crate::math::flush_denormal(output);
        output
    }

    /// Reset the filter state to zero.
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    /// Get the current R coefficient.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::with_coeff(0.995)
    }
}
