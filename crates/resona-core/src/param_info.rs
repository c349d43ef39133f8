//! Parameter descriptors with normalized-value mapping.
//!
//! Hosts talk to the engine in normalized \[0.0, 1.0\] values; the engine maps
//! them to plain values (Hz, percent, unitless) through a [`ParamDescriptor`].
//! The descriptor also carries display metadata (name, unit) so a host or
//! hardware surface can label controls without knowing the engine internals.
//!
//! # Normalization Formulas
//!
//! - **Linear**: `normalized = (value - min) / (max - min)`
//! - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
//!
//! Reference: JUCE `NormalisableRange` (skew factor).
//!
//! This module is fully `no_std` compatible with no heap allocations.

/// Scaling curve for parameter normalization.
///
/// Determines how a parameter's plain value maps to normalized \[0.0, 1.0\]
/// space. Linear is default. Use Logarithmic for frequency parameters
/// (20 Hz–20 kHz), where perception is geometric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamScale {
    /// Linear mapping (default). Equal resolution across the range.
    #[default]
    Linear,
    /// Logarithmic mapping. More resolution at low values.
    /// Ideal for frequency parameters (20 Hz → 20 kHz).
    /// Requires `min > 0.0`.
    Logarithmic,
}

/// Unit type for parameter display and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Hertz (Hz) - for frequency parameters like filter cutoff.
    Hertz,
    /// Percentage (%) - for mix and normalized parameters.
    Percent,
    /// No unit - for dimensionless parameters (resonance, drive, morph).
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Hertz => " Hz",
            ParamUnit::Percent => "%",
            ParamUnit::None => "",
        }
    }
}

/// Describes a single parameter's metadata for display and mapping.
///
/// # Short Name
///
/// The `short_name` field should be 8 characters or less for compatibility
/// with hardware displays (LCD screens on MIDI controllers).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display (e.g., "Cutoff Frequency").
    pub name: &'static str,
    /// Short name for hardware displays, max 8 characters (e.g., "Cutoff").
    pub short_name: &'static str,
    /// Unit type for formatting the parameter value.
    pub unit: ParamUnit,
    /// Minimum plain value.
    pub min: f32,
    /// Maximum plain value.
    pub max: f32,
    /// Default plain value when the engine is initialized.
    pub default: f32,
    /// Normalization curve for mapping between plain and normalized values.
    pub scale: ParamScale,
}

impl ParamDescriptor {
    /// Create a linear descriptor.
    pub const fn new(
        name: &'static str,
        short_name: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit,
            min,
            max,
            default,
            scale: ParamScale::Linear,
        }
    }

    /// Sets the normalization scale (builder pattern).
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Clamps a plain value to this parameter's valid range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Converts a plain value to normalized range (0.0 to 1.0).
    ///
    /// Respects the parameter's [`ParamScale`]:
    /// - **Linear**: `(value - min) / (max - min)`
    /// - **Logarithmic**: `ln(value/min) / ln(max/min)` — requires `min > 0`
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
        }
    }

    /// Converts a normalized value (0.0 to 1.0) to the plain parameter range.
    ///
    /// Inverse of [`normalize`](Self::normalize), respecting [`ParamScale`].
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, normalized)
            }
        }
    }
}
