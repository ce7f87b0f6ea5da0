use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::error::Error;

/// Significant digits kept when no precision is configured.
pub const DEFAULT_SIGNIFICANT_DIGITS: u32 = 9;

/// Largest number of significant digits a 96-bit scaled decimal can carry.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 28;

/// Fixed decimal precision applied to every rate before it enters the log domain.
///
/// Passed explicitly to the graph instead of living in a process-wide context,
/// so two graphs in the same process can run with different precisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    significant_digits: u32,
}

impl Precision {
    /// # Errors
    /// Returns `Error::InvalidPrecision` if `significant_digits` is outside `1..=28`.
    pub fn new(significant_digits: u32) -> Result<Self, Error> {
        if significant_digits == 0 || significant_digits > MAX_SIGNIFICANT_DIGITS {
            return Err(Error::InvalidPrecision(significant_digits));
        }
        Ok(Self { significant_digits })
    }

    pub fn significant_digits(&self) -> u32 {
        self.significant_digits
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            significant_digits: DEFAULT_SIGNIFICANT_DIGITS,
        }
    }
}

/// Rounds `rate` to the configured number of significant digits.
///
/// All arithmetic stays in scaled integers, so the same textual rate always
/// quantizes to the same value. Returns `None` for non-positive rates.
pub fn quantize(rate: Decimal, precision: Precision) -> Option<Decimal> {
    if rate <= Decimal::ZERO {
        return None;
    }
    rate.round_sf(precision.significant_digits)
        .map(|q| q.normalize())
        .filter(|q| *q > Decimal::ZERO)
}

/// Transforms an exchange rate into its edge weight `w = -ln(rate)`.
///
/// The conversion to `f64` happens only here, after quantization, so the
/// rounding error entering the additive cycle-weight domain is bounded by
/// the configured precision. Along a cycle, `Σ w_i < 0` holds exactly when
/// `∏ rate_i > 1`.
///
/// Example:
/// ```text
/// rate = 0.9  -> w = -ln(0.9) ≈  0.10536
/// rate = 1.5  -> w = -ln(1.5) ≈ -0.40547
/// ```
///
/// Returns `None` if the rate is not strictly positive or the weight is not finite.
pub fn log_weight(rate: Decimal, precision: Precision) -> Option<f64> {
    let quantized = quantize(rate, precision)?;
    let weight = -quantized.to_f64()?.ln();
    weight.is_finite().then_some(weight)
}

/// Recovers the raw conversion rate from an edge weight: `rate = e^(-w)`.
pub fn rate_from_weight(weight: f64) -> f64 {
    (-weight).exp()
}
