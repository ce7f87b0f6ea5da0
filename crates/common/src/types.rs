use rust_decimal::Decimal;
use std::fmt;

/// One supplied quote: `rate` units of `destination` per unit of `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRecord {
    pub origin: String,
    pub destination: String,
    pub rate: Decimal,
}

impl RateRecord {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, rate: Decimal) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            rate,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.origin == self.destination
    }
}

/// Distinguishes a currency quoted against itself from a genuine multi-hop route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// `A -> A` at a rate above 1. Usually a data error, reported on its own.
    SelfLoop,
    MultiHop,
}

/// Represents a profitable cycle in the exchange graph.
///
/// Fields:
/// - `currencies`: Currency names along the cycle, closed (`first == last`).
/// - `log_weight_sum`: Sum of edge weights `-ln(rate_i)`; strictly negative for arbitrage.
/// - `kind`: Whether this is a self-loop or a multi-hop cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrageCycle {
    pub currencies: Vec<String>,
    pub log_weight_sum: f64,
    pub kind: CycleKind,
}

impl ArbitrageCycle {
    /// Returns the profit multiplier (∏ rate_i) for the cycle.
    ///
    /// The cycle stores ∑ w_i where w_i = -ln(rate_i), so the product is
    /// recovered as e^(-∑ w_i).
    ///
    /// Example:
    /// ```text
    /// rates [0.9, 0.8, 1.5] (∏ = 1.08)
    /// log_weight_sum = -ln(1.08) ≈ -0.07696
    /// product_rate   = exp(0.07696) = 1.08
    /// ```
    pub fn product_rate(&self) -> f64 {
        (-self.log_weight_sum).exp()
    }

    /// Net gain of one trip around the cycle as a fraction (`0.08` for 8%).
    pub fn net_gain(&self) -> f64 {
        self.product_rate() - 1.0
    }

    pub fn net_gain_percentage(&self) -> f64 {
        self.net_gain() * 100.0
    }

    /// Returns true if the cycle is profitable (product_rate > 1.0).
    pub fn is_profitable(&self) -> bool {
        self.log_weight_sum < 0.0
    }

    /// Number of conversions needed to go around the cycle once.
    pub fn hop_count(&self) -> usize {
        self.currencies.len().saturating_sub(1)
    }

    pub fn contains(&self, currency: &str) -> bool {
        self.currencies.iter().any(|c| c == currency)
    }
}

impl fmt::Display for ArbitrageCycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}  gain: {:+.4}%",
            self.currencies.join(" -> "),
            self.net_gain_percentage()
        )?;
        if self.kind == CycleKind::SelfLoop {
            write!(f, "  [self-loop]")?;
        }
        Ok(())
    }
}

/// Type alias for a single indexed edge: (from, to, weight)
pub type Edge = (usize, usize, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(names: &[&str], rate_product: f64, kind: CycleKind) -> ArbitrageCycle {
        ArbitrageCycle {
            currencies: names.iter().map(|s| s.to_string()).collect(),
            log_weight_sum: -rate_product.ln(),
            kind,
        }
    }

    #[test]
    fn product_and_gain_from_log_sum() {
        let c = cycle(&["USD", "EUR", "GBP", "USD"], 1.08, CycleKind::MultiHop);
        assert!((c.product_rate() - 1.08).abs() < 1e-12);
        assert!((c.net_gain_percentage() - 8.0).abs() < 1e-9);
        assert!(c.is_profitable());
        assert_eq!(c.hop_count(), 3);
        assert!(c.contains("GBP"));
        assert!(!c.contains("JPY"));
    }

    #[test]
    fn display_marks_self_loops() {
        let multi = cycle(&["USD", "EUR", "GBP", "USD"], 1.08, CycleKind::MultiHop);
        assert_eq!(multi.to_string(), "USD -> EUR -> GBP -> USD  gain: +8.0000%");

        let single = cycle(&["XAU", "XAU"], 1.5, CycleKind::SelfLoop);
        assert_eq!(single.to_string(), "XAU -> XAU  gain: +50.0000%  [self-loop]");
        assert_eq!(single.hop_count(), 1);
    }

    #[test]
    fn self_loop_record_detection() {
        let record = RateRecord::new("USD", "USD", Decimal::ONE);
        assert!(record.is_self_loop());
        assert!(!RateRecord::new("USD", "EUR", Decimal::ONE).is_self_loop());
    }
}
