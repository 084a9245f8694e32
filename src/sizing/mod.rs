//! Position sizing
//!
//! Converts balance, signal confidence and stop distance into a trade size.
//! Pure computation: the caller deducts balance and submits the order.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::RiskConfig;
use crate::error::RiskError;

/// A computed trade size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeSize {
    /// Notional in dollars
    pub dollars: Decimal,
    /// Size in units of the traded asset
    pub units: Decimal,
}

/// Confidence- and regime-adjusted risk-based position sizer
#[derive(Debug, Clone)]
pub struct PositionSizer {
    /// Fraction of balance risked per trade before adjustments
    pub base_risk_pct: Decimal,
    /// Hard cap on notional as a fraction of balance
    pub max_position_pct: Decimal,
}

impl PositionSizer {
    /// Create a sizer from configuration
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            base_risk_pct: config.base_risk_pct,
            max_position_pct: config.max_position_pct,
        }
    }

    /// Scale factor from signal confidence (0-100)
    ///
    /// 50 maps to 1.0; clamped to [0.5, 1.5] so an extreme confidence
    /// reading can at most halve or 1.5x the risk budget.
    pub fn confidence_scalar(confidence: Decimal) -> Decimal {
        let scalar = Decimal::ONE + (confidence - dec!(50)) / dec!(100);
        scalar.clamp(dec!(0.5), dec!(1.5))
    }

    /// Compute the trade size for a signal
    ///
    /// `win_rate` comes from the agent's trade history and is recorded for
    /// diagnostics; the risk budget itself is driven by confidence and the
    /// regime multiplier.
    pub fn calculate(
        &self,
        balance: Decimal,
        entry_price: Decimal,
        stop_price: Decimal,
        confidence: Decimal,
        win_rate: Decimal,
        volatility_multiplier: Decimal,
    ) -> Result<TradeSize, RiskError> {
        let risk_per_unit = (entry_price - stop_price).abs();
        if risk_per_unit <= Decimal::ZERO {
            return Err(RiskError::InvalidStop(risk_per_unit));
        }

        let scalar = Self::confidence_scalar(confidence);
        let risk_amount = balance * self.base_risk_pct * scalar * volatility_multiplier;

        let units = risk_amount / risk_per_unit;
        let dollars = units * entry_price;

        // Hard notional cap
        let max_dollars = balance * self.max_position_pct;
        let (dollars, units) = if dollars > max_dollars {
            (max_dollars, max_dollars / entry_price)
        } else {
            (dollars, units)
        };

        if dollars > balance {
            return Err(RiskError::InsufficientBalance {
                required: dollars,
                available: balance,
            });
        }

        tracing::debug!(
            %balance,
            %confidence,
            %win_rate,
            %volatility_multiplier,
            risk_amount = %risk_amount,
            size_dollars = %dollars,
            "Position sized"
        );

        Ok(TradeSize { dollars, units })
    }
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self::new(&RiskConfig::default())
    }
}
