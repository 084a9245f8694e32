//! Configuration types for risk-engine

use rust_decimal::Decimal;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub stops: StopConfig,
    #[serde(default)]
    pub trailing: TrailingConfig,
    #[serde(default)]
    pub regime: RegimeConfig,
    #[serde(default)]
    pub rebalance: RebalanceConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Position sizing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Fraction of balance risked per trade before adjustments
    #[serde(default = "default_base_risk_pct")]
    pub base_risk_pct: Decimal,

    /// Hard cap on position notional as a fraction of balance
    #[serde(default = "default_max_position_pct")]
    pub max_position_pct: Decimal,

    /// Fallback stop distance as a fraction of entry when ATR is zero
    #[serde(default = "default_stop_pct")]
    pub default_stop_pct: Decimal,
}

fn default_base_risk_pct() -> Decimal {
    Decimal::new(25, 3) // 0.025 = 2.5%
}
fn default_max_position_pct() -> Decimal {
    Decimal::new(10, 2) // 0.10 = 10%
}
fn default_stop_pct() -> Decimal {
    Decimal::new(2, 2) // 0.02 = 2%
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_risk_pct: default_base_risk_pct(),
            max_position_pct: default_max_position_pct(),
            default_stop_pct: default_stop_pct(),
        }
    }
}

/// Drawdown and loss limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum per-agent drawdown from peak balance
    #[serde(default = "default_max_agent_risk")]
    pub max_agent_risk: Decimal,

    /// Maximum portfolio drawdown from peak value; pauses all agents
    #[serde(default = "default_max_portfolio_risk")]
    pub max_portfolio_risk: Decimal,

    /// Maximum loss per agent within a trading day
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
}

fn default_max_agent_risk() -> Decimal {
    Decimal::new(3, 2) // 0.03 = 3%
}
fn default_max_portfolio_risk() -> Decimal {
    Decimal::new(6, 2) // 0.06 = 6%
}
fn default_max_daily_loss() -> Decimal {
    Decimal::new(2, 2) // 0.02 = 2%
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_agent_risk: default_max_agent_risk(),
            max_portfolio_risk: default_max_portfolio_risk(),
            max_daily_loss: default_max_daily_loss(),
        }
    }
}

/// Initial stop placement: ATR multipliers per volatility state
#[derive(Debug, Clone, Deserialize)]
pub struct StopConfig {
    /// Multiplier under low volatility (tighter stop)
    #[serde(default = "default_low_multiplier")]
    pub low_multiplier: Decimal,

    /// Multiplier under normal volatility
    #[serde(default = "default_normal_multiplier")]
    pub normal_multiplier: Decimal,

    /// Multiplier under high volatility (wider stop)
    #[serde(default = "default_high_multiplier")]
    pub high_multiplier: Decimal,
}

fn default_low_multiplier() -> Decimal {
    Decimal::new(15, 1) // 1.5
}
fn default_normal_multiplier() -> Decimal {
    Decimal::new(20, 1) // 2.0
}
fn default_high_multiplier() -> Decimal {
    Decimal::new(25, 1) // 2.5
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            low_multiplier: default_low_multiplier(),
            normal_multiplier: default_normal_multiplier(),
            high_multiplier: default_high_multiplier(),
        }
    }
}

/// Trailing stop level thresholds and stop-distance multipliers
///
/// `thresholds[i]` is the unrealized profit fraction required to reach
/// level i+1; `multipliers[i]` is the ATR multiple used for the stop
/// distance at that level (0 = stop moves to entry).
#[derive(Debug, Clone, Deserialize)]
pub struct TrailingConfig {
    #[serde(default = "default_thresholds")]
    pub thresholds: [Decimal; 5],

    #[serde(default = "default_level_multipliers")]
    pub multipliers: [Decimal; 5],
}

fn default_thresholds() -> [Decimal; 5] {
    [
        Decimal::new(2, 2),  // 2% -> breakeven
        Decimal::new(5, 2),  // 5%
        Decimal::new(10, 2), // 10%
        Decimal::new(15, 2), // 15%
        Decimal::new(20, 2), // 20%
    ]
}

fn default_level_multipliers() -> [Decimal; 5] {
    [
        Decimal::ZERO,       // breakeven: stop = entry
        Decimal::new(15, 1), // 1.5
        Decimal::new(10, 1), // 1.0
        Decimal::new(7, 1),  // 0.7
        Decimal::new(5, 1),  // 0.5
    ]
}

impl Default for TrailingConfig {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
            multipliers: default_level_multipliers(),
        }
    }
}

/// Regime-driven position size multipliers
#[derive(Debug, Clone, Deserialize)]
pub struct RegimeConfig {
    /// Size multiplier under high volatility
    #[serde(default = "default_high_vol_size")]
    pub high_vol_size_multiplier: Decimal,

    /// Size multiplier under normal volatility
    #[serde(default = "default_normal_vol_size")]
    pub normal_vol_size_multiplier: Decimal,

    /// Size multiplier under low volatility
    #[serde(default = "default_low_vol_size")]
    pub low_vol_size_multiplier: Decimal,
}

fn default_high_vol_size() -> Decimal {
    Decimal::new(7, 1) // 0.7
}
fn default_normal_vol_size() -> Decimal {
    Decimal::ONE
}
fn default_low_vol_size() -> Decimal {
    Decimal::new(11, 1) // 1.1
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            high_vol_size_multiplier: default_high_vol_size(),
            normal_vol_size_multiplier: default_normal_vol_size(),
            low_vol_size_multiplier: default_low_vol_size(),
        }
    }
}

/// Capital reallocation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceConfig {
    /// Cap on any single agent's capital weight
    #[serde(default = "default_max_agent_allocation")]
    pub max_agent_allocation: Decimal,

    /// Rebalance period in days (driven by an external scheduler)
    #[serde(default = "default_rebalance_days")]
    pub period_days: u32,
}

fn default_max_agent_allocation() -> Decimal {
    Decimal::new(40, 2) // 0.40 = 40%
}
fn default_rebalance_days() -> u32 {
    7
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            max_agent_allocation: default_max_agent_allocation(),
            period_days: default_rebalance_days(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_metrics_port() -> u16 {
    9090
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
        }
    }
}

/// Paper simulation configuration (`run` subcommand)
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_agent_count")]
    pub agents: usize,

    #[serde(default = "default_tick_count")]
    pub ticks: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
}

fn default_agent_count() -> usize {
    3
}
fn default_tick_count() -> usize {
    500
}
fn default_seed() -> u64 {
    42
}
fn default_initial_balance() -> Decimal {
    Decimal::new(100_000, 0)
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: default_agent_count(),
            ticks: default_tick_count(),
            seed: default_seed(),
            initial_balance: default_initial_balance(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.risk.base_risk_pct, dec!(0.025));
        assert_eq!(config.risk.max_position_pct, dec!(0.10));
        assert_eq!(config.limits.max_agent_risk, dec!(0.03));
        assert_eq!(config.limits.max_portfolio_risk, dec!(0.06));
        assert_eq!(config.limits.max_daily_loss, dec!(0.02));
        assert_eq!(config.stops.normal_multiplier, dec!(2.0));
        assert_eq!(config.trailing.thresholds[0], dec!(0.02));
        assert_eq!(config.trailing.multipliers[0], dec!(0));
        assert_eq!(config.rebalance.max_agent_allocation, dec!(0.40));
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [risk]
            base_risk_pct = 0.02
            max_position_pct = 0.05

            [limits]
            max_agent_risk = 0.04

            [stops]
            high_multiplier = 3.0

            [telemetry]
            metrics_port = 9100
            log_level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.risk.base_risk_pct, dec!(0.02));
        assert_eq!(config.risk.max_position_pct, dec!(0.05));
        // Unset fields fall back to defaults
        assert_eq!(config.risk.default_stop_pct, dec!(0.02));
        assert_eq!(config.limits.max_agent_risk, dec!(0.04));
        assert_eq!(config.limits.max_portfolio_risk, dec!(0.06));
        assert_eq!(config.stops.high_multiplier, dec!(3.0));
        assert_eq!(config.stops.low_multiplier, dec!(1.5));
        assert_eq!(config.telemetry.metrics_port, 9100);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_trailing_overrides() {
        let toml = r#"
            [trailing]
            thresholds = [0.01, 0.03, 0.06, 0.10, 0.15]
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.trailing.thresholds[0], dec!(0.01));
        assert_eq!(config.trailing.multipliers[1], dec!(1.5));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.risk.base_risk_pct, dec!(0.025));
        assert_eq!(config.simulation.agents, 3);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[risk]\nbase_risk_pct = 0.01").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.risk.base_risk_pct, dec!(0.01));
    }
}
