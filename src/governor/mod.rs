//! Risk governor
//!
//! Aggregates per-agent and portfolio performance into drawdown metrics and
//! pause decisions, and computes periodic capital-reallocation weights.
//! Decisions are advisory: the orchestration layer halts agents, not the
//! governor.

mod rebalance;
mod service;

pub use rebalance::{compute_weights, AgentStats};
pub use service::{spawn_governor, GovernorHandle};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{LimitsConfig, RebalanceConfig};
use crate::error::RiskError;
use crate::position::ClosedTrade;
use crate::telemetry::{set_gauge, GaugeMetric};

/// Why an agent was paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Agent drawdown from peak balance exceeded the limit
    AgentDrawdown,
    /// Portfolio drawdown from peak value exceeded the limit; all agents pause
    PortfolioDrawdown,
    /// Daily loss limit hit; pause lasts until the daily reset
    DailyLoss,
}

/// Advisory pause decision for one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PauseDecision {
    pub paused: bool,
    pub reason: Option<PauseReason>,
}

impl PauseDecision {
    fn active() -> Self {
        Self {
            paused: false,
            reason: None,
        }
    }

    fn paused(reason: PauseReason) -> Self {
        Self {
            paused: true,
            reason: Some(reason),
        }
    }
}

/// Per-agent risk accounting
#[derive(Debug, Clone, Serialize)]
pub struct AgentRiskState {
    pub agent_id: String,
    pub balance: Decimal,
    pub peak_balance: Decimal,
    pub daily_start_balance: Decimal,
    /// Append-only closed trade history
    pub trade_history: Vec<ClosedTrade>,
    pub paused: bool,
    pub pause_reason: Option<PauseReason>,
}

impl AgentRiskState {
    /// New agent state with its starting balance
    pub fn new(agent_id: impl Into<String>, balance: Decimal) -> Self {
        Self {
            agent_id: agent_id.into(),
            balance,
            peak_balance: balance,
            daily_start_balance: balance,
            trade_history: Vec::new(),
            paused: false,
            pause_reason: None,
        }
    }

    /// Apply a closed trade: append history, move balance, track the peak
    pub fn record_close(&mut self, trade: ClosedTrade) {
        self.balance += trade.realized_pnl;
        if self.balance > self.peak_balance {
            self.peak_balance = self.balance;
        }
        self.trade_history.push(trade);
    }

    /// Drawdown from peak balance; `None` when the peak is unusable
    pub fn drawdown(&self) -> Option<Decimal> {
        if self.peak_balance <= Decimal::ZERO {
            return None;
        }
        Some((self.peak_balance - self.balance) / self.peak_balance)
    }

    /// Loss since the daily baseline; `None` when the baseline is unusable
    pub fn daily_loss(&self) -> Option<Decimal> {
        if self.daily_start_balance <= Decimal::ZERO {
            return None;
        }
        Some((self.daily_start_balance - self.balance) / self.daily_start_balance)
    }

    /// Fraction of closed trades with positive P&L
    pub fn win_rate(&self) -> Decimal {
        if self.trade_history.is_empty() {
            return Decimal::ZERO;
        }
        let wins = self
            .trade_history
            .iter()
            .filter(|t| t.realized_pnl > Decimal::ZERO)
            .count();
        Decimal::from(wins) / Decimal::from(self.trade_history.len())
    }

    /// Average winning trade P&L
    pub fn avg_win(&self) -> Decimal {
        let wins: Vec<Decimal> = self
            .trade_history
            .iter()
            .filter(|t| t.realized_pnl > Decimal::ZERO)
            .map(|t| t.realized_pnl)
            .collect();
        if wins.is_empty() {
            return Decimal::ZERO;
        }
        wins.iter().sum::<Decimal>() / Decimal::from(wins.len())
    }

    /// Average losing trade magnitude (positive number)
    pub fn avg_loss(&self) -> Decimal {
        let losses: Vec<Decimal> = self
            .trade_history
            .iter()
            .filter(|t| t.realized_pnl < Decimal::ZERO)
            .map(|t| -t.realized_pnl)
            .collect();
        if losses.is_empty() {
            return Decimal::ZERO;
        }
        losses.iter().sum::<Decimal>() / Decimal::from(losses.len())
    }

    /// Performance stats for reallocation
    pub fn stats(&self) -> AgentStats {
        AgentStats {
            win_rate: self.win_rate(),
            avg_win: self.avg_win(),
            avg_loss: self.avg_loss(),
        }
    }
}

/// Portfolio-wide state, owned by the governor
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioState {
    pub total_capital: Decimal,
    pub peak_value: Decimal,
    pub agents: HashMap<String, AgentRiskState>,
    pub last_rebalance_at: Option<DateTime<Utc>>,
}

impl PortfolioState {
    /// Sum of agent balances
    pub fn value(&self) -> Decimal {
        self.agents.values().map(|a| a.balance).sum()
    }
}

/// Drawdown tracking, pause decisions and reallocation
pub struct RiskGovernor {
    limits: LimitsConfig,
    rebalance: RebalanceConfig,
    portfolio: PortfolioState,
}

impl RiskGovernor {
    /// Create a governor with no registered agents
    pub fn new(limits: LimitsConfig, rebalance: RebalanceConfig) -> Self {
        Self {
            limits,
            rebalance,
            portfolio: PortfolioState {
                total_capital: Decimal::ZERO,
                peak_value: Decimal::ZERO,
                agents: HashMap::new(),
                last_rebalance_at: None,
            },
        }
    }

    /// Register a trading agent with its starting balance
    pub fn register_agent(&mut self, agent_id: impl Into<String>, balance: Decimal) {
        let agent_id = agent_id.into();
        self.portfolio.total_capital += balance;
        self.portfolio.peak_value += balance;
        self.portfolio
            .agents
            .insert(agent_id.clone(), AgentRiskState::new(agent_id, balance));
    }

    /// Record a closed trade against its agent
    pub fn record_close(&mut self, trade: ClosedTrade) -> Result<(), RiskError> {
        let agent = self
            .portfolio
            .agents
            .get_mut(&trade.agent_id)
            .ok_or_else(|| RiskError::UnknownAgent(trade.agent_id.clone()))?;
        agent.record_close(trade);
        Ok(())
    }

    /// Whether an agent is currently paused
    pub fn is_paused(&self, agent_id: &str) -> bool {
        self.portfolio
            .agents
            .get(agent_id)
            .map(|a| a.paused)
            .unwrap_or(true)
    }

    /// Recompute drawdowns and return the pause decision for every agent
    ///
    /// Fail-safe: an agent whose stats cannot be read is paused, never
    /// skipped. A portfolio-level breach pauses all agents.
    pub fn check_limits(&mut self) -> HashMap<String, PauseDecision> {
        let portfolio_value = self.portfolio.value();
        if portfolio_value > self.portfolio.peak_value {
            self.portfolio.peak_value = portfolio_value;
        }

        let portfolio_drawdown = if self.portfolio.peak_value > Decimal::ZERO {
            (self.portfolio.peak_value - portfolio_value) / self.portfolio.peak_value
        } else {
            Decimal::ZERO
        };
        let portfolio_breach = portfolio_drawdown > self.limits.max_portfolio_risk;

        set_gauge(
            GaugeMetric::PortfolioValue,
            portfolio_value.try_into().unwrap_or(0.0),
        );
        set_gauge(
            GaugeMetric::PortfolioDrawdownPct,
            portfolio_drawdown.try_into().unwrap_or(0.0),
        );

        let mut decisions = HashMap::new();
        let mut paused_count = 0usize;

        for agent in self.portfolio.agents.values_mut() {
            let decision = if portfolio_breach {
                PauseDecision::paused(PauseReason::PortfolioDrawdown)
            } else {
                match (agent.drawdown(), agent.daily_loss()) {
                    (Some(drawdown), Some(daily_loss)) => {
                        if drawdown > self.limits.max_agent_risk {
                            PauseDecision::paused(PauseReason::AgentDrawdown)
                        } else if daily_loss > self.limits.max_daily_loss {
                            PauseDecision::paused(PauseReason::DailyLoss)
                        } else {
                            PauseDecision::active()
                        }
                    }
                    // Unreadable stats: fail safe, not fail open
                    _ => PauseDecision::paused(PauseReason::AgentDrawdown),
                }
            };

            if decision.paused {
                paused_count += 1;
                if !agent.paused {
                    tracing::warn!(
                        agent_id = %agent.agent_id,
                        reason = ?decision.reason,
                        balance = %agent.balance,
                        "Agent paused"
                    );
                }
                agent.paused = true;
                agent.pause_reason = decision.reason;
            }

            decisions.insert(agent.agent_id.clone(), decision);
        }

        set_gauge(GaugeMetric::PausedAgents, paused_count as f64);
        decisions
    }

    /// Explicitly clear an agent's pause
    pub fn resume(&mut self, agent_id: &str) -> Result<(), RiskError> {
        let agent = self
            .portfolio
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| RiskError::UnknownAgent(agent_id.to_string()))?;
        agent.paused = false;
        agent.pause_reason = None;
        tracing::info!(%agent_id, "Agent resumed");
        Ok(())
    }

    /// Start a new trading day: reset daily baselines and clear daily-loss
    /// pauses. Drawdown pauses persist until explicitly resumed.
    pub fn reset_daily(&mut self) {
        for agent in self.portfolio.agents.values_mut() {
            agent.daily_start_balance = agent.balance;
            if agent.pause_reason == Some(PauseReason::DailyLoss) {
                agent.paused = false;
                agent.pause_reason = None;
            }
        }
    }

    /// Compute capital-reallocation weights across agents
    ///
    /// Runs on a fixed period driven by an external scheduler.
    pub fn rebalance(&mut self, now: DateTime<Utc>) -> HashMap<String, Decimal> {
        let stats: HashMap<String, AgentStats> = self
            .portfolio
            .agents
            .iter()
            .map(|(id, agent)| (id.clone(), agent.stats()))
            .collect();

        let weights = compute_weights(&stats, self.rebalance.max_agent_allocation);
        self.portfolio.last_rebalance_at = Some(now);

        tracing::info!(agents = weights.len(), "Rebalance weights computed");
        weights
    }

    /// Read-only copy of the portfolio state for dashboards
    pub fn snapshot(&self) -> PortfolioState {
        self.portfolio.clone()
    }
}
