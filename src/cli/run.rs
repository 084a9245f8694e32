//! Run command: multi-agent paper simulation
//!
//! One tokio task per agent, each owning its trailing stop engine and
//! feeding close events to the shared governor task. Ticks come from a
//! seeded synthetic random walk so runs are reproducible.

use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::Config;
use crate::engine::{EntryRequest, RiskEngine};
use crate::execution::{ExecutionClient, PaperExecution};
use crate::feed::{PriceFeed, PriceTick, ReplayFeed};
use crate::governor::{spawn_governor, GovernorHandle, RiskGovernor};
use crate::position::Direction;
use crate::regime::{RegimeProvider, StaticRegime, TrendState, VolatilityState};
use crate::stops::TrailingStopEngine;
use crate::telemetry::{set_gauge, GaugeMetric};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the number of simulated agents
    #[arg(long)]
    pub agents: Option<usize>,

    /// Override the number of ticks per agent
    #[arg(long)]
    pub ticks: Option<usize>,
}

/// Seeded xorshift64 walk; deterministic so simulations are reproducible
struct Walk {
    state: u64,
}

impl Walk {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next_step(&mut self) -> Decimal {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        // Step in [-50, 49]
        Decimal::from((self.state % 100) as i64) - dec!(50)
    }
}

fn synthetic_ticks(seed: u64, count: usize) -> Vec<PriceTick> {
    let mut walk = Walk::new(seed);
    let mut price = dec!(50000);
    let start = Utc::now();

    (0..count)
        .map(|i| {
            price += walk.next_step();
            PriceTick {
                symbol: "BTCUSDT".to_string(),
                price,
                // Drop ATR occasionally to exercise the retain-stop path
                atr: if i % 37 == 36 { None } else { Some(price * dec!(0.01)) },
                timestamp: start + Duration::seconds(i as i64),
            }
        })
        .collect()
}

async fn agent_loop(
    agent_id: String,
    direction: Direction,
    config: Config,
    governor: GovernorHandle,
    execution: Arc<PaperExecution>,
    ticks: Vec<PriceTick>,
) -> anyhow::Result<()> {
    let engine = RiskEngine::new(&config);
    let mut trailing = TrailingStopEngine::new(config.trailing.clone());
    let regime = StaticRegime::new(TrendState::Ranging, VolatilityState::Normal);

    let feed = ReplayFeed::new(ticks);
    let mut rx = feed.subscribe().await?;
    let mut open_id = None;

    while let Some(tick) = rx.recv().await {
        match open_id {
            None => {
                if governor.is_paused(&agent_id).await? {
                    continue;
                }

                let snapshot = governor.snapshot().await?;
                let agent = match snapshot.agents.get(&agent_id) {
                    Some(agent) => agent,
                    None => continue,
                };

                let request = EntryRequest {
                    agent_id: agent_id.clone(),
                    symbol: tick.symbol.clone(),
                    direction,
                    entry_price: tick.price,
                    atr: tick.atr.unwrap_or(Decimal::ZERO),
                    confidence: dec!(60),
                    win_rate: agent.win_rate(),
                    balance: agent.balance,
                    regime: regime.get_regime(&tick.symbol),
                };

                match engine.size_and_stop(&request) {
                    Ok(plan) => {
                        let position = engine.open_position(&request, &plan);
                        let id = position.id;
                        execution
                            .open_order(id, direction, plan.size_units, plan.stop_price)
                            .await?;
                        trailing.track(position);
                        open_id = Some(id);
                    }
                    Err(e) => {
                        // Downgrade to hold and wait for the next tick
                        tracing::debug!(agent_id = %agent_id, error = %e, "Entry skipped");
                    }
                }
            }
            Some(id) => {
                let update = match trailing.update(id, &tick) {
                    Ok(update) => update,
                    Err(e) => {
                        tracing::debug!(agent_id = %agent_id, error = %e, "Tick dropped");
                        continue;
                    }
                };

                if update.should_exit {
                    let trade = trailing.close(id, tick.price, tick.timestamp)?;
                    execution.close_order(id, tick.price).await?;
                    governor.record_close(trade).await?;
                    governor.check_limits().await?;
                    open_id = None;
                }
            }
        }

        set_gauge(GaugeMetric::OpenPositions, trailing.open_count() as f64);
    }

    Ok(())
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let sim = &config.simulation;
        let agent_count = self.agents.unwrap_or(sim.agents);
        let tick_count = self.ticks.unwrap_or(sim.ticks);

        tracing::info!(agents = agent_count, ticks = tick_count, "Starting simulation");

        let mut governor =
            RiskGovernor::new(config.limits.clone(), config.rebalance.clone());
        let agent_ids: Vec<String> = (0..agent_count).map(|i| format!("agent-{}", i)).collect();
        for id in &agent_ids {
            governor.register_agent(id.clone(), sim.initial_balance);
        }
        let governor = spawn_governor(governor);
        let execution = Arc::new(PaperExecution::new());

        let mut tasks = Vec::new();
        for (i, agent_id) in agent_ids.iter().enumerate() {
            let direction = if i % 2 == 0 {
                Direction::Long
            } else {
                Direction::Short
            };
            let ticks = synthetic_ticks(sim.seed.wrapping_add(i as u64), tick_count);

            tasks.push(tokio::spawn(agent_loop(
                agent_id.clone(),
                direction,
                config.clone(),
                governor.clone(),
                Arc::clone(&execution),
                ticks,
            )));
        }

        for task in tasks {
            task.await??;
        }

        let decisions = governor.check_limits().await?;
        let weights = governor.rebalance().await?;
        let snapshot = governor.snapshot().await?;

        println!("Simulation complete");
        println!("  Portfolio value: {}", snapshot.value());
        println!("  Orders recorded: {}", execution.instructions().await.len());
        for id in &agent_ids {
            let agent = &snapshot.agents[id];
            let decision = &decisions[id];
            println!(
                "  {}: balance={} trades={} paused={} weight={}",
                id,
                agent.balance,
                agent.trade_history.len(),
                decision.paused,
                weights.get(id).copied().unwrap_or_default(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_ticks_deterministic() {
        let a = synthetic_ticks(7, 50);
        let b = synthetic_ticks(7, 50);
        assert_eq!(a.len(), 50);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.price, y.price);
        }
    }

    #[test]
    fn test_synthetic_ticks_timestamps_increase() {
        let ticks = synthetic_ticks(7, 50);
        for pair in ticks.windows(2) {
            assert!(pair[1].timestamp > pair[0].timestamp);
        }
    }

    #[tokio::test]
    async fn test_simulation_smoke() {
        let args = RunArgs {
            agents: Some(2),
            ticks: Some(100),
        };
        let config = Config::default();
        args.execute(&config).await.unwrap();
    }
}
