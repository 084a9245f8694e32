//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Sum of agent balances
    PortfolioValue,
    /// Portfolio drawdown from peak
    PortfolioDrawdownPct,
    /// Number of currently paused agents
    PausedAgents,
    /// Open position count across agents
    OpenPositions,
}

/// Start the Prometheus exporter on the given port
pub fn init_exporter(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
    Ok(())
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::PortfolioValue => "riskengine_portfolio_value_usd",
        GaugeMetric::PortfolioDrawdownPct => "riskengine_portfolio_drawdown_pct",
        GaugeMetric::PausedAgents => "riskengine_paused_agents",
        GaugeMetric::OpenPositions => "riskengine_open_positions",
    };

    metrics::gauge!(metric_name).set(value);
}
