use clap::Parser;
use risk_engine::cli::{Cli, Commands};
use risk_engine::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    risk_engine::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting paper simulation");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Risk: base={}%, max_position={}%",
                config.risk.base_risk_pct * rust_decimal_macros::dec!(100),
                config.risk.max_position_pct * rust_decimal_macros::dec!(100)
            );
            println!(
                "  Limits: agent={}%, portfolio={}%, daily={}%",
                config.limits.max_agent_risk * rust_decimal_macros::dec!(100),
                config.limits.max_portfolio_risk * rust_decimal_macros::dec!(100),
                config.limits.max_daily_loss * rust_decimal_macros::dec!(100)
            );
            println!(
                "  Stops: low={}x, normal={}x, high={}x ATR",
                config.stops.low_multiplier,
                config.stops.normal_multiplier,
                config.stops.high_multiplier
            );
            println!(
                "  Rebalance: max allocation={}%, every {} days",
                config.rebalance.max_agent_allocation * rust_decimal_macros::dec!(100),
                config.rebalance.period_days
            );
        }
    }

    Ok(())
}
