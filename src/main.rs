use analytics::MetricsOutcome;
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use configuration::{init_tracing, load_config, AnalyticsConfig};
use core_types::LayerId;
use report::{InMemoryLedger, LayerReport, ReportAssembler, TradeLedger};
use std::path::PathBuf;

/// The main entry point for the stratlayer analytics tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; overrides may come straight from the environment.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Report(args) => handle_report(args, &config).await,
        Commands::Layers(args) => handle_layers(args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Performance analytics for strategy layers: metrics, attribution and recommendations.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./analytics.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the analytics report for one or more layers.
    Report(ReportArgs),
    /// List the layers present in a ledger export.
    Layers(LayersArgs),
}

#[derive(Parser)]
struct ReportArgs {
    /// The JSON ledger export to read.
    #[arg(long)]
    ledger: PathBuf,

    /// Layer to report on. Repeat for several; omit to report on every layer.
    #[arg(long = "layer")]
    layers: Vec<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Parser)]
struct LayersArgs {
    /// The JSON ledger export to read.
    #[arg(long)]
    ledger: PathBuf,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_report(args: ReportArgs, config: &AnalyticsConfig) -> anyhow::Result<()> {
    let ledger = InMemoryLedger::from_path(&args.ledger)
        .await
        .with_context(|| format!("Failed to load ledger export {}", args.ledger.display()))?;
    let assembler = ReportAssembler::new(config)?;

    let layer_ids: Vec<LayerId> = if args.layers.is_empty() {
        ledger.layers().await?
    } else {
        args.layers.into_iter().map(LayerId::from).collect()
    };
    if layer_ids.is_empty() {
        anyhow::bail!("The ledger export contains no layers");
    }
    tracing::info!(layers = layer_ids.len(), ledger = %args.ledger.display(), "Building layer reports.");

    let mut reports = Vec::with_capacity(layer_ids.len());
    for (layer_id, result) in assembler.assemble_layers(&ledger, &layer_ids).await {
        let report = result.with_context(|| format!("Failed to build the report for layer '{layer_id}'"))?;
        reports.push(report);
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Table => {
            for report in &reports {
                print_report(report);
            }
        }
    }
    Ok(())
}

async fn handle_layers(args: LayersArgs) -> anyhow::Result<()> {
    let ledger = InMemoryLedger::from_path(&args.ledger)
        .await
        .with_context(|| format!("Failed to load ledger export {}", args.ledger.display()))?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Layer", "Trades", "Amps", "Skipped records"]);
    for layer_id in ledger.layers().await? {
        let snapshot = ledger.layer_snapshot(&layer_id).await?;
        table.add_row(vec![
            layer_id.to_string(),
            snapshot.trades.len().to_string(),
            snapshot.roster.len().to_string(),
            snapshot.skipped_records.to_string(),
        ]);
    }
    println!("{table}");

    if ledger.unassigned_records() > 0 {
        println!("{} trade records had no layer id and were ignored.", ledger.unassigned_records());
    }
    Ok(())
}

// ==============================================================================
// Table Output
// ==============================================================================

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn print_report(report: &LayerReport) {
    println!("\n=== Layer {} ===", report.layer_id);

    match &report.metrics {
        MetricsOutcome::Computed(m) => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
            let rows = [
                ("Total Return", pct(m.total_return)),
                ("Annualized Return", pct(m.annualized_return)),
                ("Volatility", pct(m.volatility)),
                ("Sharpe Ratio", format!("{:.2}", m.sharpe_ratio)),
                ("Sortino Ratio", format!("{:.2}", m.sortino_ratio)),
                ("Calmar Ratio", format!("{:.2}", m.calmar_ratio)),
                ("Max Drawdown", pct(m.max_drawdown)),
                (
                    "Max Drawdown Duration",
                    if m.max_drawdown_recovered {
                        format!("{} days", m.max_drawdown_duration)
                    } else {
                        format!(">= {} days (unrecovered)", m.max_drawdown_duration)
                    },
                ),
                ("Current Drawdown", pct(m.current_drawdown)),
                ("VaR 95 / 99", format!("{} / {}", pct(m.value_at_risk_95), pct(m.value_at_risk_99))),
                ("CVaR 95 / 99", format!("{} / {}", pct(m.conditional_var_95), pct(m.conditional_var_99))),
                ("Total Trades", m.trades.total_trades.to_string()),
                ("Win Rate", pct(m.trades.win_rate)),
                ("Net PnL", m.trades.net_pnl.round_dp(2).to_string()),
                ("Profit Factor", m.trades.profit_factor.to_string()),
                ("Longest Win / Loss Streak", format!("{} / {}", m.trades.longest_win_streak, m.trades.longest_loss_streak)),
            ];
            for (name, value) in rows {
                table.add_row(vec![name.to_string(), value]);
            }
            println!("{table}");
        }
        MetricsOutcome::InsufficientData(data) => {
            println!(
                "Not enough data for layer metrics ({:?}: {} trades, {} daily points, {} required).",
                data.reason, data.trades.total_trades, data.daily_points, data.required
            );
        }
    }

    if !report.attribution.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Amp", "Trades", "Win Rate", "Net PnL", "Execution", "Contribution"]);
        for amp in &report.attribution {
            table.add_row(vec![
                amp.amp_name.clone(),
                amp.trades_executed.to_string(),
                pct(amp.win_rate),
                amp.total_pnl.round_dp(2).to_string(),
                amp.execution_rate.map(pct).unwrap_or_else(|| "n/a".to_string()),
                format!("{:.1}", amp.contribution_score),
            ]);
        }
        println!("{table}");
    }

    println!(
        "Diversification score: {:.0} (average correlation {})",
        report.correlation.diversification_score,
        report
            .correlation
            .average_correlation
            .map(|a| format!("{a:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    );

    if !report.recommendations.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Impact", "Type", "Recommendation"]);
        for rec in &report.recommendations {
            let mut text = format!("{}\n{}", rec.title, rec.description);
            for item in &rec.action_items {
                text.push_str(&format!("\n  - {item}"));
            }
            table.add_row(vec![format!("{:?}", rec.impact), format!("{:?}", rec.kind), text]);
        }
        println!("{table}");
    }

    let d = &report.diagnostics;
    if d.skipped_records > 0 || d.skipped_equity_points > 0 || !d.amps_without_equity.is_empty() {
        println!(
            "Skipped {} malformed trade records and {} equity points; {} amps had no equity series.",
            d.skipped_records,
            d.skipped_equity_points,
            d.amps_without_equity.len()
        );
    }
}
