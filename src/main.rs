//! EcoPackAI - packaging recommendations from the terminal
//!
//! A CLI client for the EcoPackAI service: submits a product questionnaire,
//! shows the recommended packaging materials, and tracks CO₂ reduction and
//! cost savings against a baseline across runs.
//!
//! Exit codes:
//!   0 - Success (including a run with no recommendations)
//!   1 - Runtime error (connection, config, export failure, etc.)

mod cli;
mod client;
mod config;
mod error;
mod history;
mod models;
mod report;
mod session;
mod store;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use cli::{resolve_export_format, Args, ChartKind, Command, ExportArgs, RecommendArgs, TrendMetric};
use client::{ApiClient, ClientSettings, RecommendationService};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use report::{ExportDocument, ExportFormat, HistorySummary};
use session::{Session, SessionSettings, SubmitOutcome};
use std::path::{Path, PathBuf};
use std::time::Duration;
use store::FormStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    debug!("EcoPackAI client v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .ecopack.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .ecopack.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .ecopack.toml")?;

    println!("✅ Created .ecopack.toml with default settings.");
    println!("   Edit it to set the service URL, metric baselines, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Build the session and dispatch the subcommand.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let client = ApiClient::new(ClientSettings::from(&config.server))
        .context("Failed to create HTTP client")?;
    info!(server = %client.base_url(), "Using EcoPackAI service");

    let state_dir = config.storage.effective_state_dir();
    let mut session = Session::open(
        client,
        FormStore::new(&state_dir),
        SessionSettings::from(&config),
    );

    let Some(command) = args.command.clone() else {
        bail!("A command is required (see --help)");
    };

    match command {
        Command::Recommend(rec) => run_recommend(&mut session, &rec, args.quiet).await,
        Command::History => run_history(&mut session).await,
        Command::Trends { metric } => run_trends(&mut session, metric).await,
        Command::Chart { kind } => run_chart(&mut session, kind).await,
        Command::Usage => run_usage(&session).await,
        Command::Export(export) => run_export(&mut session, &export).await,
        Command::ClearHistory => run_clear_history(&mut session).await,
        Command::ClearForm => run_clear_form(&mut session),
        Command::Health => run_health(&session).await,
    }
}

/// Submit the questionnaire and show the result.
async fn run_recommend(
    session: &mut Session<ApiClient>,
    rec: &RecommendArgs,
    quiet: bool,
) -> Result<()> {
    // Earlier runs count toward the averages.
    session.load_history().await;

    let form = rec
        .form_values()
        .or(session.restored_form().unwrap_or_default());
    let input = form.complete().map_err(|missing| {
        anyhow!(
            "Missing questionnaire fields: {} (pass them as flags; later runs reuse them)",
            missing.join(", ")
        )
    })?;

    println!("📦 Requesting recommendations...");
    for (field, value) in input.labelled_fields() {
        println!("   {}: {}", field, value);
    }

    let spinner = waiting_spinner(quiet, "Waiting for the EcoPackAI service...");
    let outcome = session.submit(input).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match outcome.context("Recommendation request failed")? {
        SubmitOutcome::NoRecommendations { message } => {
            println!("\n🔎 No recommendations found");
            if let Some(message) = message {
                println!("   {}", message);
            }
            return Ok(());
        }
        SubmitOutcome::Recommended { shown } => {
            debug!(shown, "Recommendation recorded");
        }
    }

    let display = session
        .latest()
        .map(|l| l.display.clone())
        .unwrap_or_default();

    println!("\n🏆 Recommended Materials:\n");
    print!("{}", report::results_table(&display));

    println!("\n📊 Impact:");
    print!(
        "{}",
        report::metric_cards(
            session.history().run_count(),
            session.co2_reduction(),
            session.cost_savings()
        )
    );

    if rec.chart {
        let pool = session.chart_pool();
        println!();
        print!(
            "{}",
            report::material_chart(
                "Material Comparison (avg suitability score)",
                &history::material_comparison(&pool),
                ""
            )
        );
    }

    if let Some(ref path) = rec.export {
        let format = resolve_export_format(rec.format, Some(path));
        write_export(session, path, format)?;
    }

    Ok(())
}

/// Show recorded runs and the average metrics.
async fn run_history(session: &mut Session<ApiClient>) -> Result<()> {
    require_history(session).await?;

    let history = session.history();
    println!(
        "🗂️  History: {} runs (top {} each)\n",
        history.run_count(),
        history.display_limit()
    );

    if history.is_empty() {
        println!("   No runs recorded yet.");
    }
    for (i, run) in history.runs().iter().enumerate() {
        println!("   Run {}", i + 1);
        if run.is_empty() {
            println!("     (no materials)");
        }
        for item in run {
            println!(
                "     - {} (cost {:.2}, CO₂ {:.2}, score {:.2})",
                item.material, item.predicted_cost, item.predicted_co2, item.suitability_score
            );
        }
    }

    println!("\n📊 Impact:");
    print!(
        "{}",
        report::metric_cards(history.run_count(), session.co2_reduction(), session.cost_savings())
    );
    Ok(())
}

/// Show the per-run trends.
async fn run_trends(session: &mut Session<ApiClient>, metric: TrendMetric) -> Result<()> {
    require_history(session).await?;

    let settings = session.settings().clone();
    let history = session.history();

    if matches!(metric, TrendMetric::Co2 | TrendMetric::Both) {
        print!(
            "{}",
            report::trend_chart(
                "CO₂ Reduction Trend (%)",
                &history.co2_trend(settings.baseline_co2),
                "%"
            )
        );
        println!();
    }
    if matches!(metric, TrendMetric::Cost | TrendMetric::Both) {
        print!(
            "{}",
            report::trend_chart(
                "Cost Savings Trend",
                &history.cost_trend(settings.baseline_cost),
                ""
            )
        );
    }
    Ok(())
}

/// Draw a chart over the recorded materials.
async fn run_chart(session: &mut Session<ApiClient>, kind: ChartKind) -> Result<()> {
    require_history(session).await?;

    let settings = session.settings().clone();
    let pool = session.chart_pool();

    let chart = match kind {
        ChartKind::Comparison => report::material_chart(
            "Material Comparison (avg suitability score)",
            &history::material_comparison(&pool),
            "",
        ),
        ChartKind::Ranking => report::material_chart(
            "Material Ranking (avg suitability score)",
            &history::material_ranking(&pool),
            "",
        ),
        ChartKind::Co2 => report::material_chart(
            "CO₂ Reduction by Material (%)",
            &history::material_co2_reduction(&pool, settings.baseline_co2),
            "%",
        ),
        ChartKind::Cost => report::material_chart(
            "Cost Savings by Material",
            &history::material_cost_savings(&pool, settings.baseline_cost),
            "",
        ),
    };

    print!("{}", chart);
    Ok(())
}

/// Show how often each material has been recommended.
async fn run_usage(session: &Session<ApiClient>) -> Result<()> {
    let entries = session
        .service()
        .usage()
        .await
        .context("Failed to fetch material usage")?;

    if entries.is_empty() {
        println!("📈 No material usage recorded yet.");
        return Ok(());
    }

    print!("{}", report::usage_chart(&entries));
    Ok(())
}

/// Export the latest ranking.
async fn run_export(session: &mut Session<ApiClient>, export: &ExportArgs) -> Result<()> {
    require_history(session).await?;

    let format = resolve_export_format(export.format, export.output.as_ref());
    let path = export
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format.default_file_name()));

    write_export(session, &path, format)
}

async fn run_clear_history(session: &mut Session<ApiClient>) -> Result<()> {
    if session.clear_history().await {
        println!("🧹 History cleared.");
    } else {
        warn!("Server history may still be present");
        println!("🧹 Local history cleared; the service could not be reached.");
    }
    Ok(())
}

fn run_clear_form(session: &mut Session<ApiClient>) -> Result<()> {
    session
        .clear_form()
        .context("Failed to remove saved form values")?;
    println!("🧹 Saved form values cleared.");
    Ok(())
}

async fn run_health(session: &Session<ApiClient>) -> Result<()> {
    let status = session
        .service()
        .health()
        .await
        .with_context(|| format!("EcoPackAI service at {} is unreachable", session.service().base_url()))?;
    println!("✅ {}", status);
    Ok(())
}

/// Load history for commands that only display it.
async fn require_history(session: &mut Session<ApiClient>) -> Result<()> {
    if !session.load_history().await {
        bail!(
            "Could not load history from {}",
            session.service().base_url()
        );
    }
    Ok(())
}

/// Render the latest ranking and write it to `path`.
fn write_export(session: &Session<ApiClient>, path: &Path, format: ExportFormat) -> Result<()> {
    let ranking = session.export_rows()?.to_vec();
    let settings = session.settings();

    let doc = ExportDocument {
        generated_at: Utc::now(),
        inputs: session.latest().and_then(|l| l.inputs),
        ranking,
        summary: HistorySummary {
            runs: session.history().run_count(),
            baseline_co2: settings.baseline_co2,
            baseline_cost: settings.baseline_cost,
            avg_co2_reduction_percent: session.co2_reduction(),
            avg_cost_savings: session.cost_savings(),
        },
    };

    let output = report::generate_export(&doc, format)?;
    std::fs::write(path, &output)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    info!(path = %path.display(), rows = doc.ranking.len(), "Export written");
    println!(
        "\n💾 Exported top {} to: {}",
        doc.ranking.len(),
        path.display()
    );
    Ok(())
}

/// Spinner shown while a request is in flight.
fn waiting_spinner(quiet: bool, message: &str) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    match ProgressStyle::default_spinner().template("   {spinner:.green} {msg} [{elapsed}]") {
        Ok(style) => spinner.set_style(style),
        Err(e) => debug!("Invalid spinner template: {}", e),
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .ecopack.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
