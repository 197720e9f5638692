//! HIV Dynamics Simulator CLI
//!
//! Serve the simulator over HTTP, or run a single simulation locally.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hiv_core::{
    simulate_checked, ScenarioId, SimError, SimExport, SimulationLimits, SimulationParams,
};
use hiv_server::{CorsPolicy, ServerConfig, DEFAULT_PORT};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// HIV infection dynamics under therapy
#[derive(Parser, Debug)]
#[command(name = "hiv-sim")]
#[command(about = "Discrete-time HIV dynamics simulator", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /simulate over HTTP
    Serve(ServeArgs),

    /// Run one simulation and report the outcome
    Run(RunArgs),

    /// List the built-in scenarios
    Scenarios,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// IP address to bind
    #[arg(long, env = "HIV_SIM_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "HIV_SIM_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Largest t_max a request may ask for
    #[arg(long, env = "HIV_SIM_MAX_STEPS", default_value_t = SimulationLimits::default().max_steps)]
    max_steps: u32,

    /// Allowed CORS origin (repeatable; default: any)
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,

    /// Do not allow credentialed cross-origin requests
    #[arg(long)]
    no_credentials: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Preset to start from (baseline, no_therapy, early_therapy, aggressive, late_therapy)
    #[arg(short = 'S', long, default_value = "baseline")]
    scenario: String,

    /// Number of steps
    #[arg(long)]
    t_max: Option<u32>,

    /// Step at which therapy switches on
    #[arg(long, allow_hyphen_values = true)]
    therapy_start: Option<i64>,

    /// Kill rate while therapy is active
    #[arg(long, allow_hyphen_values = true)]
    release_rate: Option<f64>,

    /// Payload label
    #[arg(long)]
    payload_type: Option<String>,

    /// Print the full run as JSON
    #[arg(long)]
    json: bool,

    /// Write the full run to a JSON file
    #[arg(long)]
    export: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Run(args) => run(args),
        Command::Scenarios => {
            for id in ScenarioId::all() {
                println!("{:<15} {}", id.name(), id.description());
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;
    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let cors = CorsPolicy::permissive()
        .with_origins(&args.cors_origins)?
        .with_credentials(!args.no_credentials);

    let config = ServerConfig::bind(&args.host, args.port)?
        .with_max_steps(args.max_steps)
        .with_cors(cors);

    info!("HIV Dynamics Simulator v{}", env!("CARGO_PKG_VERSION"));
    hiv_server::serve(config).await?;
    Ok(())
}

/// Starts from the chosen preset and applies any explicit overrides.
fn resolve_params(args: &RunArgs) -> Result<(ScenarioId, SimulationParams), SimError> {
    let scenario: ScenarioId = args.scenario.parse()?;

    let mut params = scenario.params();
    if let Some(t_max) = args.t_max {
        params.t_max = t_max;
    }
    if let Some(therapy_start) = args.therapy_start {
        params.therapy_start = therapy_start;
    }
    if let Some(release_rate) = args.release_rate {
        params.release_rate = release_rate;
    }
    if let Some(payload_type) = &args.payload_type {
        params.payload_type = payload_type.clone();
    }

    params.validate(&SimulationLimits::default())?;
    Ok((scenario, params))
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let (scenario, params) = resolve_params(&args)?;
    for note in params.warnings() {
        warn!("{note}");
    }

    let result = simulate_checked(&params)?;
    let export = SimExport::new(params, result).with_scenario(scenario.name());

    if let Some(path) = &args.export {
        export
            .write_to_file(path)
            .with_context(|| format!("failed to write export to {path}"))?;
        info!("Exported {} steps to {}", export.summary.steps, path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&export)?);
        return Ok(());
    }

    let s = &export.summary;
    info!("Scenario: {} ({})", scenario.name(), scenario.description());
    info!(
        "Params: t_max={} therapy_start={} release_rate={} payload={}",
        export.params.t_max,
        export.params.therapy_start,
        export.params.release_rate,
        export.params.payload_type
    );
    match s.therapy_onset {
        Some(step) => info!("Therapy onset: step {step}"),
        None => info!("Therapy onset: never"),
    }
    if let (Some(peak), Some(step)) = (s.peak_viral_load, s.peak_viral_step) {
        info!("Peak viral load: {peak:.3e} at step {step}");
    }
    if let (Some(t), Some(v), Some(l)) = (s.final_t, s.final_v, s.final_l) {
        info!("Final: T={t:.2} V={v:.3e} L={l:.2}");
    }
    info!("Reservoir reduction: {:.1}%", s.reservoir_reduction * 100.0);
    if s.viral_suppressed {
        info!("✓ Viral load suppressed after onset");
    } else {
        info!("✗ Viral load not suppressed");
    }

    Ok(())
}
