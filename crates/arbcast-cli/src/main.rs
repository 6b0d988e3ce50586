// arbcast entry point.
//
// Batch report runner:
// 1. Initialize tracing (stderr, so stdout carries only the report)
// 2. Load config, copying defaults on first run
// 3. Load the player snapshot (plus adjustments and history when given)
// 4. Run one analysis
// 5. Write the JSON report to stdout or --output

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use arbcast_core::arbitration::allocation::allocate_budget;
use arbcast_core::arbitration::insights::{cut_candidates, team_exposure, vulnerable_targets};
use arbcast_core::arbitration::simulation::{simulate_arbitration, SimulationParams};
use arbcast_core::arbitration::targets::{find_targets, TargetOrder};
use arbcast_core::config::{self, Config};
use arbcast_core::player::PlayerRecord;
use arbcast_core::snapshot;
use arbcast_core::valuation::projections::apply_projections;
use arbcast_core::valuation::surplus::{recommend_keepers, value_players, Adjustments};
use arbcast_core::valuation::vorp::compute_vorp;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Fantasy football valuation and arbitration forecasting
#[derive(Parser)]
#[command(name = "arbcast", version)]
#[command(about = "Value players over replacement and forecast arbitration spending")]
struct Cli {
    /// Directory holding config/ (and defaults/ for first-run setup)
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Player snapshot CSV
    #[arg(long)]
    players: PathBuf,

    /// Manual dollar adjustments CSV (player_id,adjustment)
    #[arg(long)]
    adjustments: Option<PathBuf>,

    /// Season history CSV; replaces ppg with a projection from past seasons
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replacement level per position
    Replacement {
        #[command(flatten)]
        snapshot: SnapshotArgs,
    },
    /// Value over replacement for every qualifying player
    Vorp {
        #[command(flatten)]
        snapshot: SnapshotArgs,
    },
    /// Dollar values and surplus, best surplus first
    Surplus {
        #[command(flatten)]
        snapshot: SnapshotArgs,
    },
    /// Keeper recommendations for my team
    Keepers {
        #[command(flatten)]
        snapshot: SnapshotArgs,
    },
    /// Opponent players worth arbitrating
    Targets {
        #[command(flatten)]
        snapshot: SnapshotArgs,

        /// value: highest surplus first; danger: closest to being cut first
        #[arg(long, value_enum, default_value_t = OrderArg::Value)]
        order: OrderArg,
    },
    /// Suggested arbitration spend per opponent
    Allocate {
        #[command(flatten)]
        snapshot: SnapshotArgs,
    },
    /// Monte Carlo forecast of league-wide arbitration
    Simulate {
        #[command(flatten)]
        snapshot: SnapshotArgs,

        /// Number of simulated arbitration rounds (default from config)
        #[arg(long)]
        runs: Option<usize>,

        /// Lognormal sigma on each team's valuations (default from config)
        #[arg(long)]
        variation: Option<f64>,

        /// Add team exposure, vulnerable targets, and cut candidates
        #[arg(long)]
        insights: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Value,
    Danger,
}

impl From<OrderArg> for TargetOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Value => TargetOrder::BestValue,
            OrderArg::Danger => TargetOrder::Danger,
        }
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Replacement { .. } => "replacement",
            Commands::Vorp { .. } => "vorp",
            Commands::Surplus { .. } => "surplus",
            Commands::Keepers { .. } => "keepers",
            Commands::Targets { .. } => "targets",
            Commands::Allocate { .. } => "allocate",
            Commands::Simulate { .. } => "simulate",
        }
    }

    fn snapshot(&self) -> &SnapshotArgs {
        match self {
            Commands::Replacement { snapshot }
            | Commands::Vorp { snapshot }
            | Commands::Surplus { snapshot }
            | Commands::Keepers { snapshot }
            | Commands::Targets { snapshot, .. }
            | Commands::Allocate { snapshot }
            | Commands::Simulate { snapshot, .. } => snapshot,
        }
    }
}

// ---------------------------------------------------------------------------
// Report envelope
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Report<'a> {
    command: &'a str,
    league: &'a str,
    season: u16,
    generated_at: String,
    rows: serde_json::Value,
}

#[derive(Serialize)]
struct SimulationReport<T: Serialize, E: Serialize, V: Serialize, C: Serialize> {
    results: T,
    team_exposure: E,
    vulnerable_targets: V,
    cut_candidates: C,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = config::load_config(&cli.config_dir).with_context(|| {
        format!(
            "failed to load configuration from {}",
            cli.config_dir.display()
        )
    })?;
    info!(
        "Config loaded: league={}, season={}, {} teams, ${} cap",
        config.league.name, config.league.season, config.league.num_teams, config.league.cap_per_team
    );

    let command = cli.command.name();
    let (players, adjustments) = load_snapshot(cli.command.snapshot(), &config)?;
    let rows = run(&cli.command, &players, adjustments.as_ref(), &config)?;

    let report = Report {
        command,
        league: &config.league.name,
        season: config.league.season,
        generated_at: chrono::Utc::now().to_rfc3339(),
        rows,
    };
    write_report(&report, cli.output.as_deref())?;

    info!("{} report complete", command);
    Ok(())
}

fn load_snapshot(
    args: &SnapshotArgs,
    config: &Config,
) -> anyhow::Result<(Vec<PlayerRecord>, Option<Adjustments>)> {
    let mut players = snapshot::load_players(&args.players)
        .with_context(|| format!("failed to load players from {}", args.players.display()))?;
    info!("Loaded {} players", players.len());

    if let Some(path) = &args.history {
        let history = snapshot::load_history(path)
            .with_context(|| format!("failed to load history from {}", path.display()))?;
        let before = players.len();
        players = apply_projections(&players, &history, &config.valuation);
        info!("Projected {} of {} players", players.len(), before);
        if players.is_empty() {
            warn!("no player had enough history to project");
        }
    }

    let adjustments = match &args.adjustments {
        Some(path) => {
            let adj = snapshot::load_adjustments(path)
                .with_context(|| format!("failed to load adjustments from {}", path.display()))?;
            info!("Loaded {} adjustments", adj.len());
            Some(adj)
        }
        None => None,
    };

    Ok((players, adjustments))
}

fn run(
    command: &Commands,
    players: &[PlayerRecord],
    adjustments: Option<&Adjustments>,
    config: &Config,
) -> anyhow::Result<serde_json::Value> {
    let rows = match command {
        Commands::Replacement { .. } => {
            serde_json::to_value(compute_vorp(players, &config.valuation).replacement)?
        }
        Commands::Vorp { .. } => {
            serde_json::to_value(compute_vorp(players, &config.valuation).players)?
        }
        Commands::Surplus { .. } => {
            let mut priced = value_players(players, config, adjustments);
            priced.sort_by(|a, b| b.surplus.cmp(&a.surplus));
            serde_json::to_value(priced)?
        }
        Commands::Keepers { .. } => {
            let priced = value_players(players, config, adjustments);
            serde_json::to_value(recommend_keepers(&priced, &config.league, &config.keepers))?
        }
        Commands::Targets { order, .. } => {
            let priced = value_players(players, config, adjustments);
            serde_json::to_value(find_targets(&priced, config, (*order).into()))?
        }
        Commands::Allocate { .. } => {
            let priced = value_players(players, config, adjustments);
            let targets = find_targets(&priced, config, TargetOrder::BestValue);
            serde_json::to_value(allocate_budget(&targets, &config.league, &config.arbitration))?
        }
        Commands::Simulate {
            runs,
            variation,
            insights,
            ..
        } => {
            let mut params = SimulationParams::from_config(&config.simulation);
            if let Some(runs) = runs {
                anyhow::ensure!(*runs > 0, "--runs must be greater than 0");
                params.runs = *runs;
            }
            if let Some(variation) = variation {
                anyhow::ensure!(
                    variation.is_finite() && *variation >= 0.0,
                    "--variation must be a finite value >= 0"
                );
                params.variation = *variation;
            }
            info!(
                "Simulating {} runs at variation {}",
                params.runs, params.variation
            );

            let priced = value_players(players, config, adjustments);
            let results = simulate_arbitration(&priced, config, params);
            if *insights {
                serde_json::to_value(SimulationReport {
                    team_exposure: team_exposure(&results),
                    vulnerable_targets: vulnerable_targets(
                        &results,
                        &config.league.my_team,
                        &config.simulation,
                    ),
                    cut_candidates: cut_candidates(&results),
                    results: &results,
                })?
            } else {
                serde_json::to_value(&results)?
            }
        }
    };
    Ok(rows)
}

fn write_report(report: &Report<'_>, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    match output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write report to stdout")?;
        }
    }
    Ok(())
}

/// Initialize tracing to stderr. stdout is reserved for the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("arbcast=info,arbcast_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
