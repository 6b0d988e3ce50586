// Configuration loading and parsing (league.toml, analysis.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::player::Position;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub valuation: ValuationConfig,
    pub keepers: KeeperThresholds,
    pub arbitration: ArbitrationConfig,
    pub simulation: SimulationConfig,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub season: u16,
    /// The analyzing team. Arbitration targets and keeper calls are made
    /// from this team's point of view.
    pub my_team: String,
    pub num_teams: usize,
    pub cap_per_team: u32,
}

impl LeagueConfig {
    /// Number of teams the analyzing team can arbitrate against.
    pub fn num_opponents(&self) -> usize {
        self.num_teams.saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// analysis.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire analysis.toml file.
#[derive(Debug, Clone, Deserialize)]
struct AnalysisFile {
    valuation: ValuationConfig,
    keepers: KeeperThresholds,
    arbitration: ArbitrationConfig,
    simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuationConfig {
    /// Minimum games played for a veteran to enter the pool.
    pub min_games: u32,
    /// Games in a full season; annualizes per-game VORP.
    pub season_games: u32,
    /// Share of the league's total cap that tracks above-replacement value.
    pub cap_allocation_fraction: f64,
    /// Rostered-salary percentile that marks the replacement tier.
    pub salary_percentile: f64,
    /// Minimum rostered players (and bottom-tier players) before the
    /// salary-implied method is trusted.
    pub min_salary_sample: usize,
    /// Positions removed from every valuation stage (e.g. "K").
    #[serde(default)]
    pub excluded_positions: Vec<String>,
    /// Fixed replacement rank per position, used when salary data is sparse.
    /// Keys are position abbreviations ("QB", "RB", ...).
    pub replacement_rank: BTreeMap<String, usize>,
}

impl ValuationConfig {
    /// Configured fixed ranks resolved to positions. Unknown keys are skipped
    /// (the loader rejects them up front).
    pub fn replacement_ranks(&self) -> Vec<(Position, usize)> {
        let mut ranks: Vec<(Position, usize)> = self
            .replacement_rank
            .iter()
            .filter_map(|(key, &rank)| Position::from_str_pos(key).map(|pos| (pos, rank)))
            .collect();
        ranks.sort_by_key(|(pos, _)| *pos);
        ranks
    }

    pub fn is_excluded(&self, position: Position) -> bool {
        self.excluded_positions
            .iter()
            .any(|key| Position::from_str_pos(key) == Some(position))
    }
}

/// Surplus cut-offs for keeper recommendations on the analyzing team.
#[derive(Debug, Clone, Deserialize)]
pub struct KeeperThresholds {
    pub strong_keep: i32,
    pub keep: i32,
    pub borderline: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArbitrationConfig {
    /// Total arbitration dollars each team must spend.
    pub budget_per_team: u32,
    /// Minimum a team must give each opponent.
    pub min_per_team: u32,
    /// Maximum a team may give any one opponent.
    pub max_per_team: u32,
    /// Maximum one team may add to a single player.
    pub max_per_player_per_team: u32,
    /// Maximum raise a single player can receive from the whole league.
    pub max_per_player_league: u32,
    /// Lowest pre-raise surplus still worth listing as a target.
    pub surplus_floor: i32,
    /// Optional upper surplus bound (the "danger zone" view).
    #[serde(default)]
    pub surplus_ceiling: Option<i32>,
    /// Candidates per opponent that feed the allocation score and display.
    pub top_targets_per_team: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub runs: usize,
    /// Lognormal sigma applied to each team's private valuations.
    pub value_variation: f64,
    /// Highest-surplus opponent players each team considers per run.
    pub candidate_limit: usize,
    /// Each pick spends at most `remaining / pacing_divisor`.
    pub pacing_divisor: f64,
    /// Allocations smaller than this are not worth making.
    pub min_meaningful_amount: f64,
    /// Share of the league-wide max that counts as "protected".
    pub protected_threshold: f64,
    /// Opponent players above this surplus with low expected raises are
    /// reported as vulnerable.
    pub vulnerable_min_surplus: i32,
    pub vulnerable_max_mean_arb: f64,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/analysis.toml`, relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- analysis.toml (required) ---
    let analysis_path = config_dir.join("analysis.toml");
    let analysis_text = read_file(&analysis_path)?;
    let analysis: AnalysisFile =
        toml::from_str(&analysis_text).map_err(|e| ConfigError::ParseError {
            path: analysis_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        valuation: analysis.valuation,
        keepers: analysis.keepers,
        arbitration: analysis.arbitration,
        simulation: analysis.simulation,
    };

    validate(&config)?;

    Ok(config)
}

/// Files read from `config/`, each seeded from `defaults/` when missing.
/// Anything else in `defaults/`, such as `.example` templates, is left alone.
pub const CONFIG_FILES: [&str; 2] = ["league.toml", "analysis.toml"];

/// Copy each missing [`CONFIG_FILES`] entry from `defaults/` into `config/`
/// and return the paths written. Existing files are never overwritten.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(copy_error(format!(
            "neither defaults/ nor config/ directory found in {}; \
             run from the project root or pass --config-dir",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| {
        copy_error(format!("cannot create {}: {e}", config_dir.display()))
    })?;

    let mut copied = Vec::new();
    for name in CONFIG_FILES {
        let source = defaults_dir.join(name);
        let target = config_dir.join(name);
        if target.exists() || !source.is_file() {
            continue;
        }
        std::fs::copy(&source, &target).map_err(|e| {
            copy_error(format!("cannot copy {} to {}: {e}", source.display(), target.display()))
        })?;
        info!(file = %target.display(), "seeded config from defaults");
        copied.push(target);
    }

    Ok(copied)
}

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Convenience wrapper: copies any missing defaults into `base_dir/config`
/// and loads the result.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

// The engine trusts its configuration, so everything it divides by or
// bounds against is checked here, once, at load time.
fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if league.num_teams < 2 {
        return Err(invalid("league.num_teams", "must be at least 2"));
    }
    if league.cap_per_team == 0 {
        return Err(invalid("league.cap_per_team", "must be greater than 0"));
    }
    if league.my_team.trim().is_empty() {
        return Err(invalid("league.my_team", "must not be empty"));
    }

    let val = &config.valuation;
    if val.season_games == 0 {
        return Err(invalid("valuation.season_games", "must be greater than 0"));
    }
    let pct = val.salary_percentile;
    if !(pct > 0.0 && pct < 1.0) {
        return Err(invalid(
            "valuation.salary_percentile",
            format!("must be strictly between 0.0 and 1.0, got {pct}"),
        ));
    }
    let frac = val.cap_allocation_fraction;
    if !(frac > 0.0 && frac <= 1.0) {
        return Err(invalid(
            "valuation.cap_allocation_fraction",
            format!("must be in (0.0, 1.0], got {frac}"),
        ));
    }
    if val.min_salary_sample == 0 {
        return Err(invalid("valuation.min_salary_sample", "must be > 0"));
    }
    for (key, &rank) in &val.replacement_rank {
        if Position::from_str_pos(key).is_none() {
            return Err(invalid(
                &format!("valuation.replacement_rank.{key}"),
                "unknown position",
            ));
        }
        if rank == 0 {
            return Err(invalid(
                &format!("valuation.replacement_rank.{key}"),
                "must be > 0",
            ));
        }
    }
    for key in &val.excluded_positions {
        if Position::from_str_pos(key).is_none() {
            return Err(invalid(
                "valuation.excluded_positions",
                format!("unknown position `{key}`"),
            ));
        }
    }

    let keepers = &config.keepers;
    if !(keepers.strong_keep >= keepers.keep && keepers.keep >= keepers.borderline) {
        return Err(invalid(
            "keepers",
            "thresholds must satisfy strong_keep >= keep >= borderline",
        ));
    }

    let arb = &config.arbitration;
    if arb.min_per_team > arb.max_per_team {
        return Err(invalid(
            "arbitration.min_per_team",
            format!(
                "must not exceed max_per_team ({} > {})",
                arb.min_per_team, arb.max_per_team
            ),
        ));
    }
    let guaranteed = league.num_opponents() as u64 * arb.min_per_team as u64;
    if guaranteed > arb.budget_per_team as u64 {
        return Err(invalid(
            "arbitration.budget_per_team",
            format!(
                "must cover the minimum to every opponent (needs {guaranteed}, got {})",
                arb.budget_per_team
            ),
        ));
    }
    if arb.max_per_player_per_team == 0 {
        return Err(invalid("arbitration.max_per_player_per_team", "must be > 0"));
    }
    if arb.max_per_player_league < arb.max_per_player_per_team {
        return Err(invalid(
            "arbitration.max_per_player_league",
            "must be at least max_per_player_per_team",
        ));
    }
    if let Some(ceiling) = arb.surplus_ceiling {
        if ceiling < arb.surplus_floor {
            return Err(invalid(
                "arbitration.surplus_ceiling",
                format!("must not be below surplus_floor ({ceiling} < {})", arb.surplus_floor),
            ));
        }
    }
    if arb.top_targets_per_team == 0 {
        return Err(invalid("arbitration.top_targets_per_team", "must be > 0"));
    }

    let sim = &config.simulation;
    if sim.runs == 0 {
        return Err(invalid("simulation.runs", "must be > 0"));
    }
    if !(sim.value_variation >= 0.0 && sim.value_variation.is_finite()) {
        return Err(invalid(
            "simulation.value_variation",
            format!("must be a finite value >= 0, got {}", sim.value_variation),
        ));
    }
    if sim.candidate_limit == 0 {
        return Err(invalid("simulation.candidate_limit", "must be > 0"));
    }
    if !(sim.pacing_divisor >= 1.0) {
        return Err(invalid(
            "simulation.pacing_divisor",
            format!("must be >= 1.0, got {}", sim.pacing_divisor),
        ));
    }
    if !(sim.protected_threshold > 0.0 && sim.protected_threshold <= 1.0) {
        return Err(invalid(
            "simulation.protected_threshold",
            format!("must be in (0.0, 1.0], got {}", sim.protected_threshold),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
