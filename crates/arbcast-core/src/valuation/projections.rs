// Forward-looking per-game rate projections from multi-season history.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::config::ValuationConfig;
use crate::player::{PlayerRecord, Position};

/// One historical season for a player. Half-season snap splits are optional;
/// they are only present where the league tracked them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonLine {
    pub season: u16,
    pub ppg: f64,
    pub games_played: u32,
    #[serde(default)]
    pub h1_snaps: Option<u32>,
    #[serde(default)]
    pub h1_games: Option<u32>,
    #[serde(default)]
    pub h2_snaps: Option<u32>,
    #[serde(default)]
    pub h2_games: Option<u32>,
}

impl SeasonLine {
    /// Missing snaps count as zero and missing or zero games as one.
    fn h1_snaps_per_game(&self) -> f64 {
        snaps_per_game(self.h1_snaps, self.h1_games)
    }

    fn h2_snaps_per_game(&self) -> f64 {
        snaps_per_game(self.h2_snaps, self.h2_games)
    }
}

fn snaps_per_game(snaps: Option<u32>, games: Option<u32>) -> f64 {
    snaps.unwrap_or(0) as f64 / games.unwrap_or(1).max(1) as f64
}

/// Season lines keyed by player id.
pub type History = HashMap<String, Vec<SeasonLine>>;

/// A way of projecting next season's points per game.
pub trait ProjectionMethod {
    fn name(&self) -> &'static str;

    /// Project from a player's history. `None` means not enough data.
    fn project_ppg(&self, history: &[SeasonLine]) -> Option<f64>;
}

// ---------------------------------------------------------------------------
// Weighted average
// ---------------------------------------------------------------------------

/// Recency-weighted average of up to three seasons, each scaled by the share
/// of a full season the player actually played.
#[derive(Debug, Clone)]
pub struct WeightedAveragePpg {
    pub season_games: u32,
}

impl WeightedAveragePpg {
    /// Most recent season first.
    pub const RECENCY_WEIGHTS: [f64; 3] = [0.50, 0.30, 0.20];

    pub fn new(season_games: u32) -> Self {
        Self { season_games }
    }
}

impl ProjectionMethod for WeightedAveragePpg {
    fn name(&self) -> &'static str {
        "weighted_average_ppg"
    }

    fn project_ppg(&self, history: &[SeasonLine]) -> Option<f64> {
        if history.is_empty() || self.season_games == 0 {
            return None;
        }

        let mut seasons: Vec<&SeasonLine> = history.iter().collect();
        seasons.sort_by(|a, b| b.season.cmp(&a.season));

        let full_season = self.season_games as f64;
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (line, recency) in seasons.iter().zip(Self::RECENCY_WEIGHTS) {
            let weight = recency * (line.games_played as f64 / full_season);
            numerator += line.ppg * weight;
            denominator += weight;
        }

        if denominator == 0.0 {
            return None;
        }
        Some(numerator / denominator)
    }
}

// ---------------------------------------------------------------------------
// Rookie trajectory
// ---------------------------------------------------------------------------

/// First-year players: scale the season rate by how usage moved from the
/// first half of the season to the second.
#[derive(Debug, Clone, Default)]
pub struct RookieTrajectoryPpg;

impl RookieTrajectoryPpg {
    pub const MIN_FACTOR: f64 = 0.75;
    pub const MAX_FACTOR: f64 = 1.50;
}

impl ProjectionMethod for RookieTrajectoryPpg {
    fn name(&self) -> &'static str {
        "rookie_trajectory"
    }

    fn project_ppg(&self, history: &[SeasonLine]) -> Option<f64> {
        let [season] = history else {
            return None;
        };
        if season.ppg == 0.0 || !season.ppg.is_finite() {
            return None;
        }

        let h1 = season.h1_snaps_per_game();
        if h1 == 0.0 {
            return Some(season.ppg);
        }
        let factor = (season.h2_snaps_per_game() / h1).clamp(Self::MIN_FACTOR, Self::MAX_FACTOR);
        Some(season.ppg * factor)
    }
}

// ---------------------------------------------------------------------------
// College prospects
// ---------------------------------------------------------------------------

/// Prospects with no professional history: the average first-year rate at
/// their position.
#[derive(Debug, Clone, Default)]
pub struct CollegeProspectPpg {
    averages: BTreeMap<Position, f64>,
}

impl CollegeProspectPpg {
    pub const NAME: &'static str = "college_prospect";

    /// Average rate of players with exactly one season of history and at
    /// least `min_games` games, per position. Excluded positions and players
    /// missing from `records` are skipped.
    pub fn from_history(
        records: &[PlayerRecord],
        history: &History,
        valuation: &ValuationConfig,
    ) -> Self {
        let positions: HashMap<&str, Position> = records
            .iter()
            .map(|r| (r.player_id.as_str(), r.position))
            .collect();

        let mut sums: BTreeMap<Position, (f64, usize)> = BTreeMap::new();
        for (player_id, lines) in history {
            let [season] = lines.as_slice() else {
                continue;
            };
            if season.games_played < valuation.min_games || !season.ppg.is_finite() {
                continue;
            }
            let Some(&position) = positions.get(player_id.as_str()) else {
                continue;
            };
            if valuation.is_excluded(position) {
                continue;
            }
            let entry = sums.entry(position).or_insert((0.0, 0));
            entry.0 += season.ppg;
            entry.1 += 1;
        }

        let averages = sums
            .into_iter()
            .map(|(position, (total, count))| (position, total / count as f64))
            .collect();
        Self { averages }
    }

    pub fn project_position(&self, position: Position) -> Option<f64> {
        self.averages.get(&position).copied()
    }
}

// ---------------------------------------------------------------------------
// Applying projections to a snapshot
// ---------------------------------------------------------------------------

/// The method used for a player's history: the rookie trajectory for a
/// single season, the weighted average otherwise.
pub fn method_for<'a>(
    lines: &[SeasonLine],
    rookie: &'a dyn ProjectionMethod,
    veteran: &'a dyn ProjectionMethod,
) -> &'a dyn ProjectionMethod {
    if lines.len() == 1 {
        rookie
    } else {
        veteran
    }
}

/// Replace each record's `ppg` with its projection.
///
/// Players with history are projected by [`method_for`]. Prospects that
/// history cannot project keep a supplied rate, or else take the college
/// average for their position. Everyone else without a usable projection is
/// dropped.
pub fn apply_projections(
    records: &[PlayerRecord],
    history: &History,
    valuation: &ValuationConfig,
) -> Vec<PlayerRecord> {
    let rookie = RookieTrajectoryPpg;
    let veteran = WeightedAveragePpg::new(valuation.season_games);
    let college = CollegeProspectPpg::from_history(records, history, valuation);

    let mut by_method: BTreeMap<&'static str, usize> = BTreeMap::new();
    let projected: Vec<PlayerRecord> = records
        .iter()
        .filter_map(|record| {
            let from_history = history.get(&record.player_id).and_then(|lines| {
                let method = method_for(lines, &rookie, &veteran);
                let ppg = method.project_ppg(lines).filter(|v| v.is_finite())?;
                Some((method.name(), ppg))
            });
            let (method, ppg) = match from_history {
                Some(found) => found,
                None if record.has_projection() => ("supplied", record.ppg),
                None if record.is_prospect => {
                    (CollegeProspectPpg::NAME, college.project_position(record.position)?)
                }
                None => return None,
            };
            *by_method.entry(method).or_insert(0) += 1;
            let mut projected = record.clone();
            projected.ppg = ppg;
            Some(projected)
        })
        .collect();

    debug!(
        ?by_method,
        dropped = records.len() - projected.len(),
        "applied projections"
    );
    projected
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
