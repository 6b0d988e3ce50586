// League snapshot loading: players, manual adjustments, season history.

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::player::{normalize_owner, PlayerRecord, Position};
use crate::valuation::projections::{History, SeasonLine};
use crate::valuation::surplus::Adjustments;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// players.csv row. Numbers are read as f64 since exports sometimes carry
/// fractional salaries; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawPlayer {
    player_id: String,
    name: String,
    position: String,
    #[serde(default)]
    nfl_team: String,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    total_points: Option<f64>,
    #[serde(default)]
    games_played: Option<f64>,
    #[serde(default)]
    snaps: Option<f64>,
    #[serde(default)]
    ppg: Option<f64>,
    #[serde(default)]
    is_prospect: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAdjustment {
    player_id: String,
    adjustment: f64,
}

#[derive(Debug, Deserialize)]
struct RawSeason {
    player_id: String,
    season: u16,
    ppg: f64,
    games_played: f64,
    #[serde(default)]
    h1_snaps: Option<f64>,
    #[serde(default)]
    h1_games: Option<f64>,
    #[serde(default)]
    h2_snaps: Option<f64>,
    #[serde(default)]
    h2_games: Option<f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns true if all given f64 values are finite (not NaN or Infinity).
fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Non-negative whole number from a CSV float; negatives clamp to 0.
fn whole(value: f64) -> u32 {
    value.max(0.0).round() as u32
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Some(false),
        Some("true" | "t" | "1" | "yes" | "y") => Some(true),
        Some("false" | "f" | "0" | "no" | "n") => Some(false),
        Some(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayer>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };
        let name = raw.name.trim();

        let Some(position) = Position::from_str_pos(&raw.position) else {
            warn!("skipping player '{}': unknown position '{}'", name, raw.position);
            continue;
        };
        let price = raw.price.unwrap_or(0.0);
        let total_points = raw.total_points.unwrap_or(0.0);
        let games_played = raw.games_played.unwrap_or(0.0);
        let snaps = raw.snaps.unwrap_or(0.0);
        let ppg = raw.ppg.unwrap_or(0.0);
        if !all_finite(&[price, total_points, games_played, snaps, ppg]) {
            warn!("skipping player '{}': non-finite numeric value", name);
            continue;
        }
        let Some(is_prospect) = parse_flag(raw.is_prospect.as_deref()) else {
            warn!("skipping player '{}': unreadable is_prospect flag", name);
            continue;
        };

        players.push(PlayerRecord {
            player_id: raw.player_id.trim().to_string(),
            name: name.to_string(),
            position,
            nfl_team: raw.nfl_team.trim().to_string(),
            owner: normalize_owner(raw.team_name.as_deref()).map(String::from),
            price: whole(price),
            games_played: whole(games_played),
            snaps: whole(snaps),
            total_points,
            ppg,
            is_prospect,
        });
    }
    Ok(players)
}

fn load_adjustments_from_reader<R: Read>(rdr: R) -> Result<Adjustments, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut map = Adjustments::new();
    for result in reader.deserialize::<RawAdjustment>() {
        match result {
            Ok(raw) => {
                let id = raw.player_id.trim().to_string();
                if !raw.adjustment.is_finite() {
                    warn!("skipping adjustment for '{}': non-finite value", id);
                    continue;
                }
                if map.contains_key(&id) {
                    warn!("duplicate adjustment for '{}', using latest value", id);
                }
                map.insert(id, raw.adjustment);
            }
            Err(e) => {
                warn!("skipping malformed adjustment row: {}", e);
            }
        }
    }
    Ok(map)
}

fn load_history_from_reader<R: Read>(rdr: R) -> Result<History, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut history = History::new();
    for result in reader.deserialize::<RawSeason>() {
        match result {
            Ok(raw) => {
                let id = raw.player_id.trim().to_string();
                if !all_finite(&[raw.ppg, raw.games_played]) {
                    warn!("skipping {} season for '{}': non-finite value", raw.season, id);
                    continue;
                }
                history.entry(id).or_default().push(SeasonLine {
                    season: raw.season,
                    ppg: raw.ppg,
                    games_played: whole(raw.games_played),
                    h1_snaps: raw.h1_snaps.filter(|v| v.is_finite()).map(whole),
                    h1_games: raw.h1_games.filter(|v| v.is_finite()).map(whole),
                    h2_snaps: raw.h2_snaps.filter(|v| v.is_finite()).map(whole),
                    h2_games: raw.h2_games.filter(|v| v.is_finite()).map(whole),
                });
            }
            Err(e) => {
                warn!("skipping malformed history row: {}", e);
            }
        }
    }
    for seasons in history.values_mut() {
        seasons.sort_by_key(|s| s.season);
    }
    Ok(history)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, SnapshotError> {
    std::fs::File::open(path).map_err(|e| SnapshotError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> SnapshotError + '_ {
    move |e| SnapshotError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load the player snapshot. An empty snapshot is an error: nothing
/// downstream can be computed from it.
pub fn load_players(path: &Path) -> Result<Vec<PlayerRecord>, SnapshotError> {
    let players = load_players_from_reader(open(path)?).map_err(csv_error(path))?;
    if players.is_empty() {
        return Err(SnapshotError::Validation(format!(
            "player CSV {} produced zero valid rows",
            path.display()
        )));
    }
    debug!(players = players.len(), path = %path.display(), "loaded player snapshot");
    Ok(players)
}

/// Load manual dollar adjustments. Later rows for the same player win.
pub fn load_adjustments(path: &Path) -> Result<Adjustments, SnapshotError> {
    let adjustments = load_adjustments_from_reader(open(path)?).map_err(csv_error(path))?;
    debug!(adjustments = adjustments.len(), "loaded adjustments");
    Ok(adjustments)
}

/// Load multi-season history, grouped by player and sorted by season.
pub fn load_history(path: &Path) -> Result<History, SnapshotError> {
    let history = load_history_from_reader(open(path)?).map_err(csv_error(path))?;
    debug!(players = history.len(), "loaded season history");
    Ok(history)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
