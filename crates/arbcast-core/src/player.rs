// Player-season records and the closed position set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner value the league uses for unrostered players.
pub const FREE_AGENT: &str = "FA";

/// Fantasy football positions carried by the league.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Quarterback,
    #[serde(rename = "RB")]
    RunningBack,
    #[serde(rename = "WR")]
    WideReceiver,
    #[serde(rename = "TE")]
    TightEnd,
    #[serde(rename = "K")]
    Kicker,
}

impl Position {
    /// All positions in display order.
    pub const ALL: [Position; 5] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::Kicker,
    ];

    /// Parse a position abbreviation ("QB", "rb", "PK", ...).
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" | "PK" => Some(Position::Kicker),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// One player-season observation from the league snapshot.
///
/// Records are inputs only: every analysis clones what it needs into its own
/// derived rows and never writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: String,
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub nfl_team: String,
    /// Fantasy team that rosters the player. `None`, `""` and `"FA"` all mean
    /// the player is a free agent; use [`PlayerRecord::owner`] to read it.
    #[serde(rename = "team_name", default)]
    pub owner: Option<String>,
    /// Current salary in whole cap dollars (0 for free agents).
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub snaps: u32,
    #[serde(default)]
    pub total_points: f64,
    /// Points per game. For prospects this is the pre-supplied projection.
    #[serde(default)]
    pub ppg: f64,
    /// Not-yet-debuted prospect (as opposed to a veteran who missed the season).
    #[serde(default)]
    pub is_prospect: bool,
}

impl PlayerRecord {
    /// The rostering team, or `None` when the player is a free agent.
    pub fn owner(&self) -> Option<&str> {
        normalize_owner(self.owner.as_deref())
    }

    pub fn is_rostered(&self) -> bool {
        self.owner().is_some()
    }

    /// Whether the player sits on `team`'s roster.
    pub fn is_owned_by(&self, team: &str) -> bool {
        self.owner() == Some(team)
    }

    /// A prospect participates only when it carries a usable projected rate.
    pub fn has_projection(&self) -> bool {
        self.is_prospect && self.ppg.is_finite() && self.ppg > 0.0
    }
}

/// Collapse the three spellings of "unrostered" into `None`.
pub fn normalize_owner(owner: Option<&str>) -> Option<&str> {
    match owner.map(str::trim) {
        None | Some("") | Some(FREE_AGENT) => None,
        Some(team) => Some(team),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
