// Valuation engine: replacement levels, VORP, dollar conversion, projections.

pub mod projections;
pub mod replacement;
pub mod surplus;
pub mod vorp;

use crate::config::ValuationConfig;
use crate::player::PlayerRecord;

/// Players that take part in valuation: veterans with enough games, plus
/// prospects that carry a projected rate. Excluded positions are dropped.
pub fn qualifying_players<'a>(
    records: &'a [PlayerRecord],
    valuation: &ValuationConfig,
) -> Vec<&'a PlayerRecord> {
    records
        .iter()
        .filter(|p| !valuation.is_excluded(p.position))
        .filter(|p| p.ppg.is_finite() && p.total_points.is_finite())
        .filter(|p| p.games_played >= valuation.min_games || p.has_projection())
        .collect()
}

// Halves round toward positive infinity, so -24.25 becomes -24.2.

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0 + 0.5).floor() / 10.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}
