// Replacement-level estimation.
//
// The replacement rate for a position is the per-game scoring of a player the
// league treats as freely available. It is read from the salary market when
// enough players are rostered, and from a fixed depth chart rank otherwise.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::ValuationConfig;
use crate::player::{PlayerRecord, Position};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a position's replacement rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementMethod {
    /// Median rate of the cheapest rostered tier.
    SalaryImplied,
    /// Rate of the player at the configured depth rank.
    FixedRank,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplacementLevel {
    pub ppg: f64,
    /// Bottom-tier size for salary-implied levels; the configured rank for
    /// fixed-rank levels.
    pub sample_size: usize,
    pub method: ReplacementMethod,
}

pub type ReplacementLevels = BTreeMap<Position, ReplacementLevel>;

// ---------------------------------------------------------------------------
// Percentile helper
// ---------------------------------------------------------------------------

/// Linear-interpolated percentile of an ascending slice. `p` is in [0, 1].
/// An empty slice yields 0.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            if lo == hi {
                sorted[lo]
            } else {
                let frac = rank - lo as f64;
                sorted[lo] + (sorted[hi] - sorted[lo]) * frac
            }
        }
    }
}

fn sorted_ascending(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// Estimate a replacement level for every position that has a configured
/// replacement rank.
///
/// Algorithm, per position:
/// 1. Collect rostered, non-prospect players from the qualifying pool.
/// 2. If there are at least `min_salary_sample` of them, find the price at
///    `salary_percentile` and take every player priced at or below it.
/// 3. If that bottom tier also has `min_salary_sample` players, the
///    replacement rate is its median ppg.
/// 4. Otherwise rank all non-prospects by total points and read the ppg at
///    the configured rank (or the last player when the position is shallower).
pub fn estimate_replacement_levels(
    qualified: &[&PlayerRecord],
    valuation: &ValuationConfig,
) -> ReplacementLevels {
    let mut levels = ReplacementLevels::new();

    for (pos, rank) in valuation.replacement_ranks() {
        if valuation.is_excluded(pos) {
            continue;
        }

        let veterans: Vec<&PlayerRecord> = qualified
            .iter()
            .copied()
            .filter(|p| p.position == pos && !p.is_prospect)
            .collect();

        let level = salary_implied_level(&veterans, valuation)
            .unwrap_or_else(|| fixed_rank_level(&veterans, rank));

        debug!(
            position = %pos,
            method = ?level.method,
            ppg = level.ppg,
            sample = level.sample_size,
            "replacement level"
        );
        levels.insert(pos, level);
    }

    levels
}

fn salary_implied_level(
    veterans: &[&PlayerRecord],
    valuation: &ValuationConfig,
) -> Option<ReplacementLevel> {
    let rostered: Vec<&PlayerRecord> = veterans
        .iter()
        .copied()
        .filter(|p| p.is_rostered())
        .collect();
    if rostered.len() < valuation.min_salary_sample {
        return None;
    }

    let prices = sorted_ascending(rostered.iter().map(|p| p.price as f64).collect());
    let threshold = percentile(&prices, valuation.salary_percentile);

    let bottom_tier: Vec<f64> = rostered
        .iter()
        .filter(|p| p.price as f64 <= threshold)
        .map(|p| p.ppg)
        .collect();
    if bottom_tier.len() < valuation.min_salary_sample {
        return None;
    }

    let sample_size = bottom_tier.len();
    let rates = sorted_ascending(bottom_tier);
    Some(ReplacementLevel {
        ppg: percentile(&rates, 0.5),
        sample_size,
        method: ReplacementMethod::SalaryImplied,
    })
}

fn fixed_rank_level(veterans: &[&PlayerRecord], rank: usize) -> ReplacementLevel {
    let mut ranked: Vec<&PlayerRecord> = veterans.to_vec();
    ranked.sort_by(|a, b| {
        b.total_points
            .partial_cmp(&a.total_points)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let idx = rank.saturating_sub(1);
    let ppg = ranked
        .get(idx)
        .or_else(|| ranked.last())
        .map(|p| p.ppg)
        .unwrap_or(0.0);

    ReplacementLevel {
        ppg,
        sample_size: rank,
        method: ReplacementMethod::FixedRank,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
