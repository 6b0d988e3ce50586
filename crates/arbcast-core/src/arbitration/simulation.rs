// Monte Carlo arbitration simulation.
//
// Every team in the league spends its arbitration budget at once, each from
// its own noisy view of player values. Repeating that many times gives an
// expected raise, and its spread, for every player that draws attention.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::arbitration::rng::SeededRandom;
use crate::config::{ArbitrationConfig, Config, SimulationConfig};
use crate::valuation::{round1, round2};
use crate::valuation::surplus::PricedPlayer;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Run count and valuation noise for one simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub runs: usize,
    /// Lognormal sigma for each team's private valuations.
    pub variation: f64,
}

impl SimulationParams {
    pub fn from_config(sim: &SimulationConfig) -> Self {
        Self {
            runs: sim.runs,
            variation: sim.value_variation,
        }
    }
}

/// Expected arbitration outcome for one rostered player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationAggregate {
    #[serde(flatten)]
    pub player: PricedPlayer,
    pub mean_arb: f64,
    pub std_arb: f64,
    pub min_arb: f64,
    pub max_arb: f64,
    /// Share of the player's raised runs in which the total reached the
    /// protected threshold.
    pub pct_protected: f64,
    pub salary_after_arb: f64,
    pub surplus_after_arb: f64,
}

impl SimulationAggregate {
    pub fn owner(&self) -> &str {
        self.player.record().owner().unwrap_or_default()
    }
}

/// One team's private view of a player.
#[derive(Debug, Clone, Copy)]
struct TeamValue {
    value: f64,
    surplus: f64,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Simulate league-wide arbitration spending over `params.runs` runs.
///
/// Players at excluded positions are ignored. Teams are the distinct owners
/// among the remaining players. Output is sorted by mean raise, highest first;
/// ties keep (team, player id) order.
pub fn simulate_arbitration(
    priced: &[PricedPlayer],
    config: &Config,
    params: SimulationParams,
) -> Vec<SimulationAggregate> {
    let players: Vec<&PricedPlayer> = priced
        .iter()
        .filter(|p| !config.valuation.is_excluded(p.record().position))
        .collect();
    let teams: Vec<&str> = players
        .iter()
        .filter_map(|p| p.record().owner())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if players.is_empty() || teams.is_empty() || params.runs == 0 {
        debug!("nothing to simulate");
        return Vec::new();
    }

    debug!(
        runs = params.runs,
        variation = params.variation,
        teams = teams.len(),
        players = players.len(),
        "running arbitration simulation"
    );

    let league_max = config.arbitration.max_per_player_league as f64;

    // Capped totals from the runs in which a player was allocated to,
    // indexed by position in `players`.
    let mut series: BTreeMap<usize, Vec<f64>> = BTreeMap::new();

    for run in 0..params.runs {
        let mut run_totals: BTreeMap<usize, f64> = BTreeMap::new();

        for &team in &teams {
            let values = team_valuations(&players, run, team, params.variation);
            let allocations = allocate_team_budget(
                team,
                &players,
                &values,
                &teams,
                &config.arbitration,
                &config.simulation,
            );
            for (idx, amount) in allocations {
                *run_totals.entry(idx).or_insert(0.0) += amount;
            }
        }

        for (idx, total) in run_totals {
            series.entry(idx).or_default().push(total.min(league_max));
        }
    }

    let protected_at = config.simulation.protected_threshold * league_max;

    // Keyed by (team, player id) so ties in the final sort are stable.
    let keyed: BTreeMap<(&str, &str), SimulationAggregate> = series
        .into_iter()
        .map(|(idx, amounts)| {
            let player = players[idx];
            let record = player.record();
            let key = (
                record.owner().unwrap_or_default(),
                record.player_id.as_str(),
            );
            (key, aggregate(player, &amounts, protected_at))
        })
        .collect();

    let mut results: Vec<SimulationAggregate> = keyed.into_values().collect();
    results.sort_by(|a, b| {
        b.mean_arb
            .partial_cmp(&a.mean_arb)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(players = results.len(), "simulation complete");
    results
}

/// Each team's noisy view of every player, drawn in input order.
fn team_valuations(
    players: &[&PricedPlayer],
    run: usize,
    team: &str,
    variation: f64,
) -> Vec<TeamValue> {
    let mut rng = SeededRandom::for_team(run, team);
    players
        .iter()
        .map(|p| {
            let multiplier = rng.lognormal(variation);
            let value = (p.dollar_value as f64 * multiplier).max(0.0).round();
            TeamValue {
                value,
                surplus: value - p.record().price as f64,
            }
        })
        .collect()
}

/// One team's greedy spend against its opponents for a single run.
///
/// Candidates are opponent players this team values above $1 with positive
/// surplus, best surplus first. Each pick spends at most a fixed fraction of
/// what is left, so money spreads across several players. Opponents that end
/// below the per-team minimum are topped up on their best candidate.
///
/// Returns (player index, amount) pairs.
fn allocate_team_budget(
    team: &str,
    players: &[&PricedPlayer],
    values: &[TeamValue],
    teams: &[&str],
    arb: &ArbitrationConfig,
    sim: &SimulationConfig,
) -> BTreeMap<usize, f64> {
    let opponents: Vec<&str> = teams.iter().copied().filter(|t| *t != team).collect();
    let min_per_team = arb.min_per_team as f64;
    let max_per_team = arb.max_per_team as f64;
    let mut remaining = arb.budget_per_team as f64 - opponents.len() as f64 * min_per_team;

    let mut candidates: Vec<usize> = (0..players.len())
        .filter(|&i| {
            players[i]
                .record()
                .owner()
                .is_some_and(|owner| owner != team)
                && values[i].value > 1.0
                && values[i].surplus > 0.0
        })
        .collect();
    candidates.sort_by(|&a, &b| {
        values[b]
            .surplus
            .partial_cmp(&values[a].surplus)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(sim.candidate_limit);

    let mut allocations: BTreeMap<usize, f64> = BTreeMap::new();
    let mut given: HashMap<&str, f64> = HashMap::new();

    for &idx in &candidates {
        if remaining <= 0.0 {
            break;
        }
        let owner = players[idx].record().owner().unwrap_or_default();
        let room = max_per_team - given.get(owner).copied().unwrap_or(0.0);
        if room < sim.min_meaningful_amount {
            continue;
        }
        let amount = (arb.max_per_player_per_team as f64)
            .min(room)
            .min(remaining / sim.pacing_divisor);
        if amount >= sim.min_meaningful_amount {
            *allocations.entry(idx).or_insert(0.0) += amount;
            *given.entry(owner).or_insert(0.0) += amount;
            remaining -= amount;
        }
    }

    for &opponent in &opponents {
        let current = given.get(opponent).copied().unwrap_or(0.0);
        if current >= min_per_team {
            continue;
        }
        let best = candidates
            .iter()
            .copied()
            .find(|&i| players[i].record().is_owned_by(opponent));
        if let Some(idx) = best {
            *allocations.entry(idx).or_insert(0.0) += min_per_team - current;
            given.insert(opponent, min_per_team);
        }
    }

    allocations
}

/// Summary statistics over one player's per-run totals. Runs in which
/// nobody raised the player are not part of `amounts`.
fn aggregate(player: &PricedPlayer, amounts: &[f64], protected_at: f64) -> SimulationAggregate {
    let n = amounts.len() as f64;
    let mean = amounts.iter().sum::<f64>() / n;
    let variance = amounts.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let min = amounts.iter().copied().fold(f64::INFINITY, f64::min);
    let max = amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let protected = amounts.iter().filter(|&&x| x >= protected_at).count() as f64 / n;

    let salary_after_arb = player.record().price as f64 + mean;
    let surplus_after_arb = player.dollar_value as f64 - salary_after_arb;

    SimulationAggregate {
        player: player.clone(),
        mean_arb: round1(mean),
        std_arb: round1(variance.sqrt()),
        min_arb: round1(min),
        max_arb: round1(max),
        pct_protected: round2(protected),
        salary_after_arb: round1(salary_after_arb),
        surplus_after_arb: round1(surplus_after_arb),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
