// Read-outs over a finished simulation.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::arbitration::simulation::SimulationAggregate;
use crate::config::SimulationConfig;

/// How much arbitration money a team's roster is expected to absorb.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamExposure {
    pub team: String,
    pub players: usize,
    pub total_expected_arb: f64,
    pub avg_expected_arb: f64,
}

/// Per-team totals of expected raises, most exposed team first.
pub fn team_exposure(results: &[SimulationAggregate]) -> Vec<TeamExposure> {
    let mut by_team: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for r in results {
        let entry = by_team.entry(r.owner()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += r.mean_arb;
    }

    let mut exposure: Vec<TeamExposure> = by_team
        .into_iter()
        .map(|(team, (players, total))| TeamExposure {
            team: team.to_string(),
            players,
            total_expected_arb: total,
            avg_expected_arb: total / players as f64,
        })
        .collect();
    exposure.sort_by(|a, b| {
        b.total_expected_arb
            .partial_cmp(&a.total_expected_arb)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    exposure
}

/// Opponent players holding real surplus that the league is not expected to
/// raise much: cheap arbitration targets for `my_team`.
pub fn vulnerable_targets<'a>(
    results: &'a [SimulationAggregate],
    my_team: &str,
    sim: &SimulationConfig,
) -> Vec<&'a SimulationAggregate> {
    let mut vulnerable: Vec<&SimulationAggregate> = results
        .iter()
        .filter(|r| r.owner() != my_team)
        .filter(|r| {
            r.player.surplus > sim.vulnerable_min_surplus
                && r.mean_arb < sim.vulnerable_max_mean_arb
        })
        .collect();
    vulnerable.sort_by(|a, b| b.player.surplus.cmp(&a.player.surplus));
    vulnerable
}

/// Players whose expected salary after arbitration exceeds their value,
/// most underwater first.
pub fn cut_candidates(results: &[SimulationAggregate]) -> Vec<&SimulationAggregate> {
    let mut cuts: Vec<&SimulationAggregate> = results
        .iter()
        .filter(|r| r.surplus_after_arb < 0.0)
        .collect();
    cuts.sort_by(|a, b| {
        a.surplus_after_arb
            .partial_cmp(&b.surplus_after_arb)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    cuts
}
