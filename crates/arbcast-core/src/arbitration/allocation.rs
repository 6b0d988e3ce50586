// Arbitration budget allocation across opponents.
//
// Each opponent gets the league minimum, and the rest of the budget follows
// how much surplus value sits on that opponent's roster.

use serde::Serialize;
use tracing::debug;

use crate::arbitration::targets::ArbitrationCandidate;
use crate::config::{ArbitrationConfig, LeagueConfig};
use crate::player::Position;

/// The fields of a candidate shown next to a team's suggested spend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    pub player_id: String,
    pub name: String,
    pub position: Position,
    pub price: u32,
    pub dollar_value: i32,
    pub surplus: i32,
    pub surplus_after_arb: i32,
}

impl From<&ArbitrationCandidate> for TargetSummary {
    fn from(c: &ArbitrationCandidate) -> Self {
        let record = c.priced.record();
        TargetSummary {
            player_id: record.player_id.clone(),
            name: record.name.clone(),
            position: record.position,
            price: record.price,
            dollar_value: c.priced.dollar_value,
            surplus: c.priced.surplus,
            surplus_after_arb: c.surplus_after_arb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAllocation {
    pub team: String,
    pub suggested: u32,
    pub targets: Vec<TargetSummary>,
}

/// Working state for one opponent during distribution.
struct TeamShare<'a> {
    team: &'a str,
    candidates: Vec<&'a ArbitrationCandidate>,
    target: f64,
    current: u32,
}

/// Split the analyzing team's arbitration budget across opponents.
///
/// Algorithm:
/// 1. Group candidates by owner, keeping first-appearance order, and order
///    each group by surplus descending.
/// 2. Order teams by candidate count, most first.
/// 3. Score each team by the positive surplus of its top candidates.
/// 4. target = min + share * (budget - opponents * min), where share is the
///    team's fraction of the total score (an even split when all scores are 0).
/// 5. Start every team at min, then hand out $1 at a time to the team furthest
///    below its target that is still under max.
///
/// Assumes `min_per_team <= max_per_team` and that the budget covers the
/// minimum to every opponent; the config loader checks both.
pub fn allocate_budget(
    candidates: &[ArbitrationCandidate],
    league: &LeagueConfig,
    arb: &ArbitrationConfig,
) -> Vec<TeamAllocation> {
    // ---- Group by owning team ----

    let mut teams: Vec<TeamShare> = Vec::new();
    for candidate in candidates {
        let owner = candidate.owner();
        match teams.iter_mut().find(|t| t.team == owner) {
            Some(share) => share.candidates.push(candidate),
            None => teams.push(TeamShare {
                team: owner,
                candidates: vec![candidate],
                target: 0.0,
                current: arb.min_per_team,
            }),
        }
    }
    for share in &mut teams {
        share.candidates.sort_by(|a, b| b.surplus().cmp(&a.surplus()));
    }
    teams.sort_by(|a, b| b.candidates.len().cmp(&a.candidates.len()));

    // ---- Targets from surplus scores ----

    let top_n = arb.top_targets_per_team;
    let scores: Vec<f64> = teams
        .iter()
        .map(|t| {
            t.candidates
                .iter()
                .take(top_n)
                .map(|c| c.surplus().max(0) as f64)
                .sum()
        })
        .collect();
    let total_score: f64 = scores.iter().sum();

    let opponents = league.num_opponents() as u32;
    let guaranteed = opponents * arb.min_per_team;
    let distributable = arb.budget_per_team.saturating_sub(guaranteed) as f64;

    for (share, score) in teams.iter_mut().zip(&scores) {
        let fraction = if total_score > 0.0 {
            score / total_score
        } else if opponents > 0 {
            1.0 / opponents as f64
        } else {
            0.0
        };
        share.target = arb.min_per_team as f64 + fraction * distributable;
    }

    // ---- Greedy $1 distribution ----

    let mut spent = guaranteed;
    while spent < arb.budget_per_team {
        let mut best: Option<usize> = None;
        let mut best_gap = f64::NEG_INFINITY;
        for (i, share) in teams.iter().enumerate() {
            if share.current >= arb.max_per_team {
                continue;
            }
            let gap = share.target - share.current as f64;
            if gap > best_gap {
                best_gap = gap;
                best = Some(i);
            }
        }
        let Some(i) = best else {
            break;
        };
        teams[i].current += 1;
        spent += 1;
    }

    debug!(
        teams = teams.len(),
        spent,
        budget = arb.budget_per_team,
        "allocated arbitration budget"
    );

    let mut allocations: Vec<TeamAllocation> = teams
        .into_iter()
        .map(|share| TeamAllocation {
            team: share.team.to_string(),
            suggested: share.current,
            targets: share
                .candidates
                .into_iter()
                .take(top_n)
                .map(TargetSummary::from)
                .collect(),
        })
        .collect();
    allocations.sort_by(|a, b| b.suggested.cmp(&a.suggested));
    allocations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitration::targets::{find_targets, TargetOrder};
    use crate::valuation::test_support::{priced, test_config};

    fn candidates_for(
        teams: &[(&str, Vec<(u32, i32)>)],
    ) -> (crate::config::Config, Vec<ArbitrationCandidate>) {
        let config = test_config();
        let mut players = Vec::new();
        for (team, roster) in teams {
            for (i, &(price, value)) in roster.iter().enumerate() {
                players.push(priced(
                    &format!("{team}-{i}"),
                    Position::WideReceiver,
                    Some(*team),
                    price,
                    value,
                ));
            }
        }
        let targets = find_targets(&players, &config, TargetOrder::BestValue);
        (config, targets)
    }

    fn eleven_opponents() -> (crate::config::Config, Vec<ArbitrationCandidate>) {
        candidates_for(&[
            ("T01", vec![(10, 60), (5, 30), (3, 20)]),
            ("T02", vec![(10, 40), (5, 25)]),
            ("T03", vec![(10, 30)]),
            ("T04", vec![(10, 25)]),
            ("T05", vec![(10, 20)]),
            ("T06", vec![(10, 18)]),
            ("T07", vec![(10, 15)]),
            ("T08", vec![(10, 14)]),
            ("T09", vec![(10, 13)]),
            ("T10", vec![(10, 12)]),
            ("T11", vec![(10, 11)]),
        ])
    }

    #[test]
    fn spend_respects_budget_and_bounds() {
        let (config, targets) = eleven_opponents();
        let allocations = allocate_budget(&targets, &config.league, &config.arbitration);

        assert_eq!(allocations.len(), 11);
        let total: u32 = allocations.iter().map(|a| a.suggested).sum();
        assert!(total <= 60, "total spend should be <= 60, got {total}");
        for a in &allocations {
            assert!(
                (1..=8).contains(&a.suggested),
                "{} suggested {} outside [1, 8]",
                a.team,
                a.suggested
            );
        }
        for pair in allocations.windows(2) {
            assert!(pair[0].suggested >= pair[1].suggested);
        }
    }

    #[test]
    fn full_budget_spent_when_capacity_allows() {
        let (config, targets) = eleven_opponents();
        let allocations = allocate_budget(&targets, &config.league, &config.arbitration);
        let total: u32 = allocations.iter().map(|a| a.suggested).sum();
        assert_eq!(total, 60);
        assert_eq!(allocations[0].team, "T01");
        assert_eq!(allocations[0].suggested, 8, "top team should hit the per-team max");
    }

    #[test]
    fn few_teams_stop_at_max() {
        let (config, targets) = candidates_for(&[("A", vec![(10, 60)]), ("B", vec![(10, 40)])]);
        let allocations = allocate_budget(&targets, &config.league, &config.arbitration);
        // 11 opponents are guaranteed $1 each; only A and B can absorb more.
        assert_eq!(allocations.len(), 2);
        assert!(allocations.iter().all(|a| a.suggested == 8));
    }

    #[test]
    fn zero_scores_split_evenly() {
        let config = test_config();
        let players = vec![
            priced("a", Position::TightEnd, Some("A"), 20, 15),
            priced("b", Position::TightEnd, Some("B"), 20, 15),
        ];
        let targets = find_targets(&players, &config, TargetOrder::BestValue);
        let allocations = allocate_budget(&targets, &config.league, &config.arbitration);
        assert_eq!(allocations.len(), 2);
        // Equal targets: both reach the per-team max; first seen leads ties.
        assert_eq!(allocations[0].team, "A");
        assert_eq!(allocations[0].suggested, allocations[1].suggested);
    }

    #[test]
    fn team_targets_sorted_and_truncated() {
        let (config, targets) = candidates_for(&[(
            "Deep",
            vec![(1, 5), (1, 50), (1, 10), (1, 40), (1, 20), (1, 30), (1, 3)],
        )]);
        let allocations = allocate_budget(&targets, &config.league, &config.arbitration);
        let surpluses: Vec<i32> = allocations[0].targets.iter().map(|t| t.surplus).collect();
        assert_eq!(surpluses, vec![49, 39, 29, 19, 9]);
    }

    #[test]
    fn no_candidates_no_allocations() {
        let config = test_config();
        assert!(allocate_budget(&[], &config.league, &config.arbitration).is_empty());
    }
}
