// Arbitration target analysis.
//
// Opponent-owned players are priced as if the analyzing team added the
// per-team maximum raise to each of them.

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::valuation::surplus::PricedPlayer;

/// How the target list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetOrder {
    /// Highest surplus first: the players whose owners lose the most value.
    #[default]
    BestValue,
    /// Lowest surplus after the raise first: players a raise could push into
    /// being cut.
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrationCandidate {
    #[serde(flatten)]
    pub priced: PricedPlayer,
    pub salary_after_arb: u32,
    pub surplus_after_arb: i32,
}

impl ArbitrationCandidate {
    pub fn player_id(&self) -> &str {
        &self.priced.record().player_id
    }

    pub fn surplus(&self) -> i32 {
        self.priced.surplus
    }

    /// The opponent that rosters this player.
    pub fn owner(&self) -> &str {
        self.priced.record().owner().unwrap_or_default()
    }
}

/// Opponent players worth contesting, in the requested order.
///
/// Kept: owned by a rostered team other than `league.my_team`, not at an
/// excluded position, surplus within [floor, ceiling], and worth more than $1.
pub fn find_targets(
    priced: &[PricedPlayer],
    config: &Config,
    order: TargetOrder,
) -> Vec<ArbitrationCandidate> {
    let arb = &config.arbitration;
    let my_team = config.league.my_team.as_str();

    let mut targets: Vec<ArbitrationCandidate> = priced
        .iter()
        .filter(|p| {
            let record = p.record();
            record.owner().is_some_and(|owner| owner != my_team)
                && !config.valuation.is_excluded(record.position)
        })
        .filter(|p| p.surplus >= arb.surplus_floor && p.dollar_value > 1)
        .filter(|p| arb.surplus_ceiling.map_or(true, |ceiling| p.surplus <= ceiling))
        .map(|p| {
            let salary_after_arb = p.record().price + arb.max_per_player_per_team;
            ArbitrationCandidate {
                priced: p.clone(),
                salary_after_arb,
                surplus_after_arb: p.dollar_value - salary_after_arb as i32,
            }
        })
        .collect();

    match order {
        TargetOrder::BestValue => targets.sort_by(|a, b| b.surplus().cmp(&a.surplus())),
        TargetOrder::Danger => targets.sort_by_key(|t| t.surplus_after_arb),
    }

    debug!(targets = targets.len(), ?order, "arbitration targets");
    targets
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Position;
    use crate::valuation::test_support::{priced, test_config};

    fn ids(targets: &[ArbitrationCandidate]) -> Vec<&str> {
        targets.iter().map(|t| t.player_id()).collect()
    }

    #[test]
    fn sixty_dollar_player_at_ten() {
        let config = test_config();
        let players = vec![priced("star", Position::RunningBack, Some("Rival"), 10, 60)];
        let targets = find_targets(&players, &config, TargetOrder::BestValue);

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].salary_after_arb, 14);
        assert_eq!(targets[0].surplus_after_arb, 46);
        assert_eq!(targets[0].owner(), "Rival");
    }

    #[test]
    fn excludes_my_team_free_agents_and_kickers() {
        let config = test_config();
        let players = vec![
            priced("mine", Position::WideReceiver, Some("Mine"), 5, 30),
            priced("fa", Position::WideReceiver, Some("FA"), 0, 30),
            priced("none", Position::WideReceiver, None, 0, 30),
            priced("kick", Position::Kicker, Some("Rival"), 1, 30),
            priced("ok", Position::WideReceiver, Some("Rival"), 5, 30),
        ];
        let targets = find_targets(&players, &config, TargetOrder::BestValue);
        assert_eq!(ids(&targets), vec!["ok"]);
    }

    #[test]
    fn surplus_band_and_dollar_floor() {
        let mut config = test_config();
        let players = vec![
            priced("deep_neg", Position::TightEnd, Some("R"), 30, 19), // -11
            priced("floor", Position::TightEnd, Some("R"), 30, 20),    // -10
            priced("one", Position::TightEnd, Some("R"), 0, 1),        // $1
            priced("big", Position::TightEnd, Some("R"), 10, 40),      // +30
        ];
        let targets = find_targets(&players, &config, TargetOrder::BestValue);
        assert_eq!(ids(&targets), vec!["big", "floor"]);

        config.arbitration.surplus_ceiling = Some(15);
        let targets = find_targets(&players, &config, TargetOrder::BestValue);
        assert_eq!(ids(&targets), vec!["floor"]);
    }

    #[test]
    fn serializes_as_one_flat_row() {
        let config = test_config();
        let players = vec![priced("star", Position::RunningBack, Some("Rival"), 10, 60)];
        let targets = find_targets(&players, &config, TargetOrder::BestValue);

        let row = serde_json::to_value(&targets[0]).unwrap();
        assert_eq!(row["player_id"], "star");
        assert_eq!(row["position"], "RB");
        assert_eq!(row["team_name"], "Rival");
        assert_eq!(row["dollar_value"], 60);
        assert_eq!(row["surplus"], 50);
        assert_eq!(row["salary_after_arb"], 14);
        assert_eq!(row["surplus_after_arb"], 46);
        assert!(row.get("priced").is_none());
    }

    #[test]
    fn orderings() {
        let config = test_config();
        let players = vec![
            priced("a", Position::WideReceiver, Some("R"), 10, 20), // +10, after -> 6
            priced("b", Position::WideReceiver, Some("R"), 2, 5),   // +3,  after -> -1
            priced("c", Position::WideReceiver, Some("R"), 20, 40), // +20, after -> 16
            priced("d", Position::WideReceiver, Some("S"), 1, 4),   // +3,  after -> -1
        ];
        let best = find_targets(&players, &config, TargetOrder::BestValue);
        assert_eq!(ids(&best), vec!["c", "a", "b", "d"]);

        let danger = find_targets(&players, &config, TargetOrder::Danger);
        assert_eq!(ids(&danger), vec!["b", "d", "a", "c"]);
    }
}
