// Dollar valuation: VORP -> cap dollars, surplus, keeper calls.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::{Config, KeeperThresholds, LeagueConfig, ValuationConfig};
use crate::player::PlayerRecord;
use crate::valuation::vorp::{compute_vorp, ValuedPlayer};

/// Manual dollar deltas keyed by player id, applied before the $1 floor.
pub type Adjustments = HashMap<String, f64>;

/// A valued player with a cap-dollar figure and surplus over their salary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedPlayer {
    #[serde(flatten)]
    pub valued: ValuedPlayer,
    pub dollar_value: i32,
    pub surplus: i32,
}

impl PricedPlayer {
    pub fn record(&self) -> &PlayerRecord {
        &self.valued.record
    }
}

// ---------------------------------------------------------------------------
// Dollar conversion
// ---------------------------------------------------------------------------

/// Convert full-season VORP into cap dollars.
///
/// Algorithm:
/// 1. pool = sum of positive full-season VORP. A zero pool means nobody
///    beats replacement and there is nothing to price.
/// 2. available = num_teams * cap_per_team * cap_allocation_fraction.
/// 3. base = round(max(vorp * available / pool, 1)).
/// 4. With an adjustment `d`: value = round(max(base + d, 1)).
/// 5. surplus = value - price.
pub fn price_players(
    valued: &[ValuedPlayer],
    league: &LeagueConfig,
    valuation: &ValuationConfig,
    adjustments: Option<&Adjustments>,
) -> Vec<PricedPlayer> {
    let pool: f64 = valued
        .iter()
        .map(|p| p.full_season_vorp)
        .filter(|v| *v > 0.0)
        .sum();

    if pool <= 0.0 {
        warn!("no player is above replacement; dollar values are empty");
        return Vec::new();
    }

    let available =
        league.num_teams as f64 * league.cap_per_team as f64 * valuation.cap_allocation_fraction;
    let dollars_per_vorp = available / pool;
    debug!(pool, available, dollars_per_vorp, "dollar conversion");

    valued
        .iter()
        .map(|p| {
            let base = (p.full_season_vorp * dollars_per_vorp).max(1.0).round();
            let adjustment = adjustments
                .and_then(|adj| adj.get(&p.record.player_id))
                .copied()
                .filter(|d| d.is_finite())
                .unwrap_or(0.0);
            let dollar_value = (base + adjustment).max(1.0).round() as i32;
            PricedPlayer {
                valued: p.clone(),
                dollar_value,
                surplus: dollar_value - p.record.price as i32,
            }
        })
        .collect()
}

/// VORP and dollar conversion in one step.
pub fn value_players(
    records: &[PlayerRecord],
    config: &Config,
    adjustments: Option<&Adjustments>,
) -> Vec<PricedPlayer> {
    let vorp = compute_vorp(records, &config.valuation);
    price_players(&vorp.players, &config.league, &config.valuation, adjustments)
}

// ---------------------------------------------------------------------------
// Keeper recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongKeep,
    Keep,
    Borderline,
    CutCandidate,
}

impl Recommendation {
    pub fn from_surplus(surplus: i32, thresholds: &KeeperThresholds) -> Self {
        if surplus >= thresholds.strong_keep {
            Recommendation::StrongKeep
        } else if surplus >= thresholds.keep {
            Recommendation::Keep
        } else if surplus >= thresholds.borderline {
            Recommendation::Borderline
        } else {
            Recommendation::CutCandidate
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeeperAssessment {
    #[serde(flatten)]
    pub player: PricedPlayer,
    pub recommendation: Recommendation,
}

/// Classify the analyzing team's roster by surplus, best value first.
pub fn recommend_keepers(
    priced: &[PricedPlayer],
    league: &LeagueConfig,
    thresholds: &KeeperThresholds,
) -> Vec<KeeperAssessment> {
    let mut roster: Vec<KeeperAssessment> = priced
        .iter()
        .filter(|p| p.record().is_owned_by(&league.my_team))
        .map(|p| KeeperAssessment {
            player: p.clone(),
            recommendation: Recommendation::from_surplus(p.surplus, thresholds),
        })
        .collect();
    roster.sort_by(|a, b| b.player.surplus.cmp(&a.player.surplus));
    roster
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Position;
    use crate::valuation::test_support::{make_player, test_config};

    fn valued(id: &str, owner: Option<&str>, price: u32, full_season_vorp: f64) -> ValuedPlayer {
        ValuedPlayer {
            record: make_player(id, Position::WideReceiver, owner, price, 10.0),
            replacement_ppg: 5.0,
            vorp_per_game: full_season_vorp / 17.0,
            full_season_vorp,
        }
    }

    #[test]
    fn dollars_scale_to_available_cap() {
        let config = test_config();
        // available = 12 * 400 * 0.875 = 4200; pool = 300 -> $14 per point
        let players = vec![
            valued("a", Some("A"), 10, 200.0),
            valued("b", Some("B"), 50, 100.0),
            valued("c", None, 0, -20.0),
        ];
        let priced = price_players(&players, &config.league, &config.valuation, None);

        assert_eq!(priced.len(), 3);
        assert_eq!(priced[0].dollar_value, 2800);
        assert_eq!(priced[0].surplus, 2790);
        assert_eq!(priced[1].dollar_value, 1400);
        assert_eq!(priced[1].surplus, 1350);
        assert_eq!(priced[2].dollar_value, 1, "negative VORP floors at $1");
    }

    #[test]
    fn every_value_is_at_least_one_and_surplus_is_exact() {
        let config = test_config();
        let players = vec![
            valued("a", Some("A"), 10, 0.01),
            valued("b", Some("B"), 3, 50.0),
            valued("c", Some("C"), 7, -5.0),
        ];
        for p in price_players(&players, &config.league, &config.valuation, None) {
            assert!(p.dollar_value >= 1, "{} should be >= $1", p.record().player_id);
            assert_eq!(p.surplus, p.dollar_value - p.record().price as i32);
        }
    }

    #[test]
    fn zero_pool_is_empty() {
        let config = test_config();
        let players = vec![valued("a", Some("A"), 10, 0.0), valued("b", None, 0, -3.0)];
        assert!(price_players(&players, &config.league, &config.valuation, None).is_empty());
    }

    #[test]
    fn adjustments_apply_before_floor() {
        let config = test_config();
        let players = vec![valued("a", Some("A"), 10, 300.0), valued("b", Some("B"), 5, -1.0)];
        let mut adj = Adjustments::new();
        adj.insert("a".into(), -200.5);
        adj.insert("b".into(), 6.0);

        let priced = price_players(&players, &config.league, &config.valuation, Some(&adj));
        // base a = 4200; 4200 - 200.5 = 3999.5 -> 4000
        assert_eq!(priced[0].dollar_value, 4000);
        // base b = 1 (floored); 1 + 6 = 7
        assert_eq!(priced[1].dollar_value, 7);

        adj.insert("a".into(), -10_000.0);
        let priced = price_players(&players, &config.league, &config.valuation, Some(&adj));
        assert_eq!(priced[0].dollar_value, 1, "adjusted value still floors at $1");
    }

    #[test]
    fn keeper_thresholds() {
        let t = test_config().keepers;
        assert_eq!(Recommendation::from_surplus(10, &t), Recommendation::StrongKeep);
        assert_eq!(Recommendation::from_surplus(9, &t), Recommendation::Keep);
        assert_eq!(Recommendation::from_surplus(0, &t), Recommendation::Keep);
        assert_eq!(Recommendation::from_surplus(-1, &t), Recommendation::Borderline);
        assert_eq!(Recommendation::from_surplus(-5, &t), Recommendation::Borderline);
        assert_eq!(Recommendation::from_surplus(-6, &t), Recommendation::CutCandidate);
    }

    #[test]
    fn keepers_only_cover_my_team_sorted_by_surplus() {
        let config = test_config();
        let players = vec![
            valued("low", Some("Mine"), 2000, 100.0),
            valued("other", Some("Rival"), 1, 100.0),
            valued("high", Some("Mine"), 1, 100.0),
        ];
        let priced = price_players(&players, &config.league, &config.valuation, None);
        let keepers = recommend_keepers(&priced, &config.league, &config.keepers);

        let ids: Vec<&str> = keepers
            .iter()
            .map(|k| k.player.record().player_id.as_str())
            .collect();
        assert_eq!(ids, vec!["high", "low"]);
        assert_eq!(keepers[0].recommendation, Recommendation::StrongKeep);
        assert_eq!(keepers[1].recommendation, Recommendation::CutCandidate);
    }

    #[test]
    fn keepers_empty_without_roster() {
        let config = test_config();
        let players = vec![valued("other", Some("Rival"), 1, 100.0)];
        let priced = price_players(&players, &config.league, &config.valuation, None);
        assert!(recommend_keepers(&priced, &config.league, &config.keepers).is_empty());
    }
}
