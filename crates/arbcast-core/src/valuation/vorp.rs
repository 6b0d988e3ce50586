// Value Over Replacement Player (VORP).
//
// Per-game VORP is a player's scoring rate minus the replacement rate at
// their position; full-season VORP annualizes it.

use serde::Serialize;
use tracing::debug;

use crate::config::ValuationConfig;
use crate::player::PlayerRecord;
use crate::valuation::replacement::{estimate_replacement_levels, ReplacementLevels};
use crate::valuation::{qualifying_players, round1, round2};

/// A qualifying player with their value over replacement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuedPlayer {
    #[serde(flatten)]
    pub record: PlayerRecord,
    pub replacement_ppg: f64,
    pub vorp_per_game: f64,
    pub full_season_vorp: f64,
}

/// VORP for the whole qualifying pool, plus the replacement levels used.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VorpResult {
    pub replacement: ReplacementLevels,
    pub players: Vec<ValuedPlayer>,
}

/// Compute VORP for every qualifying player.
///
/// Replacement levels come from veterans only; prospects are valued against
/// them like anyone else. A position missing from the level map is valued
/// against a replacement rate of 0. Output preserves snapshot order.
pub fn compute_vorp(records: &[PlayerRecord], valuation: &ValuationConfig) -> VorpResult {
    let qualified = qualifying_players(records, valuation);
    if qualified.is_empty() {
        debug!("no qualifying players; VORP is empty");
        return VorpResult::default();
    }

    let replacement = estimate_replacement_levels(&qualified, valuation);
    let season_games = valuation.season_games as f64;

    let players: Vec<ValuedPlayer> = qualified
        .into_iter()
        .map(|p| {
            let replacement_ppg = replacement.get(&p.position).map_or(0.0, |lvl| lvl.ppg);
            let vorp = p.ppg - replacement_ppg;
            ValuedPlayer {
                record: p.clone(),
                replacement_ppg,
                vorp_per_game: round2(vorp),
                full_season_vorp: round1(vorp * season_games),
            }
        })
        .collect();

    debug!(
        players = players.len(),
        positions = replacement.len(),
        "computed VORP"
    );

    VorpResult {
        replacement,
        players,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Position;
    use crate::valuation::test_support::{approx_eq, make_player, test_config};

    fn rb_market() -> Vec<PlayerRecord> {
        vec![
            make_player("rb1", Position::RunningBack, Some("A"), 1, 6.0),
            make_player("rb2", Position::RunningBack, Some("B"), 1, 7.0),
            make_player("rb3", Position::RunningBack, Some("C"), 1, 8.0),
            make_player("rb4", Position::RunningBack, Some("D"), 30, 18.0),
            make_player("rb5", Position::RunningBack, Some("E"), 45, 21.333),
        ]
    }

    #[test]
    fn vorp_is_rate_minus_replacement() {
        let config = test_config();
        let result = compute_vorp(&rb_market(), &config.valuation);
        // Bottom tier {6, 7, 8} -> replacement 7.
        let star = result.players.iter().find(|p| p.record.player_id == "rb4").unwrap();
        assert!(approx_eq(star.replacement_ppg, 7.0, 1e-9));
        assert!(approx_eq(star.vorp_per_game, 11.0, 1e-9));
        assert!(approx_eq(star.full_season_vorp, 187.0, 1e-9));
    }

    #[test]
    fn full_season_uses_unrounded_rate() {
        let config = test_config();
        let result = compute_vorp(&rb_market(), &config.valuation);
        let p = result.players.iter().find(|p| p.record.player_id == "rb5").unwrap();
        // 14.333 * 17 = 243.661 -> 243.7; from the rounded 14.33 it would be 243.6
        assert!(approx_eq(p.vorp_per_game, 14.33, 1e-9));
        assert!(
            approx_eq(p.full_season_vorp, 243.7, 1e-9),
            "full-season VORP should be 243.7, got {}",
            p.full_season_vorp
        );
    }

    #[test]
    fn negative_vorp_is_kept() {
        let config = test_config();
        let result = compute_vorp(&rb_market(), &config.valuation);
        let p = result.players.iter().find(|p| p.record.player_id == "rb1").unwrap();
        assert!(approx_eq(p.vorp_per_game, -1.0, 1e-9));
        assert!(approx_eq(p.full_season_vorp, -17.0, 1e-9));
    }

    #[test]
    fn preserves_input_order() {
        let config = test_config();
        let result = compute_vorp(&rb_market(), &config.valuation);
        let ids: Vec<&str> = result.players.iter().map(|p| p.record.player_id.as_str()).collect();
        assert_eq!(ids, vec!["rb1", "rb2", "rb3", "rb4", "rb5"]);
    }

    #[test]
    fn prospect_valued_against_veteran_baseline() {
        let config = test_config();
        let mut records = rb_market();
        let mut rookie = make_player("rook", Position::RunningBack, None, 0, 12.0);
        rookie.is_prospect = true;
        rookie.games_played = 0;
        rookie.total_points = 0.0;
        records.push(rookie);

        let result = compute_vorp(&records, &config.valuation);
        let p = result.players.iter().find(|p| p.record.player_id == "rook").unwrap();
        assert!(approx_eq(p.vorp_per_game, 5.0, 1e-9));
    }

    #[test]
    fn unranked_position_has_zero_replacement() {
        let mut config = test_config();
        config.valuation.excluded_positions.clear();
        let records = vec![make_player("k1", Position::Kicker, Some("A"), 1, 8.0)];
        let result = compute_vorp(&records, &config.valuation);
        assert_eq!(result.players.len(), 1);
        assert!(approx_eq(result.players[0].replacement_ppg, 0.0, 1e-9));
        assert!(approx_eq(result.players[0].vorp_per_game, 8.0, 1e-9));
    }

    #[test]
    fn empty_pool_gives_empty_result() {
        let config = test_config();
        let result = compute_vorp(&[], &config.valuation);
        assert!(result.players.is_empty());
        assert!(result.replacement.is_empty());
    }
}
