use crate::seeding::{plan_first_round, RoundOnePlan};
use crate::types::{Match, Outcome, StageConfig, Team};

/// Build a full knockout bracket: round 0 from the seeding plan, empty
/// matches for every later round, byes pre-advanced into round 1. All
/// later advancement is applied by the store at score-update time using
/// the `round + 1, position / 2` parity rule.
pub fn generate_single_elimination(teams: &[Team], stage: &StageConfig) -> Vec<Match> {
  let plan = plan_first_round(teams);
  if plan.is_degenerate() {
    return Vec::new();
  }
  let mut next_id = 1u64;
  let mut matches = build_winners_rounds(&plan, stage, &mut next_id);
  advance_byes(&mut matches);
  matches
}

/// Rounds 0..total_rounds of a knockout ladder, marked as the winners
/// bracket. Round r holds `bracket_size / 2^(r+1)` matches; game counts
/// come from the stage config counted backward from the final.
pub(crate) fn build_winners_rounds(
  plan: &RoundOnePlan,
  stage: &StageConfig,
  next_id: &mut u64,
) -> Vec<Match> {
  let total_rounds = plan.total_rounds;
  let mut matches = Vec::new();

  for round in 0..total_rounds {
    let remaining = total_rounds - 1 - round;
    let best_of = stage.games_from_final(remaining);
    let points = stage.points_from_final(remaining);
    let count = plan.bracket_size >> (round + 1);

    for position in 0..count {
      let mut m = Match::empty(*next_id, round, position as u32, best_of, points);
      *next_id += 1;
      m.is_winners_bracket = true;
      if round == 0 {
        let (team1, team2) = plan.pairings[position];
        m.team1_id = team1;
        m.team2_id = team2;
        if let (Some(lone), None) = (team1, team2) {
          m.is_bye = true;
          m.outcome = Outcome::Decided(lone);
          m.completed = true;
        }
      }
      matches.push(m);
    }
  }
  matches
}

/// Every round-0 bye places its preset winner into round 1 at
/// `position / 2`, team1 slot for even bye positions, team2 for odd.
pub(crate) fn advance_byes(matches: &mut [Match]) {
  let advancing: Vec<(u32, u32)> = matches
    .iter()
    .filter(|m| m.is_winners_bracket && m.round == 0 && m.is_bye)
    .filter_map(|m| m.outcome.winner_id().map(|winner| (m.position, winner)))
    .collect();

  for (position, winner) in advancing {
    let target = matches
      .iter_mut()
      .find(|m| m.is_winners_bracket && m.round == 1 && m.position == position / 2);
    if let Some(next) = target {
      if position % 2 == 0 {
        next.team1_id = Some(winner);
      } else {
        next.team2_id = Some(winner);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn make_teams(n: u32) -> Vec<Team> {
    (1..=n).map(|i| Team::seeded(i, &format!("Team {i}"), i)).collect()
  }

  #[test]
  fn test_five_teams_layout() {
    let matches = generate_single_elimination(&make_teams(5), &StageConfig::default());
    let round0: Vec<&Match> = matches.iter().filter(|m| m.round == 0).collect();
    assert_eq!(round0.len(), 4);
    assert_eq!(round0.iter().filter(|m| m.is_bye).count(), 3);
    assert_eq!(matches.iter().filter(|m| m.round == 1).count(), 2);
    assert_eq!(matches.iter().filter(|m| m.round == 2).count(), 1);
    assert_eq!(matches.len(), 7);
  }

  #[test]
  fn test_bye_matches_carry_preset_winner() {
    let matches = generate_single_elimination(&make_teams(5), &StageConfig::default());
    for m in matches.iter().filter(|m| m.is_bye) {
      assert_eq!(m.team_count(), 1);
      assert_eq!(m.outcome.winner_id(), m.team1_id);
      assert!(m.completed);
    }
  }

  #[test]
  fn test_non_bye_round_zero_has_two_distinct_teams() {
    for n in 2u32..=16 {
      let matches = generate_single_elimination(&make_teams(n), &StageConfig::default());
      for m in matches.iter().filter(|m| m.round == 0 && !m.is_bye) {
        assert_eq!(m.team_count(), 2, "n={n}");
        assert_ne!(m.team1_id, m.team2_id);
      }
      let byes = matches.iter().filter(|m| m.is_bye).count();
      let bracket = (n as usize).next_power_of_two();
      assert_eq!(byes, bracket - n as usize, "n={n}");
    }
  }

  #[test]
  fn test_byes_pre_advance_into_round_one() {
    let matches = generate_single_elimination(&make_teams(5), &StageConfig::default());
    // Byes at positions 0,1,2 advance seeds 1,2,3.
    let r1p0 = matches.iter().find(|m| m.round == 1 && m.position == 0).unwrap();
    assert_eq!(r1p0.team1_id, Some(1));
    assert_eq!(r1p0.team2_id, Some(2));
    let r1p1 = matches.iter().find(|m| m.round == 1 && m.position == 1).unwrap();
    assert_eq!(r1p1.team1_id, Some(3));
    assert_eq!(r1p1.team2_id, None);
  }

  #[test]
  fn test_stage_config_counts_backward_from_final() {
    let stage = StageConfig {
      early_round_games: 1,
      quarter_final_games: 3,
      semi_final_games: 5,
      final_games: 7,
      ..StageConfig::default()
    };
    let matches = generate_single_elimination(&make_teams(16), &stage);
    assert!(matches.iter().filter(|m| m.round == 0).all(|m| m.best_of == 1));
    assert!(matches.iter().filter(|m| m.round == 1).all(|m| m.best_of == 3));
    assert!(matches.iter().filter(|m| m.round == 2).all(|m| m.best_of == 5));
    assert!(matches.iter().filter(|m| m.round == 3).all(|m| m.best_of == 7));
  }

  #[test]
  fn test_degenerate_team_counts() {
    assert!(generate_single_elimination(&[], &StageConfig::default()).is_empty());
    assert!(generate_single_elimination(&make_teams(1), &StageConfig::default()).is_empty());
  }

  #[test]
  fn test_generation_is_deterministic() {
    let teams = make_teams(13);
    let stage = StageConfig::default();
    let a = generate_single_elimination(&teams, &stage);
    let b = generate_single_elimination(&teams, &stage);
    assert_eq!(a, b);
  }
}
