use crate::types::Team;

/// Round-0 layout computed from a seeded team list: bracket dimensions plus
/// the fold pairings that decide who meets whom and who draws a bye.
#[derive(Clone, Debug)]
pub struct RoundOnePlan {
  pub total_rounds: u32,
  pub bracket_size: usize,
  pub byes: usize,
  /// (team1, team2) per round-0 slot. A missing team2 is a bye for team1.
  pub pairings: Vec<(Option<u32>, Option<u32>)>,
}

impl RoundOnePlan {
  pub fn is_degenerate(&self) -> bool {
    self.total_rounds == 0
  }
}

/// Stable seed order: seeded teams ascending, unseeded after all seeded
/// teams with their relative order preserved.
pub fn seed_order(teams: &[Team]) -> Vec<Team> {
  let mut ordered = teams.to_vec();
  ordered.sort_by(|a, b| match (a.seed, b.seed) {
    (Some(x), Some(y)) => x.cmp(&y),
    (Some(_), None) => std::cmp::Ordering::Less,
    (None, Some(_)) => std::cmp::Ordering::Greater,
    (None, None) => std::cmp::Ordering::Equal,
  });
  ordered
}

/// Smallest power-of-two bracket that fits n teams. Fewer than two teams is
/// a degenerate "no bracket" result, not an error.
pub fn bracket_dims(n: usize) -> (u32, usize) {
  if n < 2 {
    return (0, n);
  }
  let total_rounds = (usize::BITS - (n - 1).leading_zeros()) as u32;
  (total_rounds, 1usize << total_rounds)
}

/// Build the round-0 fold pairing. Slot i pairs with slot
/// `match_count*2 - 1 - i`, so the byes created by bracket-size padding
/// land on the highest seeds.
pub fn plan_first_round(teams: &[Team]) -> RoundOnePlan {
  let ordered = seed_order(teams);
  let n = ordered.len();
  let (total_rounds, bracket_size) = bracket_dims(n);
  if total_rounds == 0 {
    return RoundOnePlan {
      total_rounds: 0,
      bracket_size,
      byes: 0,
      pairings: Vec::new(),
    };
  }

  let match_count = bracket_size / 2;
  let slot_team = |slot: usize| ordered.get(slot).map(|team| team.id);
  let pairings = (0..match_count)
    .map(|i| (slot_team(i), slot_team(match_count * 2 - 1 - i)))
    .collect();

  RoundOnePlan {
    total_rounds,
    bracket_size,
    byes: bracket_size - n,
    pairings,
  }
}
