use crate::types::{Match, StageConfig, Team};

/// Circle-method schedule for an arbitrary team-id list. Each inner vec is
/// one round of (team1, team2) pairings with synthetic-bye pairings already
/// dropped; a round can therefore come back empty and callers that need
/// dense numbering compact afterwards.
pub fn circle_schedule(team_ids: &[u32]) -> Vec<Vec<(u32, u32)>> {
  if team_ids.len() < 2 {
    if team_ids.len() == 1 {
      // One team padded to two: a single all-bye round.
      return vec![Vec::new()];
    }
    return Vec::new();
  }

  // Odd counts get a synthetic participant whose pairings sit out.
  let mut slots: Vec<Option<u32>> = team_ids.iter().copied().map(Some).collect();
  if slots.len() % 2 != 0 {
    slots.push(None);
  }
  let n = slots.len();
  let circle_len = n - 1;

  let mut rounds = Vec::with_capacity(circle_len);
  for rotation in 0..circle_len {
    let rotated = |index: usize| slots[1 + (index + rotation) % circle_len];

    let mut pairings = Vec::with_capacity(n / 2);
    if let (Some(a), Some(b)) = (slots[0], rotated(0)) {
      pairings.push((a, b));
    }
    for i in 1..n / 2 {
      if let (Some(a), Some(b)) = (rotated(i), rotated(circle_len - i)) {
        pairings.push((a, b));
      }
    }
    rounds.push(pairings);
  }
  rounds
}

/// Round-robin format: one match per pairing, rounds numbered in schedule
/// order. All round-robin matches use the early-round game configuration.
pub fn generate_round_robin(teams: &[Team], stage: &StageConfig) -> Vec<Match> {
  let ids: Vec<u32> = teams.iter().map(|team| team.id).collect();
  build_pool_matches(&ids, None, stage, &mut 1)
}

/// Shared by the round-robin format and the pool-play orchestrator: the
/// orchestrator tags each match with its pool and keeps ids flowing from a
/// single counter across pools.
pub(crate) fn build_pool_matches(
  team_ids: &[u32],
  pool_id: Option<u32>,
  stage: &StageConfig,
  next_id: &mut u64,
) -> Vec<Match> {
  let best_of = stage.early_round_games;
  let points = stage.early_round_points;
  let mut matches = Vec::new();
  for (round, pairings) in circle_schedule(team_ids).into_iter().enumerate() {
    for (position, (team1, team2)) in pairings.into_iter().enumerate() {
      let mut m = Match::empty(*next_id, round as u32, position as u32, best_of, points);
      *next_id += 1;
      m.team1_id = Some(team1);
      m.team2_id = Some(team2);
      m.pool_id = pool_id;
      matches.push(m);
    }
  }
  matches
}
