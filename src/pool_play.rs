use std::collections::HashMap;

use crate::config::{parse_rating, pool_name};
use crate::round_robin::build_pool_matches;
use crate::types::{
  BracketSide, Match, MatchRef, Pool, StageConfig, Team, KNOCKOUT_ROUND_BASE,
};

pub struct PoolPlayOutput {
  pub matches: Vec<Match>,
  /// Team copies annotated with their pool assignment.
  pub teams: Vec<Team>,
  pub pools: Vec<Pool>,
}

/// Snake-seed the roster into pools, round-robin each pool, then append an
/// empty knockout sub-bracket sized for the top two finishers per pool.
/// Knockout rounds live at KNOCKOUT_ROUND_BASE and above; their team slots
/// stay empty until the store's qualify step fills them from standings.
pub fn generate_pool_play(teams: &[Team], stage: &StageConfig) -> PoolPlayOutput {
  let pool_count = stage.number_of_pools;
  let annotated = partition_into_pools(teams, pool_count);

  let mut pools: Vec<Pool> = (0..pool_count)
    .map(|id| Pool {
      id,
      name: pool_name(id),
      team_ids: Vec::new(),
    })
    .collect();
  for team in &annotated {
    if let Some(pool_id) = team.pool_id {
      pools[pool_id as usize].team_ids.push(team.id);
    }
  }

  let mut next_id = 1u64;
  let mut matches = Vec::new();
  for pool in &pools {
    matches.extend(build_pool_matches(
      &pool.team_ids,
      Some(pool.id),
      stage,
      &mut next_id,
    ));
  }
  matches.extend(build_knockout_stage(pool_count, stage, &mut next_id));

  PoolPlayOutput {
    matches,
    teams: annotated,
    pools,
  }
}

/// Copy-on-write pool assignment: the caller's teams are never touched.
/// Order of strength is rating descending where present, then seed
/// ascending, then input order; index i goes to pool `fold` when
/// `fold = i mod 2P` is below P, else `2P - 1 - fold`, alternating
/// direction each pass so top seeds spread evenly.
pub fn partition_into_pools(teams: &[Team], pool_count: u32) -> Vec<Team> {
  let mut ranked = teams.to_vec();
  ranked.sort_by(|a, b| compare_strength(a, b));

  let p = pool_count as usize;
  for (i, team) in ranked.iter_mut().enumerate() {
    let fold = i % (2 * p);
    let pool = if fold < p { fold } else { 2 * p - 1 - fold };
    team.pool_id = Some(pool as u32);
  }
  ranked
}

fn compare_strength(a: &Team, b: &Team) -> std::cmp::Ordering {
  use std::cmp::Ordering;
  let rating = |team: &Team| team.rating.as_deref().and_then(parse_rating);
  match (rating(a), rating(b)) {
    (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => match (a.seed, b.seed) {
      (Some(x), Some(y)) => x.cmp(&y),
      (Some(_), None) => Ordering::Less,
      (None, Some(_)) => Ordering::Greater,
      (None, None) => Ordering::Equal,
    },
  }
}

pub fn knockout_round_total(pool_count: u32) -> u32 {
  let advancing = (pool_count * 2).max(2) as usize;
  (usize::BITS - (advancing - 1).leading_zeros()) as u32
}

fn build_knockout_stage(pool_count: u32, stage: &StageConfig, next_id: &mut u64) -> Vec<Match> {
  let rounds = knockout_round_total(pool_count);
  let bracket_size = 1usize << rounds;

  let mut table: HashMap<MatchRef, u64> = HashMap::new();
  let mut matches = Vec::new();
  for stage_round in 0..rounds {
    let remaining = rounds - 1 - stage_round;
    let best_of = stage.games_from_final(remaining);
    let points = stage.points_from_final(remaining);
    for position in 0..(bracket_size >> (stage_round + 1)) {
      let mut m = Match::empty(
        *next_id,
        KNOCKOUT_ROUND_BASE + stage_round,
        position as u32,
        best_of,
        points,
      );
      *next_id += 1;
      m.is_knockout = true;
      table.insert(
        MatchRef::new(BracketSide::Knockout, stage_round, position as u32),
        m.id,
      );
      matches.push(m);
    }
  }

  for m in matches.iter_mut() {
    let stage_round = m.round - KNOCKOUT_ROUND_BASE;
    if stage_round + 1 < rounds {
      let target = MatchRef::new(BracketSide::Knockout, stage_round + 1, m.position / 2);
      m.winner_goes_to = table.get(&target).copied();
    }
  }
  matches
}
