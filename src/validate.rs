use std::collections::{BTreeSet, HashMap, HashSet};

use crate::types::{Match, KNOCKOUT_ROUND_BASE};

/// Remap the round numbers actually used to dense sequences: 0-based below
/// KNOCKOUT_ROUND_BASE, base-anchored at and above it. Round-robin
/// schedules can legitimately emit empty rounds (odd team counts); those
/// must disappear, not persist as numbering holes. Returns the count of
/// dense rounds below the knockout base.
pub fn normalize_rounds(matches: &mut [Match]) -> u32 {
  let lower: BTreeSet<u32> = matches
    .iter()
    .filter(|m| m.round < KNOCKOUT_ROUND_BASE)
    .map(|m| m.round)
    .collect();
  let upper: BTreeSet<u32> = matches
    .iter()
    .filter(|m| m.round >= KNOCKOUT_ROUND_BASE)
    .map(|m| m.round)
    .collect();

  let mut remap: HashMap<u32, u32> = HashMap::new();
  for (dense, round) in lower.iter().enumerate() {
    remap.insert(*round, dense as u32);
  }
  for (dense, round) in upper.iter().enumerate() {
    remap.insert(*round, KNOCKOUT_ROUND_BASE + dense as u32);
  }

  for m in matches.iter_mut() {
    if let Some(next) = remap.get(&m.round) {
      m.round = *next;
    }
  }
  lower.len() as u32
}

/// Structural checks run before a generated match list is handed to the
/// persistence layer. Findings are messages, not errors: the caller
/// decides whether to block.
pub fn validate(matches: &[Match]) -> Vec<String> {
  let mut problems = Vec::new();
  if matches.is_empty() {
    return problems;
  }

  let ids: HashSet<u64> = matches.iter().map(|m| m.id).collect();
  if ids.len() != matches.len() {
    problems.push("duplicate match ids in generated list".to_string());
  }

  check_sequential(matches, false, &mut problems);
  check_sequential(matches, true, &mut problems);
  check_first_round_teams(matches, &mut problems);
  check_positions(matches, &mut problems);

  for m in matches {
    if m.is_bye {
      if m.team_count() != 1 {
        problems.push(format!("bye match {} must have exactly one team", m.id));
      }
      if m.outcome.winner_id() != m.team1_id.or(m.team2_id) {
        problems.push(format!("bye match {} winner does not match its team", m.id));
      }
    }
    for target in [m.winner_goes_to, m.loser_goes_to].into_iter().flatten() {
      if !ids.contains(&target) {
        problems.push(format!("match {} points at missing match {}", m.id, target));
      }
    }
  }

  problems
}

fn check_sequential(matches: &[Match], knockout: bool, problems: &mut Vec<String>) {
  let rounds: BTreeSet<u32> = matches
    .iter()
    .filter(|m| (m.round >= KNOCKOUT_ROUND_BASE) == knockout)
    .map(|m| m.round)
    .collect();
  if rounds.is_empty() {
    return;
  }
  let base = if knockout { KNOCKOUT_ROUND_BASE } else { 0 };
  for (offset, round) in rounds.iter().enumerate() {
    let expected = base + offset as u32;
    if *round != expected {
      let space = if knockout { "knockout" } else { "pool/bracket" };
      problems.push(format!(
        "{space} rounds are not sequential: expected round {expected}, found {round}"
      ));
      return;
    }
  }
}

/// Every first-round match must come out of generation with at least one
/// team or be a bye. Matches that progression feeds legitimately start
/// empty: the knockout's first round waits for pool qualification, and a
/// losers-bracket match (always carrying `winner_goes_to`) may have only
/// bye feeders, which never deliver a loser.
fn check_first_round_teams(matches: &[Match], problems: &mut Vec<String>) {
  let fed: HashSet<u64> = matches
    .iter()
    .flat_map(|m| [m.winner_goes_to, m.loser_goes_to])
    .flatten()
    .collect();

  for m in matches {
    if m.round != 0 || m.is_knockout || m.is_bye || m.winner_goes_to.is_some() {
      continue;
    }
    if fed.contains(&m.id) {
      continue;
    }
    if m.team_count() == 0 {
      problems.push(format!("round-0 match {} has no teams and is not a bye", m.id));
    }
  }
}

fn check_positions(matches: &[Match], problems: &mut Vec<String>) {
  let mut groups: HashMap<(u32, bool, Option<u32>), Vec<u32>> = HashMap::new();
  for m in matches {
    groups
      .entry((m.round, m.is_winners_bracket, m.pool_id))
      .or_default()
      .push(m.position);
  }
  let mut keys: Vec<_> = groups.keys().copied().collect();
  keys.sort_unstable();
  for key in keys {
    let mut positions = groups.remove(&key).unwrap_or_default();
    positions.sort_unstable();
    let expected: Vec<u32> = (0..positions.len() as u32).collect();
    if positions != expected {
      problems.push(format!(
        "round {} positions are not contiguous from 0",
        key.0
      ));
    }
  }
}
