use std::collections::HashMap;

use crate::seeding::plan_first_round;
use crate::single_elim::{advance_byes, build_winners_rounds};
use crate::types::{BracketSide, Match, MatchRef, StageConfig, Team};

/// Winners bracket identical to single elimination, a losers bracket of
/// alternating drop-in and consolidation rounds, and one grand-final match
/// fed by both bracket champions.
///
/// Progression wiring is computed as typed MatchRef coordinates and
/// resolved to concrete match ids through a table built here, so every
/// stored pointer is guaranteed to name a match that exists. Winners-side
/// advancement itself carries no pointer: the store applies the
/// `round + 1, position / 2` parity rule, which also lands the winners
/// champion in the grand final (round `total_winner_rounds`, position 0).
pub fn generate_double_elimination(teams: &[Team], stage: &StageConfig) -> Vec<Match> {
  let plan = plan_first_round(teams);
  if plan.is_degenerate() {
    return Vec::new();
  }
  let winner_rounds = plan.total_rounds;
  let bracket_size = plan.bracket_size;
  let losers_total = losers_round_total(winner_rounds);

  let mut next_id = 1u64;
  let mut matches = build_winners_rounds(&plan, stage, &mut next_id);
  advance_byes(&mut matches);

  let mut table: HashMap<MatchRef, u64> = HashMap::new();
  for m in &matches {
    table.insert(MatchRef::new(BracketSide::Winners, m.round, m.position), m.id);
  }

  for round in 0..losers_total {
    let remaining = losers_total - 1 - round;
    let best_of = stage.games_from_final(remaining);
    let points = stage.points_from_final(remaining);
    for position in 0..losers_round_count(bracket_size, round) {
      let m = Match::empty(next_id, round, position as u32, best_of, points);
      table.insert(MatchRef::new(BracketSide::Losers, round, position as u32), m.id);
      next_id += 1;
      matches.push(m);
    }
  }

  let mut grand_final = Match::empty(
    next_id,
    winner_rounds,
    0,
    stage.games_from_final(0),
    stage.points_from_final(0),
  );
  grand_final.is_winners_bracket = true;
  table.insert(MatchRef::new(BracketSide::GrandFinal, 0, 0), grand_final.id);
  matches.push(grand_final);

  wire_progression(&mut matches, &table, losers_total);
  matches
}

/// Two losers rounds per winners round after the first: a drop-in round
/// that receives that winners round's losers, and a consolidation round
/// that halves the survivors. A two-team bracket has no losers rounds at
/// all; its only loser goes straight to the grand final.
fn losers_round_total(winner_rounds: u32) -> u32 {
  if winner_rounds < 2 {
    0
  } else {
    2 * (winner_rounds - 1)
  }
}

fn losers_round_count(bracket_size: usize, round: u32) -> usize {
  if round == 0 {
    bracket_size >> 2
  } else if round % 2 == 1 {
    // Drop-in round for winners round (round + 1) / 2.
    let feeding = (round + 1) / 2;
    bracket_size >> (feeding + 1)
  } else {
    let feeding = round / 2;
    bracket_size >> (feeding + 2)
  }
}

fn wire_progression(matches: &mut [Match], table: &HashMap<MatchRef, u64>, losers_total: u32) {
  let grand_final_id = table[&MatchRef::new(BracketSide::GrandFinal, 0, 0)];

  for m in matches.iter_mut() {
    if m.id == grand_final_id {
      continue;
    }
    if m.is_winners_bracket {
      if m.is_bye {
        continue;
      }
      let target = if losers_total == 0 {
        MatchRef::new(BracketSide::GrandFinal, 0, 0)
      } else if m.round == 0 {
        MatchRef::new(BracketSide::Losers, 0, m.position / 2)
      } else {
        MatchRef::new(BracketSide::Losers, m.round * 2 - 1, m.position)
      };
      m.loser_goes_to = table.get(&target).copied();
    } else {
      let target = if m.round + 1 == losers_total {
        MatchRef::new(BracketSide::GrandFinal, 0, 0)
      } else if m.round % 2 == 0 {
        // Consolidation survivors hold their position into the next
        // drop-in round.
        MatchRef::new(BracketSide::Losers, m.round + 1, m.position)
      } else {
        MatchRef::new(BracketSide::Losers, m.round + 1, m.position / 2)
      };
      m.winner_goes_to = table.get(&target).copied();
    }
  }
}
