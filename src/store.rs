use std::collections::HashMap;
use tracing::{info, warn};

use crate::types::{
    Format, GeneratedBracket, Match, MatchUpdate, Outcome, Pool, Team, TeamStanding,
    KNOCKOUT_ROUND_BASE,
};

/// Where a forwarded team lands in its destination match.
#[derive(Clone, Copy, Debug)]
enum ForwardSlot {
    /// team1 for even source positions, team2 for odd.
    Parity(u32),
    Team1,
    Team2,
}

pub struct StoredTournament {
    pub format: Format,
    pub matches: Vec<Match>,
    pub total_rounds: u32,
    pub teams: Vec<Team>,
    pub pools: Vec<Pool>,
    /// Set once the qualify step has seeded the first knockout round.
    pub knockout_seeded: bool,
    index: HashMap<u64, usize>,
}

impl StoredTournament {
    fn new(format: Format, bracket: GeneratedBracket) -> Self {
        let index = bracket
            .matches
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.id, idx))
            .collect();
        StoredTournament {
            format,
            matches: bracket.matches,
            total_rounds: bracket.total_rounds,
            teams: bracket.teams,
            pools: bracket.pools,
            knockout_seeded: false,
            index,
        }
    }

    pub fn get_match(&self, match_id: u64) -> Option<&Match> {
        self.index.get(&match_id).and_then(|idx| self.matches.get(*idx))
    }
}

/// Explicit per-tournament match store. One instance is shared behind a
/// mutex (SharedTournamentStore); a single writer mutates a given
/// tournament at a time, and every update is keyed by match id so score
/// submissions for different matches never rewrite each other.
#[derive(Default)]
pub struct TournamentStore {
    tournaments: HashMap<String, StoredTournament>,
}

impl TournamentStore {
    pub fn new() -> Self {
        TournamentStore::default()
    }

    /// Persist a generated bracket as the tournament's official match
    /// list. Generation output carrying validator warnings is refused
    /// until the warnings are resolved.
    pub fn insert_bracket(
        &mut self,
        tournament_id: &str,
        format: Format,
        bracket: GeneratedBracket,
    ) -> Result<(), String> {
        if !bracket.warnings.is_empty() {
            return Err(format!(
                "bracket for {tournament_id} has unresolved warnings: {}",
                bracket.warnings.join("; ")
            ));
        }
        let mut tournament = StoredTournament::new(format, bracket);
        sweep_walkovers(&mut tournament);
        info!(
            tournament = tournament_id,
            matches = tournament.matches.len(),
            "stored bracket"
        );
        self.tournaments.insert(tournament_id.to_string(), tournament);
        Ok(())
    }

    pub fn get(&self, tournament_id: &str) -> Option<&StoredTournament> {
        self.tournaments.get(tournament_id)
    }

    pub fn find_match(&self, tournament_id: &str, match_id: u64) -> Option<&Match> {
        self.tournaments
            .get(tournament_id)
            .and_then(|t| t.get_match(match_id))
    }

    /// Raw partial update, no progression. Setting an outcome marks the
    /// match completed when the outcome is settled.
    pub fn apply_match_update(
        &mut self,
        tournament_id: &str,
        match_id: u64,
        update: MatchUpdate,
    ) -> Result<(), String> {
        let tournament = self
            .tournaments
            .get_mut(tournament_id)
            .ok_or_else(|| format!("tournament {tournament_id} not found"))?;
        let idx = tournament
            .index
            .get(&match_id)
            .copied()
            .ok_or_else(|| format!("match {match_id} not found"))?;
        let m = &mut tournament.matches[idx];
        if let Some(team1_id) = update.team1_id {
            m.team1_id = Some(team1_id);
        }
        if let Some(team2_id) = update.team2_id {
            m.team2_id = Some(team2_id);
        }
        if let Some(team1_games) = update.team1_games {
            m.team1_games = team1_games;
        }
        if let Some(team2_games) = update.team2_games {
            m.team2_games = team2_games;
        }
        if let Some(outcome) = update.outcome {
            m.outcome = outcome;
            m.completed = outcome.is_settled();
        }
        Ok(())
    }

    /// Score entry: record the per-game scores, settle the outcome, then
    /// forward the winner (and, in double elimination, the loser) along
    /// the bracket. This is the only path that applies progression.
    pub fn record_result(
        &mut self,
        tournament_id: &str,
        match_id: u64,
        team1_games: &[u32],
        team2_games: &[u32],
    ) -> Result<(), String> {
        let tournament = self
            .tournaments
            .get_mut(tournament_id)
            .ok_or_else(|| format!("tournament {tournament_id} not found"))?;
        let idx = tournament
            .index
            .get(&match_id)
            .copied()
            .ok_or_else(|| format!("match {match_id} not found"))?;

        let outcome = {
            let m = &tournament.matches[idx];
            if m.completed {
                return Err(format!("match {match_id} is already completed"));
            }
            let (Some(team1), Some(team2)) = (m.team1_id, m.team2_id) else {
                return Err(format!("match {match_id} is missing teams"));
            };
            if team1_games.len() != team2_games.len() {
                return Err("game score arrays must have equal length".to_string());
            }
            if team1_games.is_empty() || team1_games.len() > m.best_of as usize {
                return Err(format!(
                    "expected between 1 and {} games, got {}",
                    m.best_of,
                    team1_games.len()
                ));
            }
            settle_series(m, team1, team2, team1_games, team2_games)?
        };

        let m = &mut tournament.matches[idx];
        let played = team1_games.len();
        m.team1_games = pad_games(team1_games, m.best_of);
        m.team2_games = pad_games(team2_games, m.best_of);
        m.outcome = outcome;
        m.completed = true;
        info!(
            tournament = tournament_id,
            match_id,
            games = played,
            "recorded result"
        );

        progress_after_completion(tournament, idx);
        Ok(())
    }

    /// Move the top two finishers of every pool into the first knockout
    /// round, fold-paired so pool winners meet runners-up from the far
    /// end of the draw. Requires every pool match to be completed.
    pub fn qualify_pool_teams(&mut self, tournament_id: &str) -> Result<(), String> {
        let tournament = self
            .tournaments
            .get_mut(tournament_id)
            .ok_or_else(|| format!("tournament {tournament_id} not found"))?;
        if tournament.format != Format::PoolPlay {
            return Err(format!("tournament {tournament_id} has no pool stage"));
        }
        if tournament.knockout_seeded {
            return Err(format!("knockout for {tournament_id} is already seeded"));
        }
        let unfinished = tournament
            .matches
            .iter()
            .filter(|m| m.pool_id.is_some() && !m.completed)
            .count();
        if unfinished > 0 {
            return Err(format!("{unfinished} pool matches are still unplayed"));
        }

        let mut winners = Vec::new();
        let mut runners_up = Vec::new();
        for pool in &tournament.pools {
            let standings = compute_pool_standings(tournament, pool.id);
            if standings.len() < 2 {
                return Err(format!("pool {} has fewer than two teams", pool.id));
            }
            winners.push(standings[0].team_id);
            runners_up.push(standings[1].team_id);
        }
        // Winners first, runners-up after, both in pool order; fold
        // pairing sends each winner against a runner-up from the far end
        // of the draw.
        let advancing: Vec<u32> = winners.into_iter().chain(runners_up).collect();

        let mut first_round: Vec<usize> = tournament
            .matches
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_knockout && m.round == KNOCKOUT_ROUND_BASE)
            .map(|(idx, _)| idx)
            .collect();
        first_round.sort_by_key(|idx| tournament.matches[*idx].position);

        let slot_count = first_round.len() * 2;
        let mut pairs: Vec<(Option<u32>, Option<u32>)> = (0..first_round.len())
            .map(|j| {
                (
                    advancing.get(j).copied(),
                    advancing.get(slot_count - 1 - j).copied(),
                )
            })
            .collect();

        // When the pool count is not a power of two the fold can still
        // pair a winner with its own runner-up; swap runners-up between
        // matches until no match holds two teams from the same pool.
        let pool_of = |team: u32| {
            tournament
                .teams
                .iter()
                .find(|t| t.id == team)
                .and_then(|t| t.pool_id)
        };
        for i in 0..pairs.len() {
            let (Some(a), Some(b)) = pairs[i] else { continue };
            if pool_of(a) != pool_of(b) {
                continue;
            }
            for k in 0..pairs.len() {
                if k == i {
                    continue;
                }
                let (Some(c), Some(d)) = pairs[k] else { continue };
                if pool_of(a) != pool_of(d) && pool_of(c) != pool_of(b) {
                    pairs[i].1 = Some(d);
                    pairs[k].1 = Some(b);
                    break;
                }
            }
        }

        for (idx, (team1, team2)) in first_round.iter().copied().zip(pairs) {
            let m = &mut tournament.matches[idx];
            m.team1_id = team1;
            m.team2_id = team2;
            if let (Some(lone), None) = (team1, team2) {
                m.is_bye = true;
                m.outcome = Outcome::Decided(lone);
                m.completed = true;
            }
        }
        tournament.knockout_seeded = true;

        // Forward knockout byes immediately, the same eager rule the
        // generators apply to round 0.
        let bye_indexes: Vec<usize> = first_round
            .iter()
            .copied()
            .filter(|idx| tournament.matches[*idx].is_bye)
            .collect();
        for idx in bye_indexes {
            progress_after_completion(tournament, idx);
        }
        sweep_walkovers(tournament);
        info!(tournament = tournament_id, "seeded knockout stage from pool standings");
        Ok(())
    }

    pub fn pool_standings(
        &self,
        tournament_id: &str,
        pool_id: u32,
    ) -> Result<Vec<TeamStanding>, String> {
        let tournament = self
            .tournaments
            .get(tournament_id)
            .ok_or_else(|| format!("tournament {tournament_id} not found"))?;
        if !tournament.pools.iter().any(|p| p.id == pool_id) {
            return Err(format!("pool {pool_id} not found in {tournament_id}"));
        }
        Ok(compute_pool_standings(tournament, pool_id))
    }
}

fn pad_games(games: &[u32], best_of: u32) -> Vec<u32> {
    let mut padded = games.to_vec();
    padded.resize(best_of as usize, 0);
    padded
}

/// Decide a best-of series from its game scores. A level series that has
/// used all its games is a tie, which only round-robin style matches may
/// keep; elimination matches must produce a winner.
fn settle_series(
    m: &Match,
    team1: u32,
    team2: u32,
    team1_games: &[u32],
    team2_games: &[u32],
) -> Result<Outcome, String> {
    let mut wins1 = 0u32;
    let mut wins2 = 0u32;
    for (g1, g2) in team1_games.iter().zip(team2_games) {
        if g1 > g2 {
            wins1 += 1;
        } else if g2 > g1 {
            wins2 += 1;
        }
    }
    let needed = m.best_of / 2 + 1;
    let all_played = team1_games.len() == m.best_of as usize;

    if wins1 != wins2 && (wins1.max(wins2) >= needed || all_played) {
        return Ok(if wins1 > wins2 {
            Outcome::Decided(team1)
        } else {
            Outcome::Decided(team2)
        });
    }
    if wins1 == wins2 && all_played {
        if progression_driven(m) {
            return Err(format!("match {} cannot end tied", m.id));
        }
        return Ok(Outcome::Tied);
    }
    Err(format!(
        "match {} series is not decided ({wins1}-{wins2} of best-of-{})",
        m.id, m.best_of
    ))
}

/// Forward this match's winner and loser to wherever the bracket says
/// they go next, then resolve any matches that can no longer receive a
/// second team.
fn progress_after_completion(tournament: &mut StoredTournament, idx: usize) {
    let source = tournament.matches[idx].clone();
    let Some(winner) = source.outcome.winner_id() else {
        sweep_walkovers(tournament);
        return;
    };

    if let Some(target_id) = source.winner_goes_to {
        let slot = winner_slot(&source, tournament.get_match(target_id));
        forward_team(tournament, target_id, winner, slot);
    } else if source.is_winners_bracket {
        if let Some(target_id) = parity_target(tournament, &source) {
            forward_team(tournament, target_id, winner, ForwardSlot::Parity(source.position));
        }
    }

    let loser = [source.team1_id, source.team2_id]
        .into_iter()
        .flatten()
        .find(|id| *id != winner);
    if let (Some(target_id), Some(loser)) = (source.loser_goes_to, loser) {
        let slot = loser_slot(&source, tournament.get_match(target_id));
        forward_team(tournament, target_id, loser, slot);
    }

    sweep_walkovers(tournament);
}

/// Winners-side advancement carries no stored pointer: the winner of
/// round r position p meets its neighbor at round r+1, position p/2.
fn parity_target(tournament: &StoredTournament, source: &Match) -> Option<u64> {
    tournament
        .matches
        .iter()
        .find(|m| {
            m.is_winners_bracket
                && !m.is_knockout
                && m.round == source.round + 1
                && m.position == source.position / 2
        })
        .map(|m| m.id)
}

fn winner_slot(source: &Match, target: Option<&Match>) -> ForwardSlot {
    let Some(target) = target else {
        return ForwardSlot::Parity(source.position);
    };
    if target.is_winners_bracket && !source.is_winners_bracket {
        // Losers champion takes the second seat of the grand final.
        return ForwardSlot::Team2;
    }
    if target.is_knockout {
        return ForwardSlot::Parity(source.position);
    }
    if !source.is_winners_bracket && source.round % 2 == 0 {
        // Consolidation survivors hold position into the drop-in round.
        return ForwardSlot::Team1;
    }
    ForwardSlot::Parity(source.position)
}

fn loser_slot(source: &Match, target: Option<&Match>) -> ForwardSlot {
    match target {
        Some(target) if target.is_winners_bracket => ForwardSlot::Team2, // grand final
        _ if source.round == 0 => ForwardSlot::Parity(source.position),
        _ => ForwardSlot::Team2,
    }
}

fn forward_team(tournament: &mut StoredTournament, target_id: u64, team: u32, slot: ForwardSlot) {
    let Some(idx) = tournament.index.get(&target_id).copied() else {
        warn!(target_id, "progression target missing; dropping forward");
        return;
    };
    let m = &mut tournament.matches[idx];
    let slot_ref = match slot {
        ForwardSlot::Team1 => &mut m.team1_id,
        ForwardSlot::Team2 => &mut m.team2_id,
        ForwardSlot::Parity(position) => {
            if position % 2 == 0 {
                &mut m.team1_id
            } else {
                &mut m.team2_id
            }
        }
    };
    if let Some(existing) = *slot_ref {
        if existing != team {
            warn!(match_id = target_id, existing, team, "overwriting forwarded team");
        }
    }
    *slot_ref = Some(team);
}

/// Byes drain the losers bracket: a match whose remaining feeders can
/// never deliver a second team is settled as a walkover (one team) or
/// closed with no contest (no teams). Runs to a fixpoint because each
/// settlement can starve the next match downstream.
fn sweep_walkovers(tournament: &mut StoredTournament) {
    loop {
        let pending_feeders = count_pending_feeders(tournament);
        let mut resolved = None;
        for (idx, m) in tournament.matches.iter().enumerate() {
            if m.completed || !progression_driven(m) {
                continue;
            }
            if m.is_knockout && !tournament.knockout_seeded {
                continue;
            }
            let pending = pending_feeders.get(&m.id).copied().unwrap_or(0);
            let present = m.team_count();
            if present + pending >= 2 {
                continue;
            }
            if present == 1 || (present == 0 && pending == 0) {
                resolved = Some(idx);
                break;
            }
        }
        let Some(idx) = resolved else {
            return;
        };

        let m = &mut tournament.matches[idx];
        let lone = m.team1_id.or(m.team2_id);
        m.completed = true;
        if let Some(team) = lone {
            m.outcome = Outcome::Decided(team);
            info!(match_id = m.id, team, "walkover: opponent slot can never fill");
            let source = tournament.matches[idx].clone();
            if let Some(target_id) = source.winner_goes_to {
                let slot = winner_slot(&source, tournament.get_match(target_id));
                forward_team(tournament, target_id, team, slot);
            } else if source.is_winners_bracket {
                if let Some(target_id) = parity_target(tournament, &source) {
                    forward_team(tournament, target_id, team, ForwardSlot::Parity(source.position));
                }
            }
        } else {
            info!(match_id = m.id, "closing match with no reachable teams");
        }
    }
}

/// A match participates in the walkover sweep only if progression can
/// feed it: bracket ladders and pointer targets, never round-robin play.
fn progression_driven(m: &Match) -> bool {
    m.is_winners_bracket || m.is_knockout || m.winner_goes_to.is_some()
}

/// Count, per match, the feeders that could still deliver a team: stored
/// pointers plus the winners-side parity ladder.
fn count_pending_feeders(tournament: &StoredTournament) -> HashMap<u64, usize> {
    let mut pending: HashMap<u64, usize> = HashMap::new();
    for m in &tournament.matches {
        if m.completed {
            continue;
        }
        for target in [m.winner_goes_to, m.loser_goes_to].into_iter().flatten() {
            *pending.entry(target).or_insert(0) += 1;
        }
        if m.is_winners_bracket && m.winner_goes_to.is_none() {
            if let Some(target) = parity_target(tournament, m) {
                *pending.entry(target).or_insert(0) += 1;
            }
        }
    }
    pending
}

fn compute_pool_standings(tournament: &StoredTournament, pool_id: u32) -> Vec<TeamStanding> {
    let mut rows: HashMap<u32, TeamStanding> = tournament
        .pools
        .iter()
        .filter(|pool| pool.id == pool_id)
        .flat_map(|pool| pool.team_ids.iter().copied())
        .map(|team_id| {
            (
                team_id,
                TeamStanding {
                    team_id,
                    wins: 0,
                    ties: 0,
                    losses: 0,
                    game_diff: 0,
                    point_diff: 0,
                },
            )
        })
        .collect();

    for m in &tournament.matches {
        if m.pool_id != Some(pool_id) || !m.completed {
            continue;
        }
        let (Some(team1), Some(team2)) = (m.team1_id, m.team2_id) else {
            continue;
        };
        let mut games1 = 0i64;
        let mut games2 = 0i64;
        let mut points1 = 0i64;
        let mut points2 = 0i64;
        for (g1, g2) in m.team1_games.iter().zip(&m.team2_games) {
            points1 += *g1 as i64;
            points2 += *g2 as i64;
            if g1 > g2 {
                games1 += 1;
            } else if g2 > g1 {
                games2 += 1;
            }
        }
        if let Some(row) = rows.get_mut(&team1) {
            row.game_diff += games1 - games2;
            row.point_diff += points1 - points2;
            match m.outcome {
                Outcome::Decided(id) if id == team1 => row.wins += 1,
                Outcome::Decided(_) => row.losses += 1,
                Outcome::Tied => row.ties += 1,
                Outcome::Pending => {}
            }
        }
        if let Some(row) = rows.get_mut(&team2) {
            row.game_diff += games2 - games1;
            row.point_diff += points2 - points1;
            match m.outcome {
                Outcome::Decided(id) if id == team2 => row.wins += 1,
                Outcome::Decided(_) => row.losses += 1,
                Outcome::Tied => row.ties += 1,
                Outcome::Pending => {}
            }
        }
    }

    let seed_of = |team_id: u32| {
        tournament
            .teams
            .iter()
            .find(|t| t.id == team_id)
            .and_then(|t| t.seed)
            .unwrap_or(u32::MAX)
    };
    let mut standings: Vec<TeamStanding> = rows.into_values().collect();
    standings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.game_diff.cmp(&a.game_diff))
            .then(b.point_diff.cmp(&a.point_diff))
            .then(seed_of(a.team_id).cmp(&seed_of(b.team_id)))
            .then(a.team_id.cmp(&b.team_id))
    });
    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate;
    use crate::types::StageConfig;

    fn make_teams(n: u32) -> Vec<Team> {
        (1..=n).map(|i| Team::seeded(i, &format!("Team {i}"), i)).collect()
    }

    /// Every round a single game to 11, so one score line settles a match.
    fn single_game_stage() -> StageConfig {
        StageConfig {
            early_round_games: 1,
            quarter_final_games: 1,
            semi_final_games: 1,
            final_games: 1,
            ..StageConfig::default()
        }
    }

    fn store_with(n: u32, format: Format, stage: &StageConfig) -> TournamentStore {
        let bracket = generate(&make_teams(n), format, stage).unwrap();
        let mut store = TournamentStore::new();
        store.insert_bracket("open-4.5", format, bracket).unwrap();
        store
    }

    fn find_id(store: &TournamentStore, winners: bool, round: u32, position: u32) -> u64 {
        store
            .get("open-4.5")
            .unwrap()
            .matches
            .iter()
            .find(|m| m.is_winners_bracket == winners && m.round == round && m.position == position)
            .unwrap()
            .id
    }

    #[test]
    fn test_find_and_partial_update() {
        let mut store = store_with(4, Format::SingleElimination, &StageConfig::default());
        let id = find_id(&store, true, 0, 0);
        assert!(store.find_match("open-4.5", id).is_some());
        assert!(store.find_match("open-4.5", 9999).is_none());
        assert!(store.find_match("other", id).is_none());

        store
            .apply_match_update(
                "open-4.5",
                id,
                MatchUpdate {
                    outcome: Some(Outcome::Decided(1)),
                    ..MatchUpdate::default()
                },
            )
            .unwrap();
        let m = store.find_match("open-4.5", id).unwrap();
        assert!(m.completed);
        assert_eq!(m.outcome, Outcome::Decided(1));
    }

    #[test]
    fn test_winner_advances_by_parity() {
        // 4 teams: round 0 is (1 v 4) and (2 v 3).
        let mut store = store_with(4, Format::SingleElimination, &single_game_stage());
        let m0 = find_id(&store, true, 0, 0);
        let m1 = find_id(&store, true, 0, 1);
        store.record_result("open-4.5", m0, &[11], &[7]).unwrap();
        store.record_result("open-4.5", m1, &[8], &[11]).unwrap();

        let final_match = store
            .find_match("open-4.5", find_id(&store, true, 1, 0))
            .unwrap();
        assert_eq!(final_match.team1_id, Some(1)); // even position -> team1
        assert_eq!(final_match.team2_id, Some(3)); // odd position -> team2
    }

    #[test]
    fn test_double_completion_rejected() {
        let mut store = store_with(4, Format::SingleElimination, &single_game_stage());
        let id = find_id(&store, true, 0, 0);
        store.record_result("open-4.5", id, &[11], &[3]).unwrap();
        let err = store.record_result("open-4.5", id, &[11], &[3]).unwrap_err();
        assert!(err.contains("already completed"));
    }

    #[test]
    fn test_tie_rejected_in_elimination() {
        // 4 teams puts round 0 at the semifinal stage: best-of-2 here.
        let stage = StageConfig {
            semi_final_games: 2,
            ..single_game_stage()
        };
        let mut store = store_with(4, Format::SingleElimination, &stage);
        let id = find_id(&store, true, 0, 0);
        let err = store
            .record_result("open-4.5", id, &[11, 5], &[9, 11])
            .unwrap_err();
        assert!(err.contains("cannot end tied"));
    }

    #[test]
    fn test_tie_allowed_in_round_robin() {
        let stage = StageConfig {
            early_round_games: 2,
            ..StageConfig::default()
        };
        let mut store = store_with(4, Format::RoundRobin, &stage);
        let id = store.get("open-4.5").unwrap().matches[0].id;
        store.record_result("open-4.5", id, &[11, 5], &[9, 11]).unwrap();
        let m = store.find_match("open-4.5", id).unwrap();
        assert_eq!(m.outcome, Outcome::Tied);
        assert!(m.completed);
    }

    #[test]
    fn test_undecided_series_rejected() {
        // Default config makes a 4-team round 0 a best-of-3 semifinal.
        let mut store = store_with(4, Format::SingleElimination, &StageConfig::default());
        let id = find_id(&store, true, 0, 0);
        let err = store.record_result("open-4.5", id, &[11], &[9]).unwrap_err();
        assert!(err.contains("not decided"));
    }

    #[test]
    fn test_double_elim_loser_drops_and_grand_final_fills() {
        let mut store = store_with(4, Format::DoubleElimination, &single_game_stage());
        let w0 = find_id(&store, true, 0, 0);
        let w1 = find_id(&store, true, 0, 1);
        store.record_result("open-4.5", w0, &[11], &[6]).unwrap(); // 1 beats 4
        store.record_result("open-4.5", w1, &[11], &[8]).unwrap(); // 2 beats 3

        let l0 = store
            .find_match("open-4.5", find_id(&store, false, 0, 0))
            .unwrap();
        assert_eq!(l0.team1_id, Some(4)); // W0 pos 0 loser, even position
        assert_eq!(l0.team2_id, Some(3)); // W0 pos 1 loser, odd position

        let wf = find_id(&store, true, 1, 0);
        store.record_result("open-4.5", wf, &[11], &[4]).unwrap(); // 1 beats 2
        let l0_id = find_id(&store, false, 0, 0);
        store.record_result("open-4.5", l0_id, &[5], &[11]).unwrap(); // 3 beats 4
        let lf = find_id(&store, false, 1, 0);
        let losers_final = store.find_match("open-4.5", lf).unwrap();
        assert_eq!(losers_final.team1_id, Some(3)); // from consolidation round
        assert_eq!(losers_final.team2_id, Some(2)); // dropped from winners final
        store.record_result("open-4.5", lf, &[11], &[9]).unwrap();

        let grand_final = store
            .find_match("open-4.5", find_id(&store, true, 2, 0))
            .unwrap();
        assert_eq!(grand_final.team1_id, Some(1)); // winners champion by parity
        assert_eq!(grand_final.team2_id, Some(3)); // losers champion by pointer
    }

    #[test]
    fn test_bye_starved_losers_match_walks_over() {
        // 5 teams: three byes mean most of losers round 0 can never fill.
        let mut store = store_with(5, Format::DoubleElimination, &single_game_stage());
        let dead = store
            .find_match("open-4.5", find_id(&store, false, 0, 0))
            .unwrap();
        assert!(dead.completed);
        assert_eq!(dead.outcome, Outcome::Pending);

        let w0p3 = find_id(&store, true, 0, 3);
        store.record_result("open-4.5", w0p3, &[11], &[2]).unwrap(); // 4 beats 5
        // 5 lands in L0 pos 1 with no possible opponent and walks over.
        let l0p1 = store
            .find_match("open-4.5", find_id(&store, false, 0, 1))
            .unwrap();
        assert!(l0p1.completed);
        assert_eq!(l0p1.outcome, Outcome::Decided(5));
        // The walkover winner is already waiting in the next losers round.
        let l1p1 = store
            .find_match("open-4.5", find_id(&store, false, 1, 1))
            .unwrap();
        assert_eq!(l1p1.team1_id, Some(5));
    }

    #[test]
    fn test_qualify_requires_finished_pools() {
        let stage = StageConfig {
            number_of_pools: 2,
            ..StageConfig::default()
        };
        let mut store = store_with(8, Format::PoolPlay, &stage);
        let err = store.qualify_pool_teams("open-4.5").unwrap_err();
        assert!(err.contains("unplayed"));
    }

    #[test]
    fn test_qualify_seeds_knockout_from_standings() {
        let stage = StageConfig {
            number_of_pools: 2,
            ..StageConfig::default()
        };
        let mut store = store_with(8, Format::PoolPlay, &stage);

        // Let the lower team id win every pool match.
        let pool_matches: Vec<(u64, u32, u32)> = store
            .get("open-4.5")
            .unwrap()
            .matches
            .iter()
            .filter(|m| m.pool_id.is_some())
            .map(|m| (m.id, m.team1_id.unwrap(), m.team2_id.unwrap()))
            .collect();
        for (id, team1, team2) in pool_matches {
            if team1 < team2 {
                store.record_result("open-4.5", id, &[11], &[5]).unwrap();
            } else {
                store.record_result("open-4.5", id, &[5], &[11]).unwrap();
            }
        }
        store.qualify_pool_teams("open-4.5").unwrap();

        let tournament = store.get("open-4.5").unwrap();
        let first_round: Vec<&Match> = tournament
            .matches
            .iter()
            .filter(|m| m.round == KNOCKOUT_ROUND_BASE)
            .collect();
        assert_eq!(first_round.len(), 2);
        for m in &first_round {
            assert_eq!(m.team_count(), 2);
        }
        // Pool winners are seeds 1 and 2; they land in different matches.
        let standings_a = store.pool_standings("open-4.5", 0).unwrap();
        let standings_b = store.pool_standings("open-4.5", 1).unwrap();
        let winner_a = standings_a[0].team_id;
        let winner_b = standings_b[0].team_id;
        let tournament = store.get("open-4.5").unwrap();
        let match_of = |team: u32| {
            tournament
                .matches
                .iter()
                .find(|m| {
                    m.round == KNOCKOUT_ROUND_BASE
                        && (m.team1_id == Some(team) || m.team2_id == Some(team))
                })
                .map(|m| m.id)
        };
        assert_ne!(match_of(winner_a), match_of(winner_b));

        let err = store.qualify_pool_teams("open-4.5").unwrap_err();
        assert!(err.contains("already seeded"));
    }

    #[test]
    fn test_qualify_avoids_same_pool_rematch_with_odd_pool_count() {
        // 3 pools fold into a bracket of 8; the raw fold would pair the
        // last pool's winner with its own runner-up.
        let stage = StageConfig {
            number_of_pools: 3,
            ..StageConfig::default()
        };
        let mut store = store_with(12, Format::PoolPlay, &stage);

        let pool_matches: Vec<(u64, u32, u32)> = store
            .get("open-4.5")
            .unwrap()
            .matches
            .iter()
            .filter(|m| m.pool_id.is_some())
            .map(|m| (m.id, m.team1_id.unwrap(), m.team2_id.unwrap()))
            .collect();
        for (id, team1, team2) in pool_matches {
            if team1 < team2 {
                store.record_result("open-4.5", id, &[11], &[5]).unwrap();
            } else {
                store.record_result("open-4.5", id, &[5], &[11]).unwrap();
            }
        }
        store.qualify_pool_teams("open-4.5").unwrap();

        let tournament = store.get("open-4.5").unwrap();
        let pool_of = |team: u32| {
            tournament
                .teams
                .iter()
                .find(|t| t.id == team)
                .and_then(|t| t.pool_id)
                .unwrap()
        };
        for m in tournament
            .matches
            .iter()
            .filter(|m| m.round == KNOCKOUT_ROUND_BASE && m.team_count() == 2)
        {
            let team1 = m.team1_id.unwrap();
            let team2 = m.team2_id.unwrap();
            assert_ne!(
                pool_of(team1),
                pool_of(team2),
                "teams {team1} and {team2} share a pool in the first knockout round"
            );
        }
    }

    #[test]
    fn test_standings_rank_by_wins_then_diffs() {
        let stage = StageConfig {
            number_of_pools: 1,
            ..StageConfig::default()
        };
        let bracket = generate(&make_teams(3), Format::PoolPlay, &stage);
        // 3 teams in 1 pool needs no knockout shortage; still generates.
        let bracket = bracket.unwrap();
        let mut store = TournamentStore::new();
        store.insert_bracket("mini", Format::PoolPlay, bracket).unwrap();

        let pool_matches: Vec<(u64, u32, u32)> = store
            .get("mini")
            .unwrap()
            .matches
            .iter()
            .filter(|m| m.pool_id.is_some())
            .map(|m| (m.id, m.team1_id.unwrap(), m.team2_id.unwrap()))
            .collect();
        for (id, team1, team2) in pool_matches {
            // Team 2 beats everyone; otherwise the higher id wins.
            let winner = if team1 == 2 || team2 == 2 { 2 } else { team1.max(team2) };
            if winner == team1 {
                store.record_result("mini", id, &[11], &[1]).unwrap();
            } else {
                store.record_result("mini", id, &[1], &[11]).unwrap();
            }
        }
        let standings = store.pool_standings("mini", 0).unwrap();
        let order: Vec<u32> = standings.iter().map(|s| s.team_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(standings[0].wins, 2);
        assert_eq!(standings[2].losses, 2);
    }

    #[test]
    fn test_warned_bracket_refused() {
        let bracket = GeneratedBracket {
            matches: Vec::new(),
            total_rounds: 0,
            pools: Vec::new(),
            teams: Vec::new(),
            warnings: vec!["round gap".to_string()],
        };
        let mut store = TournamentStore::new();
        let err = store
            .insert_bracket("bad", Format::SingleElimination, bracket)
            .unwrap_err();
        assert!(err.contains("unresolved warnings"));
    }
}
