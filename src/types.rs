use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::store::TournamentStore;

// ── Constants ──────────────────────────────────────────────────────────

/// Round numbers at or above this value belong to the knockout stage that
/// follows pool play; pool-local rounds stay below it.
pub const KNOCKOUT_ROUND_BASE: u32 = 100;

/// Upper bound on pools per category. Anything larger is a config mistake.
pub const MAX_POOL_COUNT: u32 = 16;

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedTournamentStore = Arc<Mutex<TournamentStore>>;

// ── Teams ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub seed: Option<u32>,
    /// Skill rating as a decimal string, e.g. "4.5".
    pub rating: Option<String>,
    #[serde(default)]
    pub players: Vec<String>,
    /// Attached by the pool-play orchestrator on a derived copy only.
    pub pool_id: Option<u32>,
    pub gender: Option<String>,
    pub age_group: Option<String>,
}

impl Team {
    pub fn new(id: u32, name: &str) -> Self {
        Team {
            id,
            name: name.to_string(),
            seed: None,
            rating: None,
            players: Vec::new(),
            pool_id: None,
            gender: None,
            age_group: None,
        }
    }

    pub fn seeded(id: u32, name: &str, seed: u32) -> Self {
        Team {
            seed: Some(seed),
            ..Team::new(id, name)
        }
    }
}

// ── Match outcome ──────────────────────────────────────────────────────

/// Result of a match. "No result yet" and "drawn series" are distinct
/// states, never a null-with-sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "teamId")]
pub enum Outcome {
    Pending,
    Decided(u32),
    Tied,
}

impl Outcome {
    pub fn winner_id(&self) -> Option<u32> {
        match self {
            Outcome::Decided(id) => Some(*id),
            Outcome::Pending | Outcome::Tied => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

// ── Matches ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: u64,
    pub round: u32,
    /// 0-based slot within the round; progression math depends on it.
    pub position: u32,
    pub team1_id: Option<u32>,
    pub team2_id: Option<u32>,
    pub team1_games: Vec<u32>,
    pub team2_games: Vec<u32>,
    pub best_of: u32,
    pub points_to_win: u32,
    pub outcome: Outcome,
    pub completed: bool,
    pub is_bye: bool,
    pub is_winners_bracket: bool,
    pub is_knockout: bool,
    /// Match ids resolved at generation time through the MatchRef table.
    pub winner_goes_to: Option<u64>,
    pub loser_goes_to: Option<u64>,
    pub pool_id: Option<u32>,
}

impl Match {
    pub fn empty(id: u64, round: u32, position: u32, best_of: u32, points_to_win: u32) -> Self {
        Match {
            id,
            round,
            position,
            team1_id: None,
            team2_id: None,
            team1_games: vec![0; best_of as usize],
            team2_games: vec![0; best_of as usize],
            best_of,
            points_to_win,
            outcome: Outcome::Pending,
            completed: false,
            is_bye: false,
            is_winners_bracket: false,
            is_knockout: false,
            winner_goes_to: None,
            loser_goes_to: None,
            pool_id: None,
        }
    }

    pub fn team_count(&self) -> usize {
        self.team1_id.iter().count() + self.team2_id.iter().count()
    }
}

// ── Progression addressing ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BracketSide {
    Winners,
    Losers,
    GrandFinal,
    Knockout,
}

/// Typed coordinate of a match inside one generation. Progression targets
/// are computed as refs and resolved to concrete match ids through a
/// lookup table built once per generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchRef {
    pub side: BracketSide,
    pub round: u32,
    pub position: u32,
}

impl MatchRef {
    pub fn new(side: BracketSide, round: u32, position: u32) -> Self {
        MatchRef { side, round, position }
    }
}

// ── Formats ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    PoolPlay,
}

impl Format {
    pub fn label(&self) -> &'static str {
        match self {
            Format::SingleElimination => "single_elimination",
            Format::DoubleElimination => "double_elimination",
            Format::RoundRobin => "round_robin",
            Format::PoolPlay => "pool_play",
        }
    }
}

// ── Stage configuration ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageConfig {
    pub early_round_games: u32,
    pub quarter_final_games: u32,
    pub semi_final_games: u32,
    pub final_games: u32,
    pub early_round_points: u32,
    pub quarter_final_points: u32,
    pub semi_final_points: u32,
    pub final_points: u32,
    pub number_of_pools: u32,
}

impl Default for StageConfig {
    fn default() -> Self {
        StageConfig {
            early_round_games: 1,
            quarter_final_games: 1,
            semi_final_games: 3,
            final_games: 3,
            early_round_points: 11,
            quarter_final_points: 11,
            semi_final_points: 11,
            final_points: 15,
            number_of_pools: 2,
        }
    }
}

impl StageConfig {
    /// Per-stage game count, counting backward from the final:
    /// 0 = final, 1 = semifinal, 2 = quarterfinal, earlier = early rounds.
    pub fn games_from_final(&self, rounds_remaining: u32) -> u32 {
        match rounds_remaining {
            0 => self.final_games,
            1 => self.semi_final_games,
            2 => self.quarter_final_games,
            _ => self.early_round_games,
        }
    }

    pub fn points_from_final(&self, rounds_remaining: u32) -> u32 {
        match rounds_remaining {
            0 => self.final_points,
            1 => self.semi_final_points,
            2 => self.quarter_final_points,
            _ => self.early_round_points,
        }
    }
}

// ── Engine configuration ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub stage: StageConfig,
    /// Append a line to logs/generation.log for every generation call.
    pub log_generation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            stage: StageConfig::default(),
            log_generation: false,
        }
    }
}

// ── Generation output ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: u32,
    pub name: String,
    pub team_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBracket {
    pub matches: Vec<Match>,
    /// Count of dense rounds below KNOCKOUT_ROUND_BASE.
    pub total_rounds: u32,
    /// Pool play only; empty for the other formats.
    pub pools: Vec<Pool>,
    /// Team copies handed back to the caller; pool play annotates pool_id.
    pub teams: Vec<Team>,
    /// Structural validator findings. Non-empty output should not be
    /// persisted as an official bracket until these are resolved.
    pub warnings: Vec<String>,
}

// ── Store update types ─────────────────────────────────────────────────

/// Partial per-match update. None fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchUpdate {
    pub team1_id: Option<u32>,
    pub team2_id: Option<u32>,
    pub team1_games: Option<Vec<u32>>,
    pub team2_games: Option<Vec<u32>>,
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub team_id: u32,
    pub wins: u32,
    pub ties: u32,
    pub losses: u32,
    pub game_diff: i64,
    pub point_diff: i64,
}
