use std::collections::HashSet;

use serde_json::json;
use tracing::{info, warn};

use crate::config::{append_generation_log, load_config_inner};
use crate::double_elim::generate_double_elimination;
use crate::pool_play::generate_pool_play;
use crate::round_robin::generate_round_robin;
use crate::single_elim::generate_single_elimination;
use crate::types::{
  Format, GeneratedBracket, StageConfig, Team, MAX_POOL_COUNT,
};
use crate::validate::{normalize_rounds, validate};

/// Generate the complete match list for one category. Invalid input comes
/// back as the Err message list; structural findings ride along as
/// warnings on an otherwise usable output. Fewer than two teams is a valid
/// degenerate result (no rounds, no matches), so a caller can render
/// "cannot start" without special-casing an error.
pub fn generate(
  teams: &[Team],
  format: Format,
  stage: &StageConfig,
) -> Result<GeneratedBracket, Vec<String>> {
  let errors = check_input(teams, format, stage);
  if !errors.is_empty() {
    return Err(errors);
  }

  let (mut matches, pools, annotated) = match format {
    Format::SingleElimination => (generate_single_elimination(teams, stage), Vec::new(), teams.to_vec()),
    Format::DoubleElimination => (generate_double_elimination(teams, stage), Vec::new(), teams.to_vec()),
    Format::RoundRobin => (generate_round_robin(teams, stage), Vec::new(), teams.to_vec()),
    Format::PoolPlay => {
      let output = generate_pool_play(teams, stage);
      (output.matches, output.pools, output.teams)
    }
  };

  let total_rounds = normalize_rounds(&mut matches);
  let warnings = validate(&matches);
  for warning in &warnings {
    warn!("bracket validation: {warning}");
  }
  info!(
    format = format.label(),
    teams = teams.len(),
    matches = matches.len(),
    total_rounds,
    "generated bracket"
  );
  log_generation(format, teams.len(), &matches, total_rounds);

  Ok(GeneratedBracket {
    matches,
    total_rounds,
    pools,
    teams: annotated,
    warnings,
  })
}

fn check_input(teams: &[Team], format: Format, stage: &StageConfig) -> Vec<String> {
  let mut errors = Vec::new();

  let mut seen = HashSet::new();
  for team in teams {
    if !seen.insert(team.id) {
      errors.push(format!("duplicate team id {}", team.id));
    }
  }

  if format == Format::PoolPlay {
    if stage.number_of_pools == 0 {
      errors.push("numberOfPools must be at least 1 for pool play".to_string());
    } else if stage.number_of_pools > MAX_POOL_COUNT {
      errors.push(format!(
        "numberOfPools {} exceeds the maximum of {MAX_POOL_COUNT}",
        stage.number_of_pools
      ));
    } else if (teams.len() as u32) < stage.number_of_pools * 2 {
      errors.push(format!(
        "pool play needs at least {} teams for {} pools",
        stage.number_of_pools * 2,
        stage.number_of_pools
      ));
    }
  }

  errors
}

fn log_generation(format: Format, team_count: usize, matches: &[crate::types::Match], total_rounds: u32) {
  let should_log = load_config_inner()
    .map(|config| config.log_generation)
    .unwrap_or(false);
  if !should_log {
    return;
  }
  let summary = json!({
    "format": format.label(),
    "teams": team_count,
    "matches": matches.len(),
    "totalRounds": total_rounds,
    "byes": matches.iter().filter(|m| m.is_bye).count(),
  });
  append_generation_log(format.label(), &summary.to_string());
}
