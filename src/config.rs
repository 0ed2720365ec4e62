use crate::types::EngineConfig;
use chrono::Local;
use std::{env, fs, io::Write, path::PathBuf};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn config_path() -> PathBuf {
  if let Ok(raw) = env::var("COURTSIDE_CONFIG_PATH") {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return PathBuf::from(trimmed);
    }
  }
  repo_root().join("config.json")
}

pub fn env_u32(key: &str) -> Option<u32> {
  env::var(key)
    .ok()
    .and_then(|value| value.trim().parse::<u32>().ok())
}

pub fn env_flag_true(key: &str) -> bool {
  match env::var(key) {
    Ok(value) => {
      let value = value.trim().to_ascii_lowercase();
      matches!(value.as_str(), "1" | "true" | "yes" | "on")
    }
    Err(_) => false,
  }
}

pub fn apply_env_overrides(mut config: EngineConfig) -> EngineConfig {
  let stage = &mut config.stage;
  if let Some(value) = env_u32("COURTSIDE_EARLY_ROUND_GAMES") {
    stage.early_round_games = value;
  }
  if let Some(value) = env_u32("COURTSIDE_QUARTER_FINAL_GAMES") {
    stage.quarter_final_games = value;
  }
  if let Some(value) = env_u32("COURTSIDE_SEMI_FINAL_GAMES") {
    stage.semi_final_games = value;
  }
  if let Some(value) = env_u32("COURTSIDE_FINAL_GAMES") {
    stage.final_games = value;
  }
  if let Some(value) = env_u32("COURTSIDE_EARLY_ROUND_POINTS") {
    stage.early_round_points = value;
  }
  if let Some(value) = env_u32("COURTSIDE_QUARTER_FINAL_POINTS") {
    stage.quarter_final_points = value;
  }
  if let Some(value) = env_u32("COURTSIDE_SEMI_FINAL_POINTS") {
    stage.semi_final_points = value;
  }
  if let Some(value) = env_u32("COURTSIDE_FINAL_POINTS") {
    stage.final_points = value;
  }
  if let Some(value) = env_u32("COURTSIDE_NUMBER_OF_POOLS") {
    stage.number_of_pools = value;
  }
  if env_flag_true("COURTSIDE_LOG_GENERATION") {
    config.log_generation = true;
  }
  config
}

pub fn load_config_inner() -> Result<EngineConfig, String> {
  let path = config_path();
  if !path.is_file() {
    return Ok(apply_env_overrides(EngineConfig::default()));
  }
  let data = fs::read_to_string(&path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config =
    serde_json::from_str::<EngineConfig>(&data).map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_overrides(config))
}

pub fn save_config_inner(config: EngineConfig) -> Result<EngineConfig, String> {
  let path = config_path();
  let payload = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
  fs::write(&path, payload).map_err(|e| format!("write config {}: {e}", path.display()))?;
  Ok(config)
}

pub fn generation_log_path() -> PathBuf {
  repo_root().join("logs").join("generation.log")
}

/// Audit trail for generate/regenerate actions, one timestamped entry per
/// call. Separate from the tracing output so it survives filter changes.
pub fn append_generation_log(label: &str, payload: &str) {
  let dir = repo_root().join("logs");
  if fs::create_dir_all(&dir).is_err() {
    return;
  }
  let path = generation_log_path();
  let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
  let entry = format!("[{timestamp}] {label}\n{payload}\n\n");
  if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(&path) {
    let _ = file.write_all(entry.as_bytes());
  }
}

/// Parse a decimal-string skill rating ("4.5"). Whitespace tolerated,
/// anything unparseable is treated as unrated.
pub fn parse_rating(raw: &str) -> Option<f64> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }
  trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn pool_name(pool_id: u32) -> String {
  if pool_id < 26 {
    let letter = (b'A' + pool_id as u8) as char;
    format!("Pool {letter}")
  } else {
    format!("Pool {}", pool_id + 1)
  }
}
