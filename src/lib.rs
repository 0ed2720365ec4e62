pub mod types;
pub mod config;
pub mod seeding;
pub mod round_robin;
pub mod single_elim;
pub mod double_elim;
pub mod pool_play;
pub mod validate;
pub mod generate;
pub mod store;

pub use generate::generate;
pub use store::{StoredTournament, TournamentStore};
pub use types::{
    Format, GeneratedBracket, Match, MatchUpdate, Outcome, Pool, SharedTournamentStore,
    StageConfig, Team, TeamStanding,
};

use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;

use config::repo_root;

/// Initialize tracing with file + stderr output. The returned guard must
/// stay alive for the duration of the process or buffered log lines are
/// dropped.
pub fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let logs_dir = repo_root().join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "engine.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Courtside bracket engine starting");
    guard
}
