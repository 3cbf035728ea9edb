use thiserror::Error;

use slippi_slp::SlpError;
use slippi_stats::StatsConfigError;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Failed to read replay: {0}")]
    Slp(#[from] SlpError),

    #[error("{0}")]
    Config(#[from] StatsConfigError),
}
