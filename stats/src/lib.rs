//! Frame analytics for singles replays: stocks, punishes, and how each punish
//! was opened.
//!
//! Every pass walks the frames of a [`FrameStore`] in order, once per direction
//! of the two player pairing. Games with any other player count produce no
//! results.

use slippi_slp::FrameStore;

pub mod common;

mod config;
pub use config::{PUNISH_RESET_FRAMES, StatsConfig, StatsConfigError, StatsConfigOverrides};

mod opening;

mod punishes;
pub use punishes::{OpeningType, Punish};

mod stocks;
pub use stocks::{Stock, compute_stocks};

#[cfg(test)]
mod testing;

/// Every punish in the game, each labeled with its [`OpeningType`].
pub fn compute_punishes(store: &FrameStore, config: &StatsConfig) -> Vec<Punish> {
    let mut punishes = punishes::collect_punishes(store, config);
    opening::classify_openings(store, &mut punishes);
    punishes
}
