//! A single replay, loaded on demand.
//!
//! `SlippiGame` never holds the source open between calls. Every query reopens
//! the input, reads whatever was appended since the last query, and closes it
//! again, so a replay that's still being written can be polled for new frames.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use serde::Serialize;

use slippi_slp::events::GameEnd;
use slippi_slp::{Container, Frame, FrameStore, GameSettings, HaltReason, Log, Metadata, SlpInput};
use slippi_stats::{Punish, StatsConfig, Stock, compute_punishes, compute_stocks};

mod errors;
pub use errors::GameError;

pub(crate) type Result<T> = std::result::Result<T, GameError>;

/// Knobs for a [`SlippiGame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameOptions {
    pub stats: StatsConfig,
}

impl GameOptions {
    /// Defaults, overridden by anything set in the `contents` TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(Self {
            stats: StatsConfig::from_toml_str(contents)?,
        })
    }

    /// Defaults, overridden by anything set in the environment.
    pub fn from_env() -> Self {
        Self {
            stats: StatsConfig::from_env(),
        }
    }
}

/// Everything derived from the frames of a game, in one place.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub last_frame: Option<i32>,
    pub stocks: Vec<Stock>,
    pub punishes: Vec<Punish>,
}

#[derive(Debug)]
pub struct SlippiGame {
    input: SlpInput,
    options: GameOptions,
    store: FrameStore,
    /// Where the next read picks up. `None` until the first pass.
    read_position: Option<u64>,
    metadata: Option<Metadata>,
}

impl SlippiGame {
    /// Wraps `input` with default options. Nothing is read until the first query.
    pub fn open(input: impl Into<SlpInput>) -> Self {
        Self::with_options(input, GameOptions::default())
    }

    pub fn with_options(input: impl Into<SlpInput>, options: GameOptions) -> Self {
        Self {
            input: input.into(),
            options,
            store: FrameStore::new(),
            read_position: None,
            metadata: None,
        }
    }

    pub fn options(&self) -> &GameOptions {
        &self.options
    }

    /// The frames read so far, without reading anything new.
    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn read_position(&self) -> Option<u64> {
        self.read_position
    }

    /// Reads any events written since the last pass into the frame store.
    fn process(&mut self) -> Result<()> {
        let container = Container::open(&self.input)?;

        // A freshly created capture has no bytes yet, so its layout can't be
        // known. Read it again from scratch next time.
        if container.source().is_empty()? {
            container.close();
            return Ok(());
        }

        let store = &mut self.store;
        let outcome = container.iterate(self.read_position, |_, event| {
            store.apply(event);
            ControlFlow::Continue(())
        });

        container.close();
        let outcome = outcome?;

        match outcome.halt {
            HaltReason::EndOfStream | HaltReason::Stopped => {},

            halt => {
                tracing::debug!(
                    target: Log::SlpGame,
                    ?halt,
                    position = outcome.position,
                    "Replay read stopped early, will resume from here"
                );
            },
        }

        self.read_position = Some(outcome.position);
        Ok(())
    }

    pub fn get_settings(&mut self) -> Result<Option<&GameSettings>> {
        self.process()?;
        Ok(self.store.settings())
    }

    /// The decoded metadata block. Once one has been read it's kept, since a
    /// finished replay never rewrites it.
    pub fn get_metadata(&mut self) -> Result<Option<&Metadata>> {
        if self.metadata.is_none() {
            let container = Container::open(&self.input)?;
            let metadata = container.metadata();
            container.close();

            self.metadata = metadata?;
        }

        Ok(self.metadata.as_ref())
    }

    /// The highest numbered frame read so far.
    pub fn get_latest_frame(&mut self) -> Result<Option<&Frame>> {
        self.process()?;
        Ok(self.store.latest_frame().and_then(|frame| self.store.frame(frame)))
    }

    pub fn get_frames(&mut self) -> Result<&BTreeMap<i32, Frame>> {
        self.process()?;
        Ok(self.store.frames())
    }

    pub fn get_game_end(&mut self) -> Result<Option<&GameEnd>> {
        self.process()?;
        Ok(self.store.game_end())
    }

    pub fn get_stocks(&mut self) -> Result<Vec<Stock>> {
        self.process()?;
        Ok(compute_stocks(&self.store))
    }

    pub fn get_punishes(&mut self) -> Result<Vec<Punish>> {
        self.process()?;
        Ok(compute_punishes(&self.store, &self.options.stats))
    }

    pub fn get_stats(&mut self) -> Result<GameStats> {
        self.process()?;

        let stats = GameStats {
            last_frame: self.store.latest_frame(),
            stocks: compute_stocks(&self.store),
            punishes: compute_punishes(&self.store, &self.options.stats),
        };

        tracing::info!(
            target: Log::SlpGame,
            last_frame = ?stats.last_frame,
            stocks = stats.stocks.len(),
            punishes = stats.punishes.len(),
            "Computed game stats"
        );

        Ok(stats)
    }
}
