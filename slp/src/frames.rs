//! A frame-indexed view of a replay, assembled from decoded events.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::events::{
    Event, FrameBookend, FrameStart, GameEnd, GameStart, ItemUpdate, PLAYER_TYPE_EMPTY, PlayerSlot, PostFrameUpdate,
    PreFrameUpdate,
};

/// The first frame of every game; frames count up from here through the
/// countdown to frame zero.
pub const FIRST_FRAME: i32 = -123;

/// Number of controller ports.
pub const MAX_PLAYERS: usize = 4;

/// Game-wide settings, derived from the game start record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub slp_version: Option<String>,
    pub is_teams: Option<bool>,
    pub stage_id: Option<u16>,
    pub starting_timer_seconds: Option<u32>,
    /// Occupied ports only.
    pub players: Vec<PlayerSlot>,
    pub random_seed: Option<u32>,
    pub is_pal: Option<bool>,
    pub is_frozen_ps: Option<bool>,
}

impl From<&GameStart> for GameSettings {
    fn from(start: &GameStart) -> Self {
        let players = start
            .slots
            .iter()
            .filter(|slot| slot.player_type.is_some_and(|kind| kind != PLAYER_TYPE_EMPTY))
            .cloned()
            .collect();

        Self {
            slp_version: start.slp_version.clone(),
            is_teams: start.is_teams,
            stage_id: start.stage_id,
            starting_timer_seconds: start.starting_timer_seconds,
            players,
            random_seed: start.random_seed,
            is_pal: start.is_pal,
            is_frozen_ps: start.is_frozen_ps,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlayerFrame {
    pub pre: Option<PreFrameUpdate>,
    pub post: Option<PostFrameUpdate>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub frame: i32,
    pub start: Option<FrameStart>,
    pub players: [Option<PlayerFrame>; MAX_PLAYERS],
    /// Secondary characters (Nana) are tracked separately from their leader.
    pub followers: [Option<PlayerFrame>; MAX_PLAYERS],
    pub items: Vec<ItemUpdate>,
    pub bookend: Option<FrameBookend>,
}

impl Frame {
    fn new(frame: i32) -> Self {
        Self {
            frame,
            start: None,
            players: Default::default(),
            followers: Default::default(),
            items: Vec::new(),
            bookend: None,
        }
    }

    /// Post-frame state for the leader character in `player_index`.
    pub fn post(&self, player_index: u8) -> Option<&PostFrameUpdate> {
        self.players.get(player_index as usize)?.as_ref()?.post.as_ref()
    }

    fn slot(&mut self, player_index: u8, is_follower: bool) -> Option<&mut PlayerFrame> {
        let slots = match is_follower {
            true => &mut self.followers,
            false => &mut self.players,
        };

        Some(slots.get_mut(player_index as usize)?.get_or_insert_with(PlayerFrame::default))
    }
}

/// Everything decoded from a replay so far, keyed by frame number.
///
/// Applying an event twice leaves the store unchanged, so a reader that
/// resumes from a previously returned position can feed the same store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStore {
    settings: Option<GameSettings>,
    frames: BTreeMap<i32, Frame>,
    game_end: Option<GameEnd>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a decoded event into the store. Events that don't carry a usable
    /// frame number or player index are ignored.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::GameStart(start) => {
                self.settings = Some(GameSettings::from(start));
            },

            Event::PreFrameUpdate(update) => {
                let (Some(frame), Some(index)) = (update.frame, update.player_index) else {
                    return;
                };

                let is_follower = update.is_follower.unwrap_or(false);
                if let Some(slot) = self.frame_mut(frame).slot(index, is_follower) {
                    slot.pre = Some(update.clone());
                }
            },

            Event::PostFrameUpdate(update) => {
                let (Some(frame), Some(index)) = (update.frame, update.player_index) else {
                    return;
                };

                let is_follower = update.is_follower.unwrap_or(false);
                if let Some(slot) = self.frame_mut(frame).slot(index, is_follower) {
                    slot.post = Some(update.clone());
                }
            },

            Event::FrameStart(start) => {
                if let Some(frame) = start.frame {
                    self.frame_mut(frame).start = Some(start.clone());
                }
            },

            Event::ItemUpdate(item) => {
                let Some(frame) = item.frame else {
                    return;
                };

                let items = &mut self.frame_mut(frame).items;
                // Items without a spawn id can only be matched on their whole update.
                let existing = match item.spawn_id {
                    Some(spawn_id) => items.iter().position(|known| known.spawn_id == Some(spawn_id)),
                    None => items.iter().position(|known| known == item),
                };

                match existing {
                    Some(index) => items[index] = item.clone(),
                    None => items.push(item.clone()),
                }
            },

            Event::FrameBookend(bookend) => {
                if let Some(frame) = bookend.frame {
                    self.frame_mut(frame).bookend = Some(bookend.clone());
                }
            },

            Event::GameEnd(end) => {
                self.game_end = Some(end.clone());
            },

            Event::MessageSizes | Event::GeckoList(_) | Event::Other { .. } => {},
        }
    }

    fn frame_mut(&mut self, frame: i32) -> &mut Frame {
        self.frames.entry(frame).or_insert_with(|| Frame::new(frame))
    }

    pub fn settings(&self) -> Option<&GameSettings> {
        self.settings.as_ref()
    }

    pub fn game_end(&self) -> Option<&GameEnd> {
        self.game_end.as_ref()
    }

    pub fn frame(&self, frame: i32) -> Option<&Frame> {
        self.frames.get(&frame)
    }

    /// All stored frames, keyed by frame number.
    pub fn frames(&self) -> &BTreeMap<i32, Frame> {
        &self.frames
    }

    /// Frames in playback order: starting at `FIRST_FRAME` and stopping at the
    /// first gap.
    pub fn frames_in_order(&self) -> impl Iterator<Item = &Frame> + '_ {
        (FIRST_FRAME..).map_while(move |frame| self.frames.get(&frame))
    }

    /// The highest frame number present.
    pub fn latest_frame(&self) -> Option<i32> {
        self.frames.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
