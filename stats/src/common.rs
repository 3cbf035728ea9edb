//! Shared pieces of the analytics passes: action state ranges, player pairing,
//! and the per-pair frame walk.

use slippi_slp::events::PostFrameUpdate;
use slippi_slp::{Frame, FrameStore, GameSettings, Log};

/// Action state id ranges (inclusive).
pub mod state {
    pub const DYING_START: u16 = 0x00;
    pub const DYING_END: u16 = 0x0A;
    pub const GROUNDED_CONTROL_START: u16 = 0x0E;
    pub const GROUNDED_CONTROL_END: u16 = 0x18;
    pub const SQUAT_START: u16 = 0x27;
    pub const SQUAT_END: u16 = 0x29;
    pub const DAMAGE_START: u16 = 0x4B;
    pub const DAMAGE_END: u16 = 0x5B;
    pub const CAPTURE_START: u16 = 0xDF;
    pub const CAPTURE_END: u16 = 0xE8;
}

pub fn is_dead(action_state: u16) -> bool {
    (state::DYING_START..=state::DYING_END).contains(&action_state)
}

pub fn is_damaged(action_state: u16) -> bool {
    (state::DAMAGE_START..=state::DAMAGE_END).contains(&action_state)
}

pub fn is_grabbed(action_state: u16) -> bool {
    (state::CAPTURE_START..=state::CAPTURE_END).contains(&action_state)
}

/// Standing, walking, turning, crouching - anything where the character can act freely.
pub fn is_in_control(action_state: u16) -> bool {
    (state::GROUNDED_CONTROL_START..=state::GROUNDED_CONTROL_END).contains(&action_state)
        || (state::SQUAT_START..=state::SQUAT_END).contains(&action_state)
}

/// One direction of a two player pairing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayerIndices {
    pub player_index: u8,
    pub opponent_index: u8,
}

/// Both directions of the pairing for a singles game. Any other player count
/// has no pairing.
pub fn singles_indices(settings: &GameSettings) -> Vec<PlayerIndices> {
    let [first, second] = settings.players.as_slice() else {
        return Vec::new();
    };

    vec![
        PlayerIndices {
            player_index: first.player_index,
            opponent_index: second.player_index,
        },
        PlayerIndices {
            player_index: second.player_index,
            opponent_index: first.player_index,
        },
    ]
}

/// Percent on a frame, treating anything missing as zero.
pub fn percent(post: Option<&PostFrameUpdate>) -> f32 {
    post.and_then(|post| post.percent).unwrap_or(0.0)
}

/// Damage taken between `previous` and `current`. A missing previous frame counts as 0%.
pub fn damage_taken(current: &PostFrameUpdate, previous: Option<&PostFrameUpdate>) -> f32 {
    percent(Some(current)) - percent(previous)
}

/// Whether stocks remaining dropped since `previous`. Without both values to
/// compare, nothing was lost.
pub fn did_lose_stock(current: &PostFrameUpdate, previous: Option<&PostFrameUpdate>) -> bool {
    match (previous.and_then(|post| post.stocks_remaining), current.stocks_remaining) {
        (Some(before), Some(after)) => before > after,
        _ => false,
    }
}

/// What one direction of a pairing sees on a single frame.
#[derive(Clone, Copy, Debug)]
pub struct PairFrame<'a> {
    pub frame: i32,
    pub player: &'a PostFrameUpdate,
    pub prev_player: Option<&'a PostFrameUpdate>,
    pub opponent: &'a PostFrameUpdate,
    pub prev_opponent: Option<&'a PostFrameUpdate>,
}

impl<'a> PairFrame<'a> {
    fn new(store: &'a FrameStore, indices: PlayerIndices, frame: &'a Frame) -> Option<Self> {
        let previous = store.frame(frame.frame - 1);

        Some(Self {
            frame: frame.frame,
            player: frame.post(indices.player_index)?,
            prev_player: previous.and_then(|previous| previous.post(indices.player_index)),
            opponent: frame.post(indices.opponent_index)?,
            prev_opponent: previous.and_then(|previous| previous.post(indices.opponent_index)),
        })
    }
}

/// A state machine run over one direction of a pairing, one frame at a time.
pub trait PairTracker {
    type Output;

    fn step(&mut self, frame: &PairFrame<'_>);

    fn finish(self) -> Vec<Self::Output>;
}

/// Runs a fresh tracker (built by `init`) over the ordered frames for each
/// direction of the singles pairing and concatenates what they produce.
///
/// Frames where either player has no post-frame state are skipped.
pub fn fold_pairs<T, F>(store: &FrameStore, mut init: F) -> Vec<T::Output>
where
    T: PairTracker,
    F: FnMut(PlayerIndices) -> T,
{
    let Some(settings) = store.settings() else {
        tracing::debug!(target: Log::SlpStats, "No game settings loaded, skipping stats");
        return Vec::new();
    };

    let pairs = singles_indices(settings);
    if pairs.is_empty() {
        tracing::warn!(
            target: Log::SlpStats,
            players = settings.players.len(),
            "Stats are only computed for two player games"
        );
    }

    pairs
        .into_iter()
        .flat_map(|indices| {
            let mut tracker = init(indices);

            for frame in store.frames_in_order() {
                if let Some(view) = PairFrame::new(store, indices, frame) {
                    tracker.step(&view);
                }
            }

            tracker.finish()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ranges_are_inclusive() {
        assert!(is_dead(0x00) && is_dead(0x0A) && !is_dead(0x0B));
        assert!(is_damaged(0x4B) && is_damaged(0x5B) && !is_damaged(0x5C));
        assert!(is_grabbed(0xDF) && is_grabbed(0xE8) && !is_grabbed(0xDE));
        assert!(is_in_control(0x0E) && is_in_control(0x18) && is_in_control(0x28));
        assert!(!is_in_control(0x19) && !is_in_control(0x4B));
    }
}
