use std::fmt;

use serde::Serialize;
use slippi_slp::FrameStore;

use crate::common::{
    PairFrame, PairTracker, PlayerIndices, damage_taken, did_lose_stock, fold_pairs, is_damaged, is_grabbed,
    is_in_control, percent,
};
use crate::config::StatsConfig;

/// How a punish got started, relative to the opponent's punishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpeningType {
    /// No opponent punish was running.
    NeutralWin,

    /// Started while an opponent punish, begun earlier, was still running.
    CounterAttack,

    /// Started on the same frame as an opponent punish.
    Trade,

    /// Not yet classified.
    #[default]
    Unknown,
}

impl OpeningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeutralWin => "neutral-win",
            Self::CounterAttack => "counter-attack",
            Self::Trade => "trade",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OpeningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run of hits `player_index` landed on `opponent_index`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Punish {
    pub player_index: u8,
    pub opponent_index: u8,
    pub start_frame: i32,
    pub end_frame: Option<i32>,
    /// Opponent percent on the frame before the first hit.
    pub start_percent: f32,
    pub current_percent: f32,
    pub end_percent: Option<f32>,
    pub hit_count: u32,
    pub move_count: u32,
    pub opening_move: Option<u8>,
    pub last_move: Option<u8>,
    pub did_kill: bool,
    pub opening_type: OpeningType,
}

#[derive(Debug)]
pub(crate) struct PunishTracker {
    indices: PlayerIndices,
    reset_frames: u32,
    punishes: Vec<Punish>,
    active: Option<usize>,
    /// Frames the opponent has spent out of hitstun since the counter started.
    reset_counter: u32,
    /// Attacker action state of the last counted move, cleared once they leave it.
    last_hit_animation: Option<u16>,
}

impl PunishTracker {
    pub(crate) fn new(indices: PlayerIndices, config: &StatsConfig) -> Self {
        Self {
            indices,
            reset_frames: config.punish_reset_frames,
            punishes: Vec::new(),
            active: None,
            reset_counter: 0,
            last_hit_animation: None,
        }
    }

    /// Starts a punish on `frame` and marks it active.
    fn open(&mut self, frame: &PairFrame<'_>) -> usize {
        self.punishes.push(Punish {
            player_index: self.indices.player_index,
            opponent_index: self.indices.opponent_index,
            start_frame: frame.frame,
            end_frame: None,
            start_percent: percent(frame.prev_opponent),
            current_percent: percent(Some(frame.opponent)),
            end_percent: None,
            hit_count: 0,
            move_count: 0,
            opening_move: frame.player.last_attack_landed,
            last_move: frame.player.last_attack_landed,
            did_kill: false,
            opening_type: OpeningType::Unknown,
        });

        let index = self.punishes.len() - 1;
        self.active = Some(index);
        index
    }
}

impl PairTracker for PunishTracker {
    type Output = Punish;

    fn step(&mut self, frame: &PairFrame<'_>) {
        let attacker_state = frame.player.action_state_id;
        if self.last_hit_animation.is_some() && attacker_state != self.last_hit_animation {
            self.last_hit_animation = None;
        }

        let opponent_state = frame.opponent.action_state_id;
        let in_stun = opponent_state.is_some_and(|state| is_damaged(state) || is_grabbed(state));
        let damage = damage_taken(frame.opponent, frame.prev_opponent);

        if damage > 0.0 && in_stun {
            let index = match self.active {
                Some(index) => index,
                None => self.open(frame),
            };

            let punish = &mut self.punishes[index];
            punish.last_move = frame.player.last_attack_landed;
            punish.hit_count += 1;

            // Multi-hit moves only count once.
            if self.last_hit_animation.is_none() {
                punish.move_count += 1;
            }

            self.last_hit_animation = frame.prev_player.and_then(|prev| prev.action_state_id);
        }

        let Some(index) = self.active else {
            return;
        };

        let punish = &mut self.punishes[index];
        let lost_stock = did_lose_stock(frame.opponent, frame.prev_opponent);

        if !lost_stock {
            punish.current_percent = percent(Some(frame.opponent));
        }

        if in_stun {
            self.reset_counter = 0;
        }

        let opponent_in_control = opponent_state.is_some_and(is_in_control);
        if (self.reset_counter == 0 && opponent_in_control) || self.reset_counter > 0 {
            self.reset_counter += 1;
        }

        if lost_stock {
            punish.did_kill = true;
        }

        if lost_stock || self.reset_counter > self.reset_frames {
            punish.end_frame = Some(frame.frame);
            punish.end_percent = Some(percent(frame.prev_opponent));
            self.active = None;
            self.reset_counter = 0;
        }
    }

    fn finish(self) -> Vec<Punish> {
        self.punishes
    }
}

/// Every punish of a singles game, grouped by attacker and in the order they
/// started. Opening types are left as [`OpeningType::Unknown`].
pub(crate) fn collect_punishes(store: &FrameStore, config: &StatsConfig) -> Vec<Punish> {
    fold_pairs(store, |indices| PunishTracker::new(indices, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_types_render_kebab_case() {
        assert_eq!(OpeningType::NeutralWin.to_string(), "neutral-win");
        assert_eq!(OpeningType::CounterAttack.as_str(), "counter-attack");
        assert_eq!(
            serde_json::to_string(&OpeningType::CounterAttack).unwrap(),
            "\"counter-attack\""
        );
        assert_eq!(serde_json::to_string(&OpeningType::Trade).unwrap(), "\"trade\"");
        assert_eq!(OpeningType::default(), OpeningType::Unknown);
    }
}
