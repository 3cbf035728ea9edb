//! Builds small in-memory games for the analytics tests.

use slippi_slp::events::{GameStart, PLAYER_TYPE_EMPTY, PlayerSlot, PostFrameUpdate};
use slippi_slp::{Event, FIRST_FRAME, FrameStore};

pub const DEAD: u16 = 0x00;
pub const STAND: u16 = 0x0E;
pub const SQUAT: u16 = 0x28;
pub const ATTACK: u16 = 0x2C;
pub const DAMAGE: u16 = 0x4B;
pub const GRABBED: u16 = 0xDF;

#[derive(Clone, Copy, Debug)]
pub struct PlayerState {
    action_state: u16,
    percent: f32,
    stocks: u8,
    last_attack_landed: Option<u8>,
}

impl PlayerState {
    pub fn landed(mut self, attack: u8) -> Self {
        self.last_attack_landed = Some(attack);
        self
    }
}

pub fn state(action_state: u16, percent: f32, stocks: u8) -> PlayerState {
    PlayerState {
        action_state,
        percent,
        stocks,
        last_attack_landed: None,
    }
}

/// Frames are numbered from `FIRST_FRAME` in the order they're added. The two
/// states passed to [`Replay::frame`] go to the first two occupied ports.
pub struct Replay {
    ports: Vec<u8>,
    store: FrameStore,
    next_frame: i32,
}

impl Replay {
    pub fn singles() -> Self {
        Self::with_ports(&[0, 1])
    }

    pub fn with_ports(ports: &[u8]) -> Self {
        let slots = (0..4u8)
            .map(|player_index| PlayerSlot {
                player_index,
                port: player_index + 1,
                character_id: Some(0x02),
                player_type: Some(if ports.contains(&player_index) { 0 } else { PLAYER_TYPE_EMPTY }),
                start_stocks: Some(4),
                character_color: None,
                team_id: None,
            })
            .collect();

        let mut store = FrameStore::new();
        store.apply(&Event::GameStart(GameStart {
            slp_version: Some("3.0.0".into()),
            is_teams: Some(false),
            stage_id: Some(31),
            starting_timer_seconds: Some(480),
            slots,
            random_seed: None,
            is_pal: Some(false),
            is_frozen_ps: Some(false),
        }));

        Self {
            ports: ports.to_vec(),
            store,
            next_frame: FIRST_FRAME,
        }
    }

    pub fn frame(mut self, first: PlayerState, second: PlayerState) -> Self {
        let frame = self.next_frame;
        self.next_frame += 1;

        for (player_index, player) in self.ports.iter().copied().zip([first, second]) {
            self.store.apply(&Event::PostFrameUpdate(PostFrameUpdate {
                frame: Some(frame),
                player_index: Some(player_index),
                is_follower: Some(false),
                internal_character_id: Some(0x02),
                action_state_id: Some(player.action_state),
                position_x: Some(0.0),
                position_y: Some(0.0),
                facing_direction: Some(1.0),
                percent: Some(player.percent),
                shield_size: Some(60.0),
                last_attack_landed: player.last_attack_landed,
                current_combo_count: Some(0),
                last_hit_by: None,
                stocks_remaining: Some(player.stocks),
                action_state_counter: None,
            }));
        }

        self
    }

    pub fn build(self) -> FrameStore {
        self.store
    }
}
