//! Decoded forms of the command-tagged records found in the raw event stream.
//!
//! Only the fields that something downstream reads are pulled out. Fields are
//! optional because the record for a given command has grown over the years,
//! and older captures simply stop short.

use num_enum::TryFromPrimitive;
use serde::Serialize;

use crate::bytes::Record;

/// Known command bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum Command {
    MessageSizes = 0x35,
    GameStart = 0x36,
    PreFrameUpdate = 0x37,
    PostFrameUpdate = 0x38,
    GameEnd = 0x39,
    FrameStart = 0x3A,
    ItemUpdate = 0x3B,
    FrameBookend = 0x3C,
    GeckoList = 0x3D,
}

/// Player slot type marking an empty port.
pub const PLAYER_TYPE_EMPTY: u8 = 3;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    pub player_index: u8,
    pub port: u8,
    pub character_id: Option<u8>,
    pub player_type: Option<u8>,
    pub start_stocks: Option<u8>,
    pub character_color: Option<u8>,
    pub team_id: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStart {
    pub slp_version: Option<String>,
    pub is_teams: Option<bool>,
    pub stage_id: Option<u16>,
    pub starting_timer_seconds: Option<u32>,
    /// All four slots, including empty ones.
    pub slots: Vec<PlayerSlot>,
    pub random_seed: Option<u32>,
    pub is_pal: Option<bool>,
    pub is_frozen_ps: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreFrameUpdate {
    pub frame: Option<i32>,
    pub player_index: Option<u8>,
    pub is_follower: Option<bool>,
    pub seed: Option<u32>,
    pub action_state_id: Option<u16>,
    pub position_x: Option<f32>,
    pub position_y: Option<f32>,
    pub facing_direction: Option<f32>,
    pub joystick_x: Option<f32>,
    pub joystick_y: Option<f32>,
    pub c_stick_x: Option<f32>,
    pub c_stick_y: Option<f32>,
    pub trigger: Option<f32>,
    pub buttons: Option<u32>,
    pub physical_buttons: Option<u16>,
    pub physical_l_trigger: Option<f32>,
    pub physical_r_trigger: Option<f32>,
    pub percent: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFrameUpdate {
    pub frame: Option<i32>,
    pub player_index: Option<u8>,
    pub is_follower: Option<bool>,
    pub internal_character_id: Option<u8>,
    pub action_state_id: Option<u16>,
    pub position_x: Option<f32>,
    pub position_y: Option<f32>,
    pub facing_direction: Option<f32>,
    pub percent: Option<f32>,
    pub shield_size: Option<f32>,
    pub last_attack_landed: Option<u8>,
    pub current_combo_count: Option<u8>,
    pub last_hit_by: Option<u8>,
    pub stocks_remaining: Option<u8>,
    pub action_state_counter: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEnd {
    pub game_end_method: Option<u8>,
    pub lras_initiator_index: Option<i8>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStart {
    pub frame: Option<i32>,
    pub seed: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub frame: Option<i32>,
    pub type_id: Option<u16>,
    pub state: Option<u8>,
    pub facing_direction: Option<f32>,
    pub velocity_x: Option<f32>,
    pub velocity_y: Option<f32>,
    pub position_x: Option<f32>,
    pub position_y: Option<f32>,
    pub damage_taken: Option<u16>,
    pub expiration_timer: Option<f32>,
    pub spawn_id: Option<u32>,
    /// Port index of the owning player, or `-1` for unowned items.
    pub owner: Option<i8>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameBookend {
    pub frame: Option<i32>,
    pub latest_finalized_frame: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeckoList {
    pub codes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    MessageSizes,
    GameStart(GameStart),
    PreFrameUpdate(PreFrameUpdate),
    PostFrameUpdate(PostFrameUpdate),
    GameEnd(GameEnd),
    FrameStart(FrameStart),
    ItemUpdate(ItemUpdate),
    FrameBookend(FrameBookend),
    GeckoList(GeckoList),
    /// A command the size table knows how to frame but we don't decode.
    Other { command: u8 },
}

impl Event {
    /// Decodes one full record (command byte included).
    pub fn decode(command: u8, record: &[u8]) -> Self {
        let record = Record::new(record);

        let Ok(command) = Command::try_from(command) else {
            return Self::Other { command };
        };

        match command {
            Command::MessageSizes => Self::MessageSizes,
            Command::GameStart => Self::GameStart(decode_game_start(record)),
            Command::PreFrameUpdate => Self::PreFrameUpdate(decode_pre_frame(record)),
            Command::PostFrameUpdate => Self::PostFrameUpdate(decode_post_frame(record)),
            Command::GameEnd => Self::GameEnd(GameEnd {
                game_end_method: record.u8(0x1),
                lras_initiator_index: record.i8(0x2),
            }),
            Command::FrameStart => Self::FrameStart(FrameStart {
                frame: record.i32(0x1),
                seed: record.u32(0x5),
            }),
            Command::ItemUpdate => Self::ItemUpdate(decode_item(record)),
            Command::FrameBookend => Self::FrameBookend(FrameBookend {
                frame: record.i32(0x1),
                latest_finalized_frame: record.i32(0x5),
            }),
            Command::GeckoList => Self::GeckoList(GeckoList {
                codes: record.payload().to_vec(),
            }),
        }
    }

    /// The frame this event belongs to, for events that carry one.
    pub fn frame(&self) -> Option<i32> {
        match self {
            Self::PreFrameUpdate(update) => update.frame,
            Self::PostFrameUpdate(update) => update.frame,
            Self::FrameStart(start) => start.frame,
            Self::ItemUpdate(item) => item.frame,
            Self::FrameBookend(bookend) => bookend.frame,
            _ => None,
        }
    }
}

fn decode_game_start(record: Record<'_>) -> GameStart {
    let slp_version = match (record.u8(0x1), record.u8(0x2), record.u8(0x3)) {
        (Some(major), Some(minor), Some(build)) => Some(format!("{major}.{minor}.{build}")),
        _ => None,
    };

    let slots = (0..4u8)
        .map(|player_index| {
            let offset = 0x24 * player_index as usize;

            PlayerSlot {
                player_index,
                port: player_index + 1,
                character_id: record.u8(0x65 + offset),
                player_type: record.u8(0x66 + offset),
                start_stocks: record.u8(0x67 + offset),
                character_color: record.u8(0x68 + offset),
                team_id: record.u8(0x6E + offset),
            }
        })
        .collect();

    GameStart {
        slp_version,
        is_teams: record.bool(0xD),
        stage_id: record.u16(0x13),
        starting_timer_seconds: record.u32(0x15),
        slots,
        random_seed: record.u32(0x13D),
        is_pal: record.bool(0x1A1),
        is_frozen_ps: record.bool(0x1A2),
    }
}

fn decode_pre_frame(record: Record<'_>) -> PreFrameUpdate {
    PreFrameUpdate {
        frame: record.i32(0x1),
        player_index: record.u8(0x5),
        is_follower: record.bool(0x6),
        seed: record.u32(0x7),
        action_state_id: record.u16(0xB),
        position_x: record.f32(0xD),
        position_y: record.f32(0x11),
        facing_direction: record.f32(0x15),
        joystick_x: record.f32(0x19),
        joystick_y: record.f32(0x1D),
        c_stick_x: record.f32(0x21),
        c_stick_y: record.f32(0x25),
        trigger: record.f32(0x29),
        buttons: record.u32(0x2D),
        physical_buttons: record.u16(0x31),
        physical_l_trigger: record.f32(0x33),
        physical_r_trigger: record.f32(0x37),
        percent: record.f32(0x3C),
    }
}

fn decode_post_frame(record: Record<'_>) -> PostFrameUpdate {
    PostFrameUpdate {
        frame: record.i32(0x1),
        player_index: record.u8(0x5),
        is_follower: record.bool(0x6),
        internal_character_id: record.u8(0x7),
        action_state_id: record.u16(0x8),
        position_x: record.f32(0xA),
        position_y: record.f32(0xE),
        facing_direction: record.f32(0x12),
        percent: record.f32(0x16),
        shield_size: record.f32(0x1A),
        last_attack_landed: record.u8(0x1E),
        current_combo_count: record.u8(0x1F),
        last_hit_by: record.u8(0x20),
        stocks_remaining: record.u8(0x21),
        action_state_counter: record.f32(0x22),
    }
}

fn decode_item(record: Record<'_>) -> ItemUpdate {
    ItemUpdate {
        frame: record.i32(0x1),
        type_id: record.u16(0x5),
        state: record.u8(0x7),
        facing_direction: record.f32(0x8),
        velocity_x: record.f32(0xC),
        velocity_y: record.f32(0x10),
        position_x: record.f32(0x14),
        position_y: record.f32(0x18),
        damage_taken: record.u16(0x1C),
        expiration_timer: record.f32(0x1E),
        spawn_id: record.u32(0x22),
        owner: record.i8(0x2A),
    }
}
