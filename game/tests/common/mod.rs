//! Writes replay bytes for the integration tests.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub const GAME_START: u8 = 0x36;
pub const PRE_FRAME: u8 = 0x37;
pub const POST_FRAME: u8 = 0x38;
pub const GAME_END: u8 = 0x39;
pub const FRAME_START: u8 = 0x3A;
pub const ITEM: u8 = 0x3B;
pub const FRAME_BOOKEND: u8 = 0x3C;

pub const DEAD: u16 = 0x00;
pub const STAND: u16 = 0x0E;
pub const ATTACK: u16 = 0x2C;
pub const DAMAGE: u16 = 0x4B;

/// Payload sizes advertised by the message size descriptor.
const MODERN_SIZES: [(u8, u16); 7] = [
    (GAME_START, 0x1A2),
    (PRE_FRAME, 0x3F),
    (POST_FRAME, 0x25),
    (GAME_END, 0x2),
    (FRAME_START, 0x8),
    (ITEM, 0x2A),
    (FRAME_BOOKEND, 0x8),
];

/// Payload sizes of captures that predate the descriptor.
const LEGACY_SIZES: [(u8, u16); 4] = [(GAME_START, 0x140), (PRE_FRAME, 0x6), (POST_FRAME, 0x46), (GAME_END, 0x1)];

#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub action_state: u16,
    pub percent: f32,
    pub stocks: u8,
}

pub fn player(action_state: u16, percent: f32, stocks: u8) -> Player {
    Player {
        action_state,
        percent,
        stocks,
    }
}

/// Accumulates full-size records for a two player game on ports 1 and 2.
#[derive(Clone, Debug)]
pub struct ReplayBuilder {
    records: Vec<Vec<u8>>,
    metadata: Vec<u8>,
}

fn record(command: u8) -> Vec<u8> {
    let size = MODERN_SIZES
        .iter()
        .find(|(known, _)| *known == command)
        .map(|(_, size)| *size)
        .unwrap_or(0);

    let mut bytes = vec![0; 1 + size as usize];
    bytes[0] = command;
    bytes
}

impl ReplayBuilder {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            metadata: b"{}".to_vec(),
        }
    }

    pub fn game_start(mut self) -> Self {
        let mut bytes = record(GAME_START);
        bytes[0x1..0x4].copy_from_slice(&[3, 9, 0]);
        bytes[0x13..0x15].copy_from_slice(&31u16.to_be_bytes());

        for player_index in 0..4 {
            let offset = 0x24 * player_index;
            bytes[0x65 + offset] = 0x02;
            bytes[0x66 + offset] = if player_index < 2 { 0 } else { 3 };
            bytes[0x67 + offset] = 4;
        }

        self.records.push(bytes);
        self
    }

    /// A full frame: frame start, pre and post updates for both players, and
    /// the bookend.
    pub fn frame(mut self, frame: i32, players: [Player; 2]) -> Self {
        let mut start = record(FRAME_START);
        start[0x1..0x5].copy_from_slice(&frame.to_be_bytes());
        self.records.push(start);

        for (player_index, player) in players.iter().enumerate() {
            let mut pre = record(PRE_FRAME);
            pre[0x1..0x5].copy_from_slice(&frame.to_be_bytes());
            pre[0x5] = player_index as u8;
            pre[0xB..0xD].copy_from_slice(&player.action_state.to_be_bytes());
            self.records.push(pre);

            let mut post = record(POST_FRAME);
            post[0x1..0x5].copy_from_slice(&frame.to_be_bytes());
            post[0x5] = player_index as u8;
            post[0x8..0xA].copy_from_slice(&player.action_state.to_be_bytes());
            post[0x16..0x1A].copy_from_slice(&player.percent.to_be_bytes());
            post[0x1E] = 0x11;
            post[0x21] = player.stocks;
            self.records.push(post);
        }

        let mut bookend = record(FRAME_BOOKEND);
        bookend[0x1..0x5].copy_from_slice(&frame.to_be_bytes());
        bookend[0x5..0x9].copy_from_slice(&frame.to_be_bytes());
        self.records.push(bookend);

        self
    }

    pub fn item(mut self, frame: i32, spawn_id: u32, owner: i8) -> Self {
        let mut bytes = record(ITEM);
        bytes[0x1..0x5].copy_from_slice(&frame.to_be_bytes());
        bytes[0x5..0x7].copy_from_slice(&0x63u16.to_be_bytes());
        bytes[0x22..0x26].copy_from_slice(&spawn_id.to_be_bytes());
        bytes[0x2A] = owner as u8;
        self.records.push(bytes);
        self
    }

    pub fn game_end(mut self, method: u8) -> Self {
        let mut bytes = record(GAME_END);
        bytes[0x1] = method;
        bytes[0x2] = 0xFF;
        self.records.push(bytes);
        self
    }

    /// Replaces the metadata value (UBJSON bytes) written after the raw data.
    pub fn metadata(mut self, ubjson: &[u8]) -> Self {
        self.metadata = ubjson.to_vec();
        self
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// The descriptor followed by every record.
    pub fn raw(&self) -> Vec<u8> {
        let mut raw = vec![0x35, (MODERN_SIZES.len() * 3 + 1) as u8];
        for (command, size) in MODERN_SIZES {
            raw.push(command);
            raw.extend_from_slice(&size.to_be_bytes());
        }

        self.records.iter().for_each(|record| raw.extend_from_slice(record));
        raw
    }

    pub fn modern(&self) -> Vec<u8> {
        let raw = self.raw();

        let mut bytes = b"{U\x03raw[$U#l".to_vec();
        bytes.extend_from_slice(&(raw.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&raw);
        bytes.extend_from_slice(b"U\x08metadata");
        bytes.extend_from_slice(&self.metadata);
        bytes.push(b'}');
        bytes
    }

    /// A capture whose writer never got to fill in the raw length or metadata.
    pub fn severed(&self) -> Vec<u8> {
        let mut bytes = b"{U\x03raw[$U#l".to_vec();
        bytes.extend_from_slice(&[0; 4]);
        bytes.extend_from_slice(&self.raw());
        bytes
    }

    /// Records cut down (or padded) to the fixed legacy sizes. Commands the
    /// legacy table doesn't know are left out.
    pub fn legacy(&self) -> Vec<u8> {
        self.records
            .iter()
            .filter_map(|record| {
                let (_, size) = LEGACY_SIZES.iter().find(|(command, _)| *command == record[0])?;
                let mut record = record.clone();
                record.resize(1 + *size as usize, 0);
                Some(record)
            })
            .flatten()
            .collect()
    }
}

/// A short game: one stock lost by port 2 to a punish from port 1, with an
/// item, ending on frame `FIRST_FRAME + 5`.
pub fn sample_game() -> ReplayBuilder {
    let first = -123;

    ReplayBuilder::new()
        .game_start()
        .frame(first, [player(STAND, 0.0, 4), player(STAND, 0.0, 4)])
        .frame(first + 1, [player(ATTACK, 0.0, 4), player(DAMAGE, 30.0, 4)])
        .item(first + 1, 0, 0)
        .frame(first + 2, [player(ATTACK, 0.0, 4), player(DAMAGE, 60.0, 4)])
        .item(first + 2, 0, 0)
        .item(first + 2, 1, -1)
        .frame(first + 3, [player(STAND, 0.0, 4), player(DEAD, 0.0, 3)])
        .frame(first + 4, [player(STAND, 0.0, 4), player(DEAD, 0.0, 3)])
        .frame(first + 5, [player(STAND, 0.0, 4), player(STAND, 0.0, 3)])
        .game_end(2)
}

/// Items spawned over several frames, with earlier ones still around later.
pub fn item_game() -> ReplayBuilder {
    let first = -123;
    let idle = [player(STAND, 0.0, 4), player(STAND, 0.0, 4)];

    ReplayBuilder::new()
        .game_start()
        .frame(first, idle)
        .item(first, 0, 0)
        .frame(first + 1, idle)
        .item(first + 1, 0, 0)
        .item(first + 1, 1, 1)
        .frame(first + 2, idle)
        .item(first + 2, 1, 1)
        .frame(first + 3, idle)
        .item(first + 3, 0, 0)
        .item(first + 3, 1, 1)
        .item(first + 3, 2, -1)
        .item(first + 3, 3, 0)
        .frame(first + 4, idle)
        .item(first + 4, 3, 0)
        .game_end(2)
}

/// `{ startAt: "2020-04-26T21:48:34Z", lastFrame: -118, playedOn: "dolphin" }`
pub fn sample_metadata() -> Vec<u8> {
    let mut bytes = b"{".to_vec();
    bytes.extend_from_slice(b"U\x07startAtSU\x142020-04-26T21:48:34Z");
    bytes.extend_from_slice(b"U\x09lastFramel");
    bytes.extend_from_slice(&(-118i32).to_be_bytes());
    bytes.extend_from_slice(b"U\x08playedOnSU\x07dolphin");
    bytes.push(b'}');
    bytes
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
