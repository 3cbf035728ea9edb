//! Locates the regions of a replay container.
//!
//! Two layouts exist in the wild:
//!
//! - Legacy captures are nothing but the raw event stream, beginning directly
//!   with a game start record (`0x36`).
//! - Modern captures are a UBJSON object: a fixed 15 byte preamble
//!   (`{U\x03raw[$U#l` plus a big-endian length), the raw event stream, then a
//!   `U\x08metadata` key, the metadata value, and the closing `}`.
//!
//! Nothing in here errors on malformed layouts. Captures that were cut off
//! mid-write (or never finalized) still need to be partially readable, so
//! anything unexpected falls back to a conservative default instead.

use std::fmt;

use crate::events::Command;
use crate::source::{SlpInput, SourceRef};
use crate::{Log, Result};

/// First byte of a legacy capture (a game start record).
pub const LEGACY_MAGIC: u8 = 0x36;

/// First byte of a modern capture (the opening of the UBJSON object).
pub const MODERN_MAGIC: u8 = b'{';

/// Where the raw stream begins in a modern capture.
const MODERN_RAW_DATA_POSITION: u64 = 15;

/// `U\x08metadata` sits between the raw stream and the metadata value.
const METADATA_KEY_LENGTH: u64 = 10;

/// Maps a command byte to the length of its payload (not counting the command
/// byte itself). A missing entry means the command can't be framed.
#[derive(Clone, PartialEq, Eq)]
pub struct MessageSizes([Option<u16>; 256]);

impl MessageSizes {
    pub fn empty() -> Self {
        Self([None; 256])
    }

    /// The fixed table used by captures predating the message size descriptor.
    pub fn legacy() -> Self {
        let mut sizes = Self::empty();
        sizes.insert(Command::GameStart as u8, 0x140);
        sizes.insert(Command::PreFrameUpdate as u8, 0x6);
        sizes.insert(Command::PostFrameUpdate as u8, 0x46);
        sizes.insert(Command::GameEnd as u8, 0x1);
        sizes
    }

    pub fn get(&self, command: u8) -> Option<u16> {
        self.0[command as usize]
    }

    pub fn insert(&mut self, command: u8, size: u16) {
        self.0[command as usize] = Some(size);
    }

    pub fn len(&self) -> usize {
        self.0.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u16)> + '_ {
        (0..=u8::MAX).filter_map(|command| self.get(command).map(|size| (command, size)))
    }
}

impl Default for MessageSizes {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for MessageSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(command, size)| (format!("0x{command:02x}"), size)))
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    Legacy,
    Modern,
}

/// An opened replay plus the byte map of where everything lives in it.
///
/// The layout is computed once on open and never changes afterwards; reopen
/// the input to pick up bytes appended since.
#[derive(Debug)]
pub struct Container {
    source: SourceRef,
    format: ContainerFormat,
    raw_data_position: u64,
    raw_data_length: u64,
    metadata_position: u64,
    metadata_length: i64,
    message_sizes: MessageSizes,
}

impl Container {
    /// Opens `input` and locates its regions.
    pub fn open(input: &SlpInput) -> Result<Self> {
        Self::locate(SourceRef::open(input)?)
    }

    /// Builds the byte map for an already opened source.
    pub fn locate(source: SourceRef) -> Result<Self> {
        let container_length = source.len()?;

        let raw_data_position = raw_data_position(&source)?;
        let raw_data_length = raw_data_length(&source, raw_data_position, container_length)?;
        let metadata_position = raw_data_position + raw_data_length + METADATA_KEY_LENGTH;
        let metadata_length = container_length as i64 - metadata_position as i64 - 1;

        let (format, message_sizes) = match raw_data_position {
            0 => (ContainerFormat::Legacy, MessageSizes::legacy()),
            position => (ContainerFormat::Modern, read_message_sizes(&source, position)?),
        };

        tracing::debug!(
            target: Log::SlpReader,
            ?format,
            raw_data_position,
            raw_data_length,
            metadata_position,
            metadata_length,
            known_commands = message_sizes.len(),
            "Located replay container"
        );

        Ok(Self {
            source,
            format,
            raw_data_position,
            raw_data_length,
            metadata_position,
            metadata_length,
            message_sizes,
        })
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    pub fn raw_data_position(&self) -> u64 {
        self.raw_data_position
    }

    pub fn raw_data_length(&self) -> u64 {
        self.raw_data_length
    }

    /// One past the last byte of the raw event stream.
    pub fn raw_data_end(&self) -> u64 {
        self.raw_data_position + self.raw_data_length
    }

    pub fn metadata_position(&self) -> u64 {
        self.metadata_position
    }

    /// Can be zero or negative for severed captures; treat that as "no metadata".
    pub fn metadata_length(&self) -> i64 {
        self.metadata_length
    }

    pub fn message_sizes(&self) -> &MessageSizes {
        &self.message_sizes
    }

    /// Releases the underlying source.
    pub fn close(self) {
        self.source.close();
    }
}

fn raw_data_position(source: &SourceRef) -> Result<u64> {
    let mut magic = [0; 1];

    if source.read_into(&mut magic, 0)? == 0 {
        return Ok(0);
    }

    Ok(match magic[0] {
        LEGACY_MAGIC => 0,
        MODERN_MAGIC => MODERN_RAW_DATA_POSITION,
        other => {
            tracing::warn!(
                target: Log::SlpReader,
                magic = other,
                "Unrecognized container magic byte, falling back to legacy framing"
            );
            0
        },
    })
}

fn raw_data_length(source: &SourceRef, position: u64, container_length: u64) -> Result<u64> {
    let remaining = container_length.saturating_sub(position);

    if position == 0 {
        return Ok(container_length);
    }

    let mut length = [0; 4];

    if source.read_into(&mut length, position - 4)? == length.len() {
        // Stored unsigned, but an unfinished write can leave garbage with the high
        // bit set; anything that isn't strictly positive as an i32 is untrusted.
        let length = i32::from_be_bytes(length);

        if length > 0 {
            return Ok(length as u64);
        }
    }

    tracing::warn!(
        target: Log::SlpReader,
        remaining,
        "Raw data length was never written, assuming a severed capture"
    );

    Ok(remaining)
}

fn read_message_sizes(source: &SourceRef, position: u64) -> Result<MessageSizes> {
    let mut sizes = MessageSizes::empty();

    let header = source.read(position, 2)?;
    let [command, payload_length] = header[..] else {
        return Ok(sizes);
    };

    if command != Command::MessageSizes as u8 {
        tracing::warn!(
            target: Log::SlpReader,
            command,
            "Raw data doesn't begin with a message size descriptor, no events will be readable"
        );
        return Ok(sizes);
    }

    sizes.insert(command, u16::from(payload_length));

    let entries = source.read(position + 2, usize::from(payload_length).saturating_sub(1))?;
    for entry in entries.chunks_exact(3) {
        sizes.insert(entry[0], u16::from_be_bytes([entry[1], entry[2]]));
    }

    Ok(sizes)
}
