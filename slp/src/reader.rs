//! Sequential iteration over the raw event stream.

use std::ops::ControlFlow;

use crate::container::Container;
use crate::events::Event;
use crate::{Log, Result};

/// Why an iteration pass stopped.
///
/// None of these are errors: every pass reports the position it reached, and
/// the caller decides whether a halt means "done", "corrupt", or "come back
/// once more of the capture has been written".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltReason {
    /// The cursor reached the end of the raw data region.
    EndOfStream,

    /// A command byte with no entry in the message size table.
    UnknownCommand(u8),

    /// The next record doesn't fit in what's available.
    TruncatedRecord { command: u8, needed: u64 },

    /// The source ended before the raw data region did.
    SourceExhausted,

    /// The callback asked to stop.
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IterationOutcome {
    /// Where the next unread record begins. Feed this back in as the start
    /// position to resume.
    pub position: u64,
    pub halt: HaltReason,
}

impl Container {
    /// Walks records from `start_position` (or the start of the raw data) and
    /// hands each decoded event to `callback` along with its command byte.
    /// A start position before the raw data begins is moved up to it.
    ///
    /// A record is only passed along once it's been read in full; the cursor
    /// never advances past a record that wasn't, nor past the one the callback
    /// stopped on.
    pub fn iterate<F>(&self, start_position: Option<u64>, mut callback: F) -> Result<IterationOutcome>
    where
        F: FnMut(u8, &Event) -> ControlFlow<()>,
    {
        let source = self.source();
        let stop = self.raw_data_end();
        let raw_data_position = self.raw_data_position();
        let mut position = start_position.map_or(raw_data_position, |start| start.max(raw_data_position));

        let mut command = [0; 1];
        let mut record = Vec::new();

        let halt = loop {
            if position >= stop {
                break HaltReason::EndOfStream;
            }

            if source.read_into(&mut command, position)? == 0 {
                break HaltReason::SourceExhausted;
            }
            let command = command[0];

            let Some(payload_length) = self.message_sizes().get(command) else {
                tracing::warn!(
                    target: Log::SlpReader,
                    command,
                    position,
                    "Encountered a command with no known size, halting"
                );
                break HaltReason::UnknownCommand(command);
            };

            let needed = 1 + u64::from(payload_length);
            if position + needed > stop {
                break HaltReason::TruncatedRecord { command, needed };
            }

            record.resize(needed as usize, 0);
            if source.read_into(&mut record, position)? < record.len() {
                break HaltReason::TruncatedRecord { command, needed };
            }

            let event = Event::decode(command, &record);
            if callback(command, &event).is_break() {
                break HaltReason::Stopped;
            }

            position += needed;
        };

        if let HaltReason::TruncatedRecord { command, needed } = halt {
            tracing::warn!(
                target: Log::SlpReader,
                command,
                needed,
                position,
                "Stopped before an incomplete record"
            );
        }

        Ok(IterationOutcome { position, halt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SlpInput;

    /// A modern container whose descriptor sizes `0x36` at 2 bytes and `0x39`
    /// at 1 byte.
    fn container(events: &[u8], declared_extra: u32) -> Container {
        let descriptor = [0x35, 0x07, 0x36, 0x00, 0x02, 0x39, 0x00, 0x01];
        let raw_length = (descriptor.len() + events.len()) as u32 + declared_extra;

        let mut bytes = b"{U\x03raw[$U#l".to_vec();
        bytes.extend_from_slice(&raw_length.to_be_bytes());
        bytes.extend_from_slice(&descriptor);
        bytes.extend_from_slice(events);

        Container::open(&SlpInput::from(bytes)).unwrap()
    }

    fn commands(container: &Container, start: Option<u64>) -> (Vec<u8>, IterationOutcome) {
        let mut seen = Vec::new();
        let outcome = container
            .iterate(start, |command, _| {
                seen.push(command);
                ControlFlow::Continue(())
            })
            .unwrap();
        (seen, outcome)
    }

    #[test]
    fn walks_every_record_to_the_end() {
        let container = container(&[0x36, 0x01, 0x02, 0x39, 0x03], 0);

        let (seen, outcome) = commands(&container, None);

        assert_eq!(seen, vec![0x35, 0x36, 0x39]);
        assert_eq!(outcome.halt, HaltReason::EndOfStream);
        assert_eq!(outcome.position, container.raw_data_end());
    }

    #[test]
    fn unknown_commands_halt_without_advancing() {
        let container = container(&[0x36, 0x01, 0x02, 0x50, 0x00], 0);

        let (seen, outcome) = commands(&container, None);

        assert_eq!(seen, vec![0x35, 0x36]);
        assert_eq!(outcome.halt, HaltReason::UnknownCommand(0x50));
        assert_eq!(outcome.position, 15 + 8 + 3);
    }

    #[test]
    fn records_crossing_the_stop_bound_are_not_read() {
        // The last game start record is cut off after one payload byte.
        let container = container(&[0x39, 0x00, 0x36, 0x01], 0);

        let (seen, outcome) = commands(&container, None);

        assert_eq!(seen, vec![0x35, 0x39]);
        assert_eq!(outcome.halt, HaltReason::TruncatedRecord { command: 0x36, needed: 3 });
        assert_eq!(outcome.position, 15 + 8 + 2);
    }

    #[test]
    fn declared_length_past_the_source_is_tolerated() {
        let container = container(&[0x39, 0x00, 0x36, 0x01], 16);

        let (seen, outcome) = commands(&container, None);

        assert_eq!(seen, vec![0x35, 0x39]);
        assert_eq!(outcome.halt, HaltReason::TruncatedRecord { command: 0x36, needed: 3 });

        let container = self::container(&[0x39, 0x00], 16);
        let (_, outcome) = commands(&container, None);
        assert_eq!(outcome.halt, HaltReason::SourceExhausted);
        assert_eq!(outcome.position, 15 + 8 + 2);
    }

    #[test]
    fn stopping_leaves_the_cursor_on_the_current_record() {
        let container = container(&[0x36, 0x01, 0x02, 0x39, 0x03], 0);

        let outcome = container
            .iterate(None, |command, _| match command {
                0x36 => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            })
            .unwrap();

        assert_eq!(outcome.halt, HaltReason::Stopped);
        assert_eq!(outcome.position, 15 + 8);

        // Resuming from there replays the record we stopped on.
        let (seen, outcome) = commands(&container, Some(outcome.position));
        assert_eq!(seen, vec![0x36, 0x39]);
        assert_eq!(outcome.halt, HaltReason::EndOfStream);
    }

    #[test]
    fn start_positions_inside_the_header_begin_at_the_raw_data() {
        let container = container(&[0x36, 0x01, 0x02], 0);

        let (seen, outcome) = commands(&container, Some(0));

        assert_eq!(seen, vec![0x35, 0x36]);
        assert_eq!(outcome.halt, HaltReason::EndOfStream);
    }
}
