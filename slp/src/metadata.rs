use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::container::Container;
use crate::{Log, Result, ubjson};

/// The trailing metadata block of a replay, decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata(Value);

impl Metadata {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// When the game started, if the recorder wrote a parseable timestamp.
    pub fn start_at(&self) -> Option<OffsetDateTime> {
        let start_at = self.0.get("startAt")?.as_str()?;
        OffsetDateTime::parse(start_at, &Rfc3339).ok()
    }

    /// The last frame the recorder saw, as written by the recorder itself.
    pub fn last_frame(&self) -> Option<i32> {
        self.0.get("lastFrame")?.as_i64()?.try_into().ok()
    }

    /// The platform the game was played on (e.g, `dolphin`, `network`, `nintendont`).
    pub fn played_on(&self) -> Option<&str> {
        self.0.get("playedOn")?.as_str()
    }
}

impl Container {
    /// Reads and decodes the metadata block.
    ///
    /// Metadata is best-effort: a severed capture has none, and a block that
    /// doesn't decode is logged and treated the same way. Only failures to read
    /// the source itself are returned as errors.
    pub fn metadata(&self) -> Result<Option<Metadata>> {
        let Ok(length) = usize::try_from(self.metadata_length()) else {
            return Ok(None);
        };

        if length == 0 {
            return Ok(None);
        }

        let bytes = self.source().read(self.metadata_position(), length)?;

        match ubjson::decode(&bytes) {
            Ok(value) => Ok(Some(Metadata(value))),

            Err(error) => {
                tracing::warn!(target: Log::SlpReader, ?error, "Unable to decode replay metadata");
                Ok(None)
            },
        }
    }
}
