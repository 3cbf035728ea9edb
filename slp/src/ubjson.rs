//! A small Universal Binary JSON decoder.
//!
//! Replay metadata (and the modern container itself) is written as UBJSON.
//! Values are decoded into `serde_json::Value` so they can be inspected the
//! same way as any other JSON payload.

use serde_json::{Map, Number, Value};

use crate::{Result, SlpError};

/// Decodes a single UBJSON value from the start of `bytes`. Trailing bytes
/// after the value are ignored.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    Decoder {
        bytes,
        offset: 0,
        depth: 0,
    }
    .value()
}

/// How deeply arrays and objects may nest.
const MAX_DEPTH: usize = 256;

/// Elements allowed in a typed array of `Z`, `T` or `F`, which take no bytes each.
const MAX_ZERO_WIDTH_COUNT: usize = 1 << 16;

struct Decoder<'a> {
    bytes: &'a [u8],
    offset: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    fn error(&self, reason: impl Into<String>) -> SlpError {
        SlpError::ubjson(self.offset, reason)
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(count)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| self.error(format!("needed {count} more bytes")))?;

        let bytes = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    /// Next type marker, skipping no-ops.
    fn marker(&mut self) -> Result<u8> {
        loop {
            let [marker] = self.array()?;
            if marker != b'N' {
                return Ok(marker);
            }
        }
    }

    fn value(&mut self) -> Result<Value> {
        let marker = self.marker()?;
        self.value_of(marker)
    }

    fn value_of(&mut self, marker: u8) -> Result<Value> {
        Ok(match marker {
            b'Z' => Value::Null,
            b'T' => Value::Bool(true),
            b'F' => Value::Bool(false),
            b'i' | b'U' | b'I' | b'l' | b'L' => Value::from(self.integer(marker)?),
            b'd' => float(f64::from(f32::from_be_bytes(self.array()?))),
            b'D' => float(f64::from_be_bytes(self.array()?)),
            b'C' => {
                let [byte] = self.array()?;
                Value::String(char::from(byte).to_string())
            },
            b'S' => Value::String(self.string()?),
            // High precision numbers are kept as their textual form.
            b'H' => Value::String(self.string()?),
            b'[' => self.nested(Self::list)?,
            b'{' => self.nested(Self::object)?,
            other => return Err(self.error(format!("unexpected marker 0x{other:02x}"))),
        })
    }

    fn nested(&mut self, decode: fn(&mut Self) -> Result<Value>) -> Result<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("containers nested deeper than {MAX_DEPTH}")));
        }

        self.depth += 1;
        let value = decode(self);
        self.depth -= 1;
        value
    }

    fn integer(&mut self, marker: u8) -> Result<i64> {
        Ok(match marker {
            b'i' => i64::from(i8::from_be_bytes(self.array()?)),
            b'U' => i64::from(u8::from_be_bytes(self.array()?)),
            b'I' => i64::from(i16::from_be_bytes(self.array()?)),
            b'l' => i64::from(i32::from_be_bytes(self.array()?)),
            b'L' => i64::from_be_bytes(self.array()?),
            other => return Err(self.error(format!("expected an integer marker, found 0x{other:02x}"))),
        })
    }

    fn length(&mut self) -> Result<usize> {
        let marker = self.marker()?;
        let length = self.integer(marker)?;
        usize::try_from(length).map_err(|_| self.error(format!("invalid length {length}")))
    }

    fn string(&mut self) -> Result<String> {
        let length = self.length()?;
        let bytes = self.take(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|error| self.error(error.to_string()))
    }

    /// Reads the optional `$type#count` header of an optimized container.
    fn container_header(&mut self) -> Result<(Option<u8>, Option<usize>)> {
        let mut element_type = None;

        if self.peek() == Some(b'$') {
            self.offset += 1;
            let [marker] = self.array()?;
            element_type = Some(marker);

            if self.peek() != Some(b'#') {
                return Err(self.error("typed container without a count"));
            }
        }

        if self.peek() == Some(b'#') {
            self.offset += 1;
            let count = self.length()?;

            // Every element takes at least a byte, unless the type alone is the value.
            let limit = match element_type {
                Some(b'Z' | b'T' | b'F') => MAX_ZERO_WIDTH_COUNT,
                _ => self.remaining(),
            };
            if count > limit {
                return Err(self.error(format!("count {count} exceeds the {limit} elements that can follow")));
            }

            return Ok((element_type, Some(count)));
        }

        Ok((element_type, None))
    }

    fn element(&mut self, element_type: Option<u8>) -> Result<Value> {
        match element_type {
            Some(marker) => self.value_of(marker),
            None => self.value(),
        }
    }

    fn list(&mut self) -> Result<Value> {
        let (element_type, count) = self.container_header()?;
        let mut values = Vec::new();

        match count {
            Some(count) => {
                for _ in 0..count {
                    values.push(self.element(element_type)?);
                }
            },

            None => loop {
                let marker = self.marker()?;
                if marker == b']' {
                    break;
                }
                values.push(self.value_of(marker)?);
            },
        }

        Ok(Value::Array(values))
    }

    fn object(&mut self) -> Result<Value> {
        let (element_type, count) = self.container_header()?;
        let mut map = Map::new();

        match count {
            Some(count) => {
                for _ in 0..count {
                    let key = self.string()?;
                    map.insert(key, self.element(element_type)?);
                }
            },

            None => loop {
                if self.peek() == Some(b'}') {
                    self.offset += 1;
                    break;
                }

                let key = self.string()?;
                let value = self.value()?;
                map.insert(key, value);
            },
        }

        Ok(Value::Object(map))
    }
}

/// NaN and infinities have no JSON representation.
fn float(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}
