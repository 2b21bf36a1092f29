// firewatch_sim/src/simulation/bus/codec.rs

//! Binary packets exchanged with the broker. All integers are little-endian.
//!
//! ```text
//! KEEP_ALIVE  0x80
//! SUBSCRIBE   0x81 n (len name)*n
//! PUBLISH     0x82 type len name value[4]      type 1 = i32, 2 = f32
//! ```

use thiserror::Error;

use crate::simulation::bus::Value;

pub const TAG_KEEP_ALIVE: u8 = 0x80;
pub const TAG_SUBSCRIBE: u8 = 0x81;
pub const TAG_PUBLISH: u8 = 0x82;

pub const TYPE_INT: u8 = 1;
pub const TYPE_FLOAT: u8 = 2;

pub const KEEP_ALIVE: [u8; 1] = [TAG_KEEP_ALIVE];

/// Longest topic name a length byte can describe.
pub const MAX_NAME_LEN: usize = u8::MAX as usize;
/// Most names a single SUBSCRIBE packet can carry.
pub const MAX_NAMES_PER_SUBSCRIBE: usize = u8::MAX as usize;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("empty packet")]
    Empty,
    #[error("unknown packet tag 0x{0:02x}")]
    UnknownTag(u8),
    #[error("unknown value type {0}")]
    UnknownType(u8),
    #[error("packet truncated: needed {needed} bytes, {available} left")]
    Truncated { needed: usize, available: usize },
    #[error("topic name is {0} bytes long, at most 255 fit")]
    NameTooLong(usize),
    #[error("topic name is not valid UTF-8")]
    InvalidName,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    KeepAlive,
    Subscribe(Vec<String>),
    Publish { name: String, value: Value },
}

// =========================================================================
// == Encoding ==
// =========================================================================

fn push_name(buf: &mut Vec<u8>, name: &str) -> Result<(), CodecError> {
    let bytes = name.as_bytes();
    if bytes.len() > MAX_NAME_LEN {
        return Err(CodecError::NameTooLong(bytes.len()));
    }
    buf.push(bytes.len() as u8);
    buf.extend_from_slice(bytes);
    Ok(())
}

pub fn encode_publish(name: &str, value: Value) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(7 + name.len());
    buf.push(TAG_PUBLISH);
    match value {
        Value::Int(_) => buf.push(TYPE_INT),
        Value::Float(_) => buf.push(TYPE_FLOAT),
    }
    push_name(&mut buf, name)?;
    match value {
        Value::Int(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Float(v) => buf.extend_from_slice(&v.to_le_bytes()),
    }
    Ok(buf)
}

/// Encodes a subscription, split into as many packets as the name count needs.
pub fn encode_subscribe<S: AsRef<str>>(names: &[S]) -> Result<Vec<Vec<u8>>, CodecError> {
    names
        .chunks(MAX_NAMES_PER_SUBSCRIBE)
        .map(|chunk| {
            let mut buf = vec![TAG_SUBSCRIBE, chunk.len() as u8];
            for name in chunk {
                push_name(&mut buf, name.as_ref())?;
            }
            Ok(buf)
        })
        .collect()
}

// =========================================================================
// == Decoding ==
// =========================================================================

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.bytes.len() < n {
            return Err(CodecError::Truncated {
                needed: n,
                available: self.bytes.len(),
            });
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn word(&mut self) -> Result<[u8; 4], CodecError> {
        let mut word = [0u8; 4];
        word.copy_from_slice(self.take(4)?);
        Ok(word)
    }

    fn name(&mut self) -> Result<String, CodecError> {
        let len = self.u8()? as usize;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidName)
    }
}

pub fn decode(bytes: &[u8]) -> Result<Packet, CodecError> {
    let mut reader = Reader { bytes };
    let tag = reader.u8().map_err(|_| CodecError::Empty)?;
    match tag {
        TAG_KEEP_ALIVE => Ok(Packet::KeepAlive),
        TAG_SUBSCRIBE => {
            let count = reader.u8()? as usize;
            let names = (0..count)
                .map(|_| reader.name())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Packet::Subscribe(names))
        }
        TAG_PUBLISH => {
            let kind = reader.u8()?;
            if kind != TYPE_INT && kind != TYPE_FLOAT {
                return Err(CodecError::UnknownType(kind));
            }
            let name = reader.name()?;
            let word = reader.word()?;
            let value = if kind == TYPE_INT {
                Value::Int(i32::from_le_bytes(word))
            } else {
                Value::Float(f32::from_le_bytes(word))
            };
            Ok(Packet::Publish { name, value })
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}
