//! Document identifier.

use crate::error::{CodecError, CodecResult};
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Size of an object id in bytes.
pub const OBJECT_ID_LEN: usize = 12;

const COUNTER_MASK: u32 = 0x00ff_ffff;

/// Unique identifier for a document.
///
/// Object ids are 12-byte values laid out as:
/// - 4 bytes: seconds since the Unix epoch (big-endian)
/// - 5 bytes: random value chosen once per process
/// - 3 bytes: counter (big-endian), seeded randomly
///
/// Byte order therefore follows creation time, and ids generated in one
/// process never repeat until the 24-bit counter wraps within one second.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Generates a new object id stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        #[allow(clippy::cast_possible_truncation)]
        Self::with_timestamp(secs as u32)
    }

    /// Generates a new object id with the given timestamp in seconds.
    #[must_use]
    pub fn with_timestamp(secs: u32) -> Self {
        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(process_unique());
        let count = next_count();
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Creates an object id from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// Returns the creation time in seconds since the Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Renders the id as 24 lowercase hex characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parses an id from 24 hex characters (either case).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidObjectId`] if the text is not exactly
    /// 24 hex digits.
    pub fn parse_hex(text: &str) -> CodecResult<Self> {
        let raw = text.as_bytes();
        if raw.len() != OBJECT_ID_LEN * 2 {
            return Err(CodecError::InvalidObjectId(text.to_string()));
        }
        let mut bytes = [0u8; OBJECT_ID_LEN];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = hex_digit(pair[0]).ok_or_else(|| CodecError::InvalidObjectId(text.into()))?;
            let lo = hex_digit(pair[1]).ok_or_else(|| CodecError::InvalidObjectId(text.into()))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn process_unique() -> &'static [u8; 5] {
    static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
    PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen())
}

fn next_count() -> u32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    let counter =
        COUNTER.get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..=COUNTER_MASK)));
    counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl From<[u8; OBJECT_ID_LEN]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<ObjectId> for [u8; OBJECT_ID_LEN] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        let id1 = ObjectId::new();
        let id2 = ObjectId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn ids_share_process_bytes() {
        let id1 = ObjectId::new();
        let id2 = ObjectId::new();
        assert_eq!(id1.as_bytes()[4..9], id2.as_bytes()[4..9]);
    }

    #[test]
    fn timestamp_prefix() {
        let id = ObjectId::with_timestamp(0x0102_0304);
        assert_eq!(id.timestamp(), 0x0102_0304);
        assert_eq!(&id.as_bytes()[0..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn ordering_follows_timestamp() {
        let older = ObjectId::with_timestamp(100);
        let newer = ObjectId::with_timestamp(200);
        assert!(older < newer);
    }

    #[test]
    fn hex_roundtrip() {
        let id = ObjectId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 24);
        assert_eq!(ObjectId::parse_hex(&hex).unwrap(), id);
        assert_eq!(hex.parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn parse_accepts_uppercase() {
        let id = ObjectId::parse_hex("4F1A2B3C4D5E6F7A8B9C0D1E").unwrap();
        assert_eq!(id.to_hex(), "4f1a2b3c4d5e6f7a8b9c0d1e");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(ObjectId::parse_hex("").is_err());
        assert!(ObjectId::parse_hex("4f1a2b3c4d5e6f7a8b9c0d1").is_err());
        assert!(ObjectId::parse_hex("zz1a2b3c4d5e6f7a8b9c0d1e").is_err());
        assert!(ObjectId::parse_hex("4f1a2b3c4d5e6f7a8b9c0d1e00").is_err());
    }
}
