//! Relay channel wire protocol
//!
//! Bridge → subscribers, one JSON text frame per card tap:
//!
//! ```json
//! {"kind":"card_tap","version":1,"uid":"04a2b3c4d5"}
//! ```
//!
//! `uid` stays a top-level field so that page scripts reading `data.uid`
//! work unchanged. Frames with an unknown `kind`, a missing or unsupported
//! `version`, or an invalid `uid` are rejected, never partially parsed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current relay protocol version
pub const RELAY_PROTOCOL_VERSION: u16 = 1;

/// Longest UID accepted on the relay or the HTTP boundary
pub const MAX_UID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidUid {
    #[error("UID is empty")]
    Empty,
    #[error("UID is longer than {MAX_UID_LEN} characters")]
    TooLong,
    #[error("UID contains whitespace or control characters")]
    BadCharacter,
    #[error("UID is not an even-length hex string: {0}")]
    NotHex(String),
}

/// Card identifier as broadcast by a reader and stored on a member
///
/// Canonical form: trimmed, ASCII letters uppercased. Readers, the intake
/// form and the check-in endpoint all go through [`CardUid::new`], so the
/// same card always compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardUid(String);

impl CardUid {
    /// Trimmed, non-empty, bounded, printable; folded to uppercase
    pub fn new(raw: &str) -> Result<Self, InvalidUid> {
        let uid = raw.trim();
        if uid.is_empty() {
            return Err(InvalidUid::Empty);
        }
        if uid.len() > MAX_UID_LEN {
            return Err(InvalidUid::TooLong);
        }
        if uid.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(InvalidUid::BadCharacter);
        }
        Ok(Self(uid.to_ascii_uppercase()))
    }

    /// UID read from hardware: additionally an even-length hex string
    pub fn from_hardware(raw: &str) -> Result<Self, InvalidUid> {
        let uid = Self::new(raw)?;
        if uid.0.len() % 2 != 0 || !uid.0.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidUid::NotHex(uid.0));
        }
        Ok(uid)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CardUid {
    type Error = InvalidUid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CardUid> for String {
    fn from(uid: CardUid) -> Self {
        uid.0
    }
}

/// Payload of a `card_tap` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTap {
    pub version: u16,
    pub uid: CardUid,
}

impl CardTap {
    pub fn new(uid: CardUid) -> Self {
        Self {
            version: RELAY_PROTOCOL_VERSION,
            uid,
        }
    }
}

/// Relay envelope, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelayMessage {
    CardTap(CardTap),
}

#[derive(Debug, thiserror::Error)]
pub enum RelayDecodeError {
    #[error("malformed relay frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported relay protocol version {0}")]
    UnsupportedVersion(u16),
}

impl RelayMessage {
    pub fn card_tap(uid: CardUid) -> Self {
        Self::CardTap(CardTap::new(uid))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Validate and decode one text frame
    pub fn decode(frame: &str) -> Result<Self, RelayDecodeError> {
        let msg: RelayMessage = serde_json::from_str(frame)?;
        match &msg {
            RelayMessage::CardTap(tap) if tap.version != RELAY_PROTOCOL_VERSION => {
                Err(RelayDecodeError::UnsupportedVersion(tap.version))
            }
            _ => Ok(msg),
        }
    }
}
