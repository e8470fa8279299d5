//! Message index newtype.

use std::{fmt, ops};

use serde::{Deserialize, Serialize};

/// Dense, zero-based index over sequenced layer-2 messages.
///
/// Message 0 is the genesis boundary; it has no pre-state and is never the
/// subject of recording.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct MessageIndex(u64);

impl MessageIndex {
    pub const fn new(idx: u64) -> Self {
        Self(idx)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for MessageIndex {
    fn from(idx: u64) -> Self {
        Self(idx)
    }
}

impl From<MessageIndex> for u64 {
    fn from(idx: MessageIndex) -> Self {
        idx.0
    }
}

impl ops::Add<u64> for MessageIndex {
    type Output = MessageIndex;

    fn add(self, rhs: u64) -> MessageIndex {
        MessageIndex(self.0 + rhs)
    }
}

impl ops::Sub<u64> for MessageIndex {
    type Output = MessageIndex;

    fn sub(self, rhs: u64) -> MessageIndex {
        MessageIndex(self.0 - rhs)
    }
}

impl fmt::Display for MessageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
