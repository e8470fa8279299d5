//! Global state commitments at message boundaries.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// The deterministic commitment to layer-2 state at a message boundary.
///
/// `block_hash` and `send_root` come from local execution; `batch` and
/// `pos_in_batch` come from the position algebra.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalState {
    pub block_hash: B256,
    pub send_root: B256,
    pub batch: u64,
    pub pos_in_batch: u64,
}

/// Result of locally executing one message, as reported by the transaction
/// streamer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct MessageResult {
    pub block_hash: B256,
    pub send_root: B256,
}
