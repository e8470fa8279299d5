//! Chain-level configuration surfaced by the transaction streamer.

use serde::{Deserialize, Serialize};

/// The subset of chain configuration the validator cares about.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ChainConfig {
    chain_id: u64,
    debug_mode: bool,
}

impl ChainConfig {
    pub fn new(chain_id: u64, debug_mode: bool) -> Self {
        Self {
            chain_id,
            debug_mode,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Whether the chain runs with debug-mode arbitrators enabled.
    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }
}
