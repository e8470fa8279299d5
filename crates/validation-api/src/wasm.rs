//! User-wasm target architectures.

use std::{collections::HashMap, fmt};

use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

/// Target architecture a user-deployed wasm program is compiled for.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct WasmTarget(String);

impl WasmTarget {
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }

    /// The deterministic proving-machine target.
    pub fn wavm() -> Self {
        Self::new("wavm")
    }

    pub fn arm64() -> Self {
        Self::new("arm64")
    }

    pub fn amd64() -> Self {
        Self::new("amd64")
    }

    pub fn host() -> Self {
        Self::new("host")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WasmTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User-deployed wasm programs captured during a recording re-execution,
/// keyed by code hash, then by the targets the code was compiled for.
pub type UserWasms = HashMap<B256, HashMap<WasmTarget, Bytes>>;
