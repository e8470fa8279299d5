//! The transport-level input handed to an execution backend.

use std::collections::HashMap;

use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::{GlobalState, PreimagesMap, WasmTarget};

/// A batch payload referenced by a message's execution.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchInfo {
    pub number: u64,
    pub data: Bytes,
}

/// Everything an execution backend needs to re-execute one message under the
/// proving machine.
///
/// Preimage and user-wasm maps are materialized per target at construction
/// time, never lazily. The JSON form of this struct is the diagnostic export
/// format, with PascalCase keys and 0x-hex payloads.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationInput {
    pub id: u64,
    pub has_delayed_msg: bool,
    #[serde(rename = "DelayedMsgNr")]
    pub delayed_msg_nr: u64,
    pub preimages: PreimagesMap,
    pub user_wasms: HashMap<WasmTarget, HashMap<B256, Bytes>>,
    pub batch_info: Vec<BatchInfo>,
    pub delayed_msg: Bytes,
    pub start_state: GlobalState,
    pub debug_chain: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_json_uses_legacy_delayed_key() {
        let input = ValidationInput {
            id: 5,
            has_delayed_msg: true,
            delayed_msg_nr: 9,
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["Id"], 5);
        assert_eq!(json["DelayedMsgNr"], 9);
        assert_eq!(json["HasDelayedMsg"], true);
    }

    #[test]
    fn input_json_roundtrips() {
        let mut input = ValidationInput {
            id: 1,
            batch_info: vec![BatchInfo {
                number: 3,
                data: Bytes::from_static(b"batch"),
            }],
            ..Default::default()
        };
        input
            .user_wasms
            .entry(WasmTarget::wavm())
            .or_default()
            .insert(B256::repeat_byte(7), Bytes::from_static(b"code"));
        let json = serde_json::to_string(&input).unwrap();
        let back: ValidationInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, input);
    }
}
