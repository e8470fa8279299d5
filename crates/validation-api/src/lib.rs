//! # mesa-validation-api
//!
//! Shared types and capability traits for the Mesa block validator stack.
//! This crate defines the data that crosses the boundary between the
//! stateless validator core and its execution backends: global states,
//! preimage maps, user-wasm code bundles, and the [`ValidationInput`] handed
//! to a spawner, plus the spawner-side capability traits themselves.

mod chain;
mod global_state;
mod index;
mod input;
mod message;
mod preimages;
mod traits;
mod wasm;

pub use chain::ChainConfig;
pub use global_state::{GlobalState, MessageResult};
pub use index::MessageIndex;
pub use input::{BatchInfo, ValidationInput};
pub use message::{
    BatchPostingReport, L1IncomingMessage, MessageHeader, MessageWithMetadata,
    BATCH_POSTING_REPORT_KIND, END_OF_BLOCK_KIND, ETH_DEPOSIT_KIND, INITIALIZE_KIND,
    L2_MESSAGE_KIND, SUBMIT_RETRYABLE_KIND,
};
pub use preimages::{PreimageType, PreimagesMap};
pub use traits::{ChallengeSpawner, ExecutionSpawner, ValidationRun, ValidationSpawner};
pub use wasm::{UserWasms, WasmTarget};
