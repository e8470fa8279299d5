//! # mesa-block-validator
//!
//! The stateless block validator core of the Mesa rollup node. For every
//! sequenced layer-2 message it reconstructs the exact input needed to
//! re-execute that message under the deterministic WASM proving machine,
//! dispatches the input to an execution backend, and compares the produced
//! post-state against the locally computed one. It persists nothing and
//! fetches nothing from the network itself; it only orchestrates the inbox,
//! streamer, recorder, data-availability, and spawner collaborators.

mod batch;
mod config;
mod da;
mod entry;
mod errors;
mod position;
mod traits;
mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use batch::{BatchAssembler, FullBatchInfo, BATCH_HEADER_LEN};
pub use config::BlockValidatorConfig;
pub use da::{header, DaError, DaReader};
pub use entry::{ReadyValidationEntry, ValidationEntry};
pub use errors::{ValidatorError, ValidatorResult};
pub use position::{build_global_state, global_state_positions_at_count, GlobalStatePosition};
pub use traits::{ExecutionRecorder, InboxReader, InboxTracker, RecordResult, TransactionStreamer};
pub use validator::{StatelessBlockValidator, StatelessBlockValidatorBuilder, ValidationVerdict};

#[cfg(feature = "test-utils")]
pub use da::MockDaReader;
#[cfg(feature = "test-utils")]
pub use traits::{
    MockExecutionRecorder, MockInboxReader, MockInboxTracker, MockTransactionStreamer,
};
