//! Validator core error types.

use alloy_primitives::B256;
use mesa_validation_api::{MessageIndex, WasmTarget};
use mesa_validation_client::ClientError;
use thiserror::Error;

use crate::da::DaError;

/// A `Result` type for validator core operations.
pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Errors produced by the stateless block validator.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// A required collaborator was not supplied to the builder.
    #[error("missing dependency: {0}")]
    MissingDependency(&'static str),

    /// No execution-server configuration is enabled.
    #[error("no enabled execution servers")]
    NoExecutionServers,

    /// The latest wasm module root was left unset.
    #[error("latest wasm module root not set")]
    MissingWasmModuleRoot,

    /// Constructing the validation pool client failed.
    #[error("creating validation pool client: {0}")]
    PoolClient(#[source] ClientError),

    /// Constructing an execution client failed.
    #[error("creating execution client: {0}")]
    ExecutionClient(#[source] ClientError),

    /// The batch is not yet known to the inbox tracker. Retryable.
    #[error("batch not found: {0}")]
    BatchNotFound(u64),

    /// The batch containing the message is not on the parent chain yet.
    /// Retryable.
    #[error("batch for message {0} not found on parent chain yet")]
    BatchNotOnChain(MessageIndex),

    /// There is no pre-state position before the first message.
    #[error("no initial state for message count 0")]
    NoInitialState,

    /// The batch does not cover the requested message count.
    #[error("batch {batch} has message count {msg_count}, does not cover {count}")]
    BatchDoesNotCover {
        batch: u64,
        msg_count: MessageIndex,
        count: MessageIndex,
    },

    /// The batch starts at or after the requested message count.
    #[error("batch {batch} starts from {first_in_batch}, past {count}")]
    BatchStartsPastCount {
        batch: u64,
        first_in_batch: MessageIndex,
        count: MessageIndex,
    },

    /// The assembled batch does not match the entry's start position.
    #[error("got wrong batch, expected {expected}, got {got}")]
    WrongBatch { expected: u64, got: u64 },

    /// The message's delayed-message accounting is inconsistent with its
    /// predecessor.
    #[error("illegal validation entry delayed message count {got}, previous {prev}")]
    IllegalDelayedCount { got: u64, prev: u64 },

    /// Local re-execution disagrees with the stored post-state.
    #[error("recording failed: pos {pos}, block hash expected {expected}, got {got}")]
    RecordingDivergence {
        pos: MessageIndex,
        expected: B256,
        got: B256,
    },

    /// No configured backend supports the requested proving machine.
    #[error("validation with wasm module root {0} not supported by node")]
    ModuleRootUnsupported(B256),

    /// The message recorded user wasms but the backend carries no targets.
    #[error("stylus support is required")]
    StylusSupportRequired,

    /// A recorded code hash has no compiled code for a requested target.
    #[error("wasm target {target} not recorded for code hash {code_hash}")]
    MissingWasmTarget {
        target: WasmTarget,
        code_hash: B256,
    },

    /// Payload recovery through a data-availability reader failed.
    #[error("data availability recovery: {0}")]
    DaRecovery(#[source] DaError),

    /// A collaborator failed; wrapped context is preserved.
    #[error(transparent)]
    Other(#[from] eyre::Error),
}

impl ValidatorError {
    /// Whether the caller may retry the same position later without
    /// structural change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BatchNotFound(_) | Self::BatchNotOnChain(_)
        )
    }
}
