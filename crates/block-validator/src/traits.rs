//! Capability traits for the validator's collaborators.
//!
//! Each collaborator is consumed through a narrow capability surface so
//! tests can substitute deterministic stand-ins.

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use mesa_validation_api::{
    ChainConfig, MessageIndex, MessageResult, MessageWithMetadata, UserWasms,
};

/// Tracks posted batches and delayed messages on the parent chain.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait InboxTracker: Send + Sync {
    /// Raw payload of the delayed message with the given sequence number.
    async fn get_delayed_message_bytes(&self, seq_num: u64) -> eyre::Result<Bytes>;

    /// Cumulative message count at the end of the given batch.
    fn batch_message_count(&self, batch: u64) -> eyre::Result<MessageIndex>;

    /// Accumulator hash of the given batch.
    fn batch_acc(&self, batch: u64) -> eyre::Result<B256>;

    /// Number of batches known to the tracker.
    fn batch_count(&self) -> eyre::Result<u64>;

    /// Batch containing the given message, or `None` if the message is not
    /// covered by any known batch yet.
    fn find_batch_containing_message(&self, pos: MessageIndex) -> eyre::Result<Option<u64>>;
}

/// Reads posted sequencer batches back from the parent chain.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait InboxReader: Send + Sync {
    /// Posted batch payload and the hash of the parent-chain block anchoring
    /// it.
    async fn get_sequencer_message_bytes(&self, batch: u64) -> eyre::Result<(Bytes, B256)>;

    /// Count of messages whose batches are finalized on the parent chain.
    async fn get_finalized_msg_count(&self) -> eyre::Result<MessageIndex>;
}

/// Source of sequenced messages and their local execution results.
#[cfg_attr(feature = "test-utils", mockall::automock)]
pub trait TransactionStreamer: Send + Sync {
    fn processed_message_count(&self) -> eyre::Result<MessageIndex>;

    fn message(&self, pos: MessageIndex) -> eyre::Result<MessageWithMetadata>;

    /// Locally computed execution result at the given message index.
    fn result_at_message_index(&self, pos: MessageIndex) -> eyre::Result<MessageResult>;

    /// Callers traversing message ranges bracket the traversal with these;
    /// the validator core never calls them itself.
    fn pause_reorgs(&self);
    fn resume_reorgs(&self);

    fn chain_config(&self) -> Arc<ChainConfig>;
}

/// Output of a recording re-execution.
#[derive(Clone, Debug, Default)]
pub struct RecordResult {
    /// Post-state block hash the re-execution arrived at.
    pub block_hash: B256,
    /// Keccak-addressed preimages queried during re-execution.
    pub preimages: HashMap<B256, Bytes>,
    /// User-wasm code invoked during re-execution.
    pub user_wasms: UserWasms,
}

/// Re-executes a message locally, capturing the hashes and code it touches.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait ExecutionRecorder: Send + Sync {
    async fn record_block_creation(
        &self,
        pos: MessageIndex,
        msg: &MessageWithMetadata,
    ) -> eyre::Result<RecordResult>;
}
