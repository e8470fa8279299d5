//! Data-availability reader capability and posted-batch header bytes.

use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use mesa_validation_api::PreimagesMap;
use thiserror::Error;

/// Header-byte flags of posted sequencer batches.
///
/// The first 40 bytes of a posted batch are a fixed header; byte 40 is the
/// scheme discriminator DA readers are consulted with.
pub mod header {
    /// Plain brotli-compressed batch data, no DA indirection.
    pub const BROTLI_MESSAGE_HEADER_BYTE: u8 = 0x00;

    /// Legacy DAS payload.
    pub const DAS_MESSAGE_HEADER_FLAG: u8 = 0x80;

    /// DAS payload carrying a data merkle tree.
    pub const TREE_DAS_MESSAGE_HEADER_FLAG: u8 = 0x08;

    /// Zero-heavy encoded payload.
    pub const ZEROHEAVY_MESSAGE_HEADER_FLAG: u8 = 0x20;

    /// Payload referenced through parent-chain blob hashes.
    pub const BLOB_HASHES_HEADER_FLAG: u8 = 0x10;

    const fn has_bits(header_byte: u8, flags: u8) -> bool {
        header_byte & flags == flags
    }

    /// Whether the header byte indicates a legacy DAS payload.
    pub const fn is_das_message_header_byte(header_byte: u8) -> bool {
        has_bits(header_byte, DAS_MESSAGE_HEADER_FLAG)
    }

    /// Whether the header byte indicates a tree-DAS payload.
    pub const fn is_tree_das_message_header_byte(header_byte: u8) -> bool {
        has_bits(header_byte, TREE_DAS_MESSAGE_HEADER_FLAG)
    }

    /// Whether the header byte indicates a blob-carried payload.
    pub const fn is_blob_hashes_header_byte(header_byte: u8) -> bool {
        has_bits(header_byte, BLOB_HASHES_HEADER_FLAG)
    }
}

/// Errors surfaced by DA payload recovery.
#[derive(Debug, Error)]
pub enum DaError {
    /// The posted sequencer message failed the provider's own validation
    /// (e.g. an unknown or invalid keyset).
    #[error("sequencer message validation: {0}")]
    SeqMsgValidation(String),

    /// A preimage referenced by the payload could not be resolved.
    #[error("preimage not available: {0}")]
    PreimageNotFound(B256),

    #[error(transparent)]
    Other(#[from] eyre::Error),
}

impl DaError {
    /// Whether this is the sequencer-message-validation sentinel that legacy
    /// DAS payloads are allowed to bypass.
    pub fn is_seq_msg_validation(&self) -> bool {
        matches!(self, Self::SeqMsgValidation(_))
    }
}

/// A data-availability provider able to recover off-chain batch payloads.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait DaReader: Send + Sync {
    /// Whether this reader recognizes the given scheme discriminator.
    async fn is_valid_header_byte(&self, header_byte: u8) -> bool;

    /// Recovers the batch payload, returning it together with the preimages
    /// discovered along the way (seeded with `seed` when
    /// `record_preimages` is set).
    async fn recover_payload_from_batch(
        &self,
        batch_num: u64,
        batch_block_hash: B256,
        posted_data: &[u8],
        seed: PreimagesMap,
        record_preimages: bool,
    ) -> Result<(Bytes, PreimagesMap), DaError>;
}
