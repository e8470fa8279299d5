//! Batch assembly: posted payload plus recovered off-chain preimages.

use std::sync::Arc;

use alloy_primitives::Bytes;
use mesa_validation_api::{MessageIndex, PreimagesMap};
use tracing::error;

use crate::{
    da::{header, DaReader},
    InboxReader, InboxTracker, ValidatorError, ValidatorResult,
};

/// Length of the fixed header prefix of a posted batch. The byte that
/// follows it is the DA scheme discriminator.
pub const BATCH_HEADER_LEN: usize = 40;

/// A batch with everything needed to hand it to the proving machine: the
/// on-chain posted data and the preimages reconstructing any off-chain
/// payload it references.
#[derive(Clone, Debug)]
pub struct FullBatchInfo {
    pub number: u64,
    pub posted_data: Bytes,
    pub msg_count: MessageIndex,
    pub preimages: PreimagesMap,
}

/// Fetches posted batches and recovers their off-chain payloads through the
/// configured data-availability readers.
pub struct BatchAssembler {
    tracker: Arc<dyn InboxTracker>,
    reader: Arc<dyn InboxReader>,
    da_readers: Vec<Arc<dyn DaReader>>,
}

impl BatchAssembler {
    pub fn new(
        tracker: Arc<dyn InboxTracker>,
        reader: Arc<dyn InboxReader>,
        da_readers: Vec<Arc<dyn DaReader>>,
    ) -> Self {
        Self {
            tracker,
            reader,
            da_readers,
        }
    }

    /// Raw posted payload of a batch the tracker already knows about.
    pub async fn read_posted_batch(&self, batch_num: u64) -> ValidatorResult<Bytes> {
        let batch_count = self.tracker.batch_count()?;
        if batch_count <= batch_num {
            return Err(ValidatorError::BatchNotFound(batch_num));
        }
        let (posted_data, _) = self.reader.get_sequencer_message_bytes(batch_num).await?;
        Ok(posted_data)
    }

    /// Full batch info including recovered preimages, or `None` if the batch
    /// is not yet known to the tracker.
    pub async fn read_full_batch(&self, batch_num: u64) -> ValidatorResult<Option<FullBatchInfo>> {
        let batch_count = self.tracker.batch_count()?;
        if batch_count <= batch_num {
            return Ok(None);
        }
        let msg_count = self.tracker.batch_message_count(batch_num)?;
        let (posted_data, batch_block_hash) =
            self.reader.get_sequencer_message_bytes(batch_num).await?;

        let mut preimages = PreimagesMap::new();
        if posted_data.len() > BATCH_HEADER_LEN {
            let header_byte = posted_data[BATCH_HEADER_LEN];
            let mut found_da = false;
            for da_reader in &self.da_readers {
                if !da_reader.is_valid_header_byte(header_byte).await {
                    continue;
                }
                match da_reader
                    .recover_payload_from_batch(
                        batch_num,
                        batch_block_hash,
                        &posted_data,
                        preimages.clone(),
                        true,
                    )
                    .await
                {
                    Ok((_, recorded)) => preimages = recorded,
                    Err(err) => {
                        // Legacy DAS readers police their own keysets by
                        // logging; other providers surface the failure.
                        if err.is_seq_msg_validation()
                            && header::is_das_message_header_byte(header_byte)
                        {
                            error!(batch = batch_num, %err, "sequencer message validation failed");
                        } else {
                            return Err(ValidatorError::DaRecovery(err));
                        }
                    }
                }
                found_da = true;
                break;
            }
            if !found_da && header::is_das_message_header_byte(header_byte) {
                error!(
                    batch = batch_num,
                    "no DAS reader configured, but sequencer message found with DAS header"
                );
            }
        }

        Ok(Some(FullBatchInfo {
            number: batch_num,
            posted_data,
            msg_count,
            preimages,
        }))
    }
}
