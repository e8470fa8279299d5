//! Position algebra: mapping message counts to global-state positions.

use mesa_validation_api::{GlobalState, MessageIndex, MessageResult};

use crate::{InboxTracker, ValidatorError, ValidatorResult};

/// A point in the batch-indexed global state: `(batch, pos_in_batch)`.
///
/// `pos_in_batch` is zero-based within the batch; the post-position of a
/// batch's last message rolls over to `(batch + 1, 0)`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct GlobalStatePosition {
    pub batch: u64,
    pub pos_in_batch: u64,
}

impl GlobalStatePosition {
    pub const fn new(batch: u64, pos_in_batch: u64) -> Self {
        Self {
            batch,
            pos_in_batch,
        }
    }
}

/// Returns the global-state positions before and after processing the
/// message at the specified count. The containing batch must be provided by
/// the caller.
pub fn global_state_positions_at_count(
    tracker: &dyn InboxTracker,
    count: MessageIndex,
    batch: u64,
) -> ValidatorResult<(GlobalStatePosition, GlobalStatePosition)> {
    let msg_count_in_batch = tracker.batch_message_count(batch)?;
    let first_in_batch = if batch > 0 {
        tracker.batch_message_count(batch - 1)?
    } else {
        MessageIndex::new(0)
    };

    if msg_count_in_batch < count {
        return Err(ValidatorError::BatchDoesNotCover {
            batch,
            msg_count: msg_count_in_batch,
            count,
        });
    }
    if first_in_batch >= count {
        return Err(ValidatorError::BatchStartsPastCount {
            batch,
            first_in_batch,
            count,
        });
    }

    let pos_in_batch = count.as_u64() - first_in_batch.as_u64() - 1;
    let start = GlobalStatePosition::new(batch, pos_in_batch);
    let end = if msg_count_in_batch == count {
        GlobalStatePosition::new(batch + 1, 0)
    } else {
        GlobalStatePosition::new(batch, pos_in_batch + 1)
    };
    Ok((start, end))
}

/// Combines a local execution result with a computed position into the full
/// global-state commitment.
pub fn build_global_state(res: MessageResult, pos: GlobalStatePosition) -> GlobalState {
    GlobalState {
        block_hash: res.block_hash,
        send_root: res.send_root,
        batch: pos.batch,
        pos_in_batch: pos.pos_in_batch,
    }
}
