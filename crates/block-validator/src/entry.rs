//! Validation entries: the record accumulating everything needed to
//! re-execute one message.
//!
//! The lifecycle is a transition chain of types. A [`ValidationEntry`] is
//! constructed ready-for-record; the orchestrator's recording step consumes
//! it and yields a [`ReadyValidationEntry`], the only type that converts to
//! a [`ValidationInput`]. Ownership is linear throughout, so an entry is
//! never shared between tasks.

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::Bytes;
use mesa_validation_api::{
    BatchInfo, ChainConfig, GlobalState, MessageIndex, MessageWithMetadata, PreimagesMap,
    UserWasms, ValidationInput, WasmTarget,
};

use crate::{FullBatchInfo, ValidatorError, ValidatorResult};

/// A validation entry that still needs its recording re-execution.
#[derive(Debug)]
pub struct ValidationEntry {
    pub(crate) pos: MessageIndex,
    pub(crate) start: GlobalState,
    pub(crate) end: GlobalState,
    pub(crate) has_delayed_msg: bool,
    pub(crate) delayed_msg_nr: u64,
    pub(crate) chain_config: Arc<ChainConfig>,
    /// Dropped when the entry is recorded; queued Ready entries no longer
    /// hold the message.
    pub(crate) msg: MessageWithMetadata,
    pub(crate) batch_info: Vec<BatchInfo>,
    pub(crate) preimages: PreimagesMap,
}

impl ValidationEntry {
    /// Builds an entry from the assembled inputs.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: MessageIndex,
        start: GlobalState,
        end: GlobalState,
        msg: MessageWithMetadata,
        full_batch_info: &FullBatchInfo,
        prev_batches: Vec<BatchInfo>,
        prev_delayed: u64,
        chain_config: Arc<ChainConfig>,
    ) -> ValidatorResult<Self> {
        if full_batch_info.number != start.batch {
            return Err(ValidatorError::WrongBatch {
                expected: start.batch,
                got: full_batch_info.number,
            });
        }

        // Containing batch first, then the historical dependencies.
        let mut batch_info = vec![BatchInfo {
            number: full_batch_info.number,
            data: full_batch_info.posted_data.clone(),
        }];
        batch_info.extend(prev_batches);

        let mut preimages = PreimagesMap::new();
        preimages.merge_from(&full_batch_info.preimages);

        let (has_delayed_msg, delayed_msg_nr) =
            if msg.delayed_messages_read == prev_delayed + 1 {
                (true, prev_delayed)
            } else if msg.delayed_messages_read == prev_delayed {
                (false, 0)
            } else {
                return Err(ValidatorError::IllegalDelayedCount {
                    got: msg.delayed_messages_read,
                    prev: prev_delayed,
                });
            };

        Ok(Self {
            pos,
            start,
            end,
            has_delayed_msg,
            delayed_msg_nr,
            chain_config,
            msg,
            batch_info,
            preimages,
        })
    }

    pub fn pos(&self) -> MessageIndex {
        self.pos
    }

    pub fn start(&self) -> GlobalState {
        self.start
    }

    pub fn end(&self) -> GlobalState {
        self.end
    }

    pub fn has_delayed_msg(&self) -> bool {
        self.has_delayed_msg
    }

    pub fn delayed_msg_nr(&self) -> u64 {
        self.delayed_msg_nr
    }

    pub fn msg(&self) -> &MessageWithMetadata {
        &self.msg
    }

    pub fn batch_info(&self) -> &[BatchInfo] {
        &self.batch_info
    }

    /// Completes the transition to Ready with the recording outputs. The
    /// transient message is dropped here.
    pub(crate) fn into_ready(
        self,
        user_wasms: UserWasms,
        delayed_msg: Bytes,
        preimages: PreimagesMap,
    ) -> ReadyValidationEntry {
        ReadyValidationEntry {
            pos: self.pos,
            start: self.start,
            end: self.end,
            has_delayed_msg: self.has_delayed_msg,
            delayed_msg_nr: self.delayed_msg_nr,
            chain_config: self.chain_config,
            batch_info: self.batch_info,
            preimages,
            user_wasms,
            delayed_msg,
        }
    }
}

/// A recorded entry, ready to be converted into a spawner input exactly once.
#[derive(Debug)]
pub struct ReadyValidationEntry {
    pub(crate) pos: MessageIndex,
    pub(crate) start: GlobalState,
    pub(crate) end: GlobalState,
    pub(crate) has_delayed_msg: bool,
    pub(crate) delayed_msg_nr: u64,
    pub(crate) chain_config: Arc<ChainConfig>,
    pub(crate) batch_info: Vec<BatchInfo>,
    pub(crate) preimages: PreimagesMap,
    pub(crate) user_wasms: UserWasms,
    pub(crate) delayed_msg: Bytes,
}

impl ReadyValidationEntry {
    pub fn pos(&self) -> MessageIndex {
        self.pos
    }

    pub fn start(&self) -> GlobalState {
        self.start
    }

    pub fn end(&self) -> GlobalState {
        self.end
    }

    pub fn has_delayed_msg(&self) -> bool {
        self.has_delayed_msg
    }

    pub fn user_wasms(&self) -> &UserWasms {
        &self.user_wasms
    }

    /// Materializes the transport-level input for the given target set.
    ///
    /// Pure: the same entry and targets always produce equal inputs.
    pub fn to_input(&self, targets: &[WasmTarget]) -> ValidatorResult<ValidationInput> {
        if targets.is_empty() && !self.user_wasms.is_empty() {
            return Err(ValidatorError::StylusSupportRequired);
        }

        let mut user_wasms: HashMap<WasmTarget, HashMap<_, _>> = targets
            .iter()
            .map(|target| (target.clone(), HashMap::new()))
            .collect();
        for (code_hash, per_target) in &self.user_wasms {
            for target in targets {
                let Some(code) = per_target.get(target) else {
                    return Err(ValidatorError::MissingWasmTarget {
                        target: target.clone(),
                        code_hash: *code_hash,
                    });
                };
                user_wasms
                    .get_mut(target)
                    .expect("target map pre-seeded")
                    .insert(*code_hash, code.clone());
            }
        }

        Ok(ValidationInput {
            id: self.pos.as_u64(),
            has_delayed_msg: self.has_delayed_msg,
            delayed_msg_nr: self.delayed_msg_nr,
            preimages: self.preimages.clone(),
            user_wasms,
            batch_info: self.batch_info.clone(),
            delayed_msg: self.delayed_msg.clone(),
            start_state: self.start,
            debug_chain: self.chain_config.debug_mode(),
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use mesa_validation_api::PreimageType;

    use super::*;
    use crate::test_utils::{entry_fixture, EntryFixture};

    #[test]
    fn containing_batch_leads_batch_info() {
        let EntryFixture { entry, .. } = entry_fixture();
        assert_eq!(entry.batch_info()[0].number, entry.start().batch);
        assert_eq!(entry.batch_info().len(), 2);
    }

    #[test]
    fn wrong_batch_is_rejected() {
        let fx = entry_fixture();
        let mut full = fx.full_batch;
        full.number += 1;
        let err = ValidationEntry::new(
            fx.entry.pos(),
            fx.entry.start(),
            fx.entry.end(),
            fx.msg,
            &full,
            vec![],
            fx.prev_delayed,
            fx.chain_config,
        )
        .unwrap_err();
        assert!(matches!(err, ValidatorError::WrongBatch { .. }));
    }

    #[test]
    fn delayed_message_consumed_sets_bookkeeping() {
        let fx = entry_fixture();
        let mut msg = fx.msg.clone();
        msg.delayed_messages_read = fx.prev_delayed + 1;
        let entry = ValidationEntry::new(
            fx.entry.pos(),
            fx.entry.start(),
            fx.entry.end(),
            msg,
            &fx.full_batch,
            vec![],
            fx.prev_delayed,
            fx.chain_config,
        )
        .unwrap();
        assert!(entry.has_delayed_msg());
        assert_eq!(entry.delayed_msg_nr(), fx.prev_delayed);
    }

    #[test]
    fn illegal_delayed_delta_is_rejected() {
        let fx = entry_fixture();
        let mut msg = fx.msg.clone();
        msg.delayed_messages_read = 6;
        let err = ValidationEntry::new(
            fx.entry.pos(),
            fx.entry.start(),
            fx.entry.end(),
            msg,
            &fx.full_batch,
            vec![],
            4,
            fx.chain_config,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidatorError::IllegalDelayedCount { got: 6, prev: 4 }
        ));
    }

    #[test]
    fn batch_preimages_seed_the_entry() {
        let EntryFixture { entry, full_batch, .. } = entry_fixture();
        assert_eq!(entry.preimages, full_batch.preimages);
    }

    #[test]
    fn to_input_is_pure() {
        let fx = entry_fixture();
        let ready = fx.entry.into_ready(
            UserWasms::new(),
            Bytes::from_static(b"delayed"),
            PreimagesMap::new(),
        );
        let targets = [WasmTarget::wavm()];
        assert_eq!(
            ready.to_input(&targets).unwrap(),
            ready.to_input(&targets).unwrap()
        );
    }

    #[test]
    fn user_wasms_require_targets() {
        let fx = entry_fixture();
        let mut user_wasms = UserWasms::new();
        user_wasms
            .entry(B256::repeat_byte(1))
            .or_default()
            .insert(WasmTarget::wavm(), Bytes::from_static(b"code"));
        let ready = fx
            .entry
            .into_ready(user_wasms, Bytes::new(), PreimagesMap::new());
        assert!(matches!(
            ready.to_input(&[]).unwrap_err(),
            ValidatorError::StylusSupportRequired
        ));
    }

    #[test]
    fn missing_target_coverage_is_fatal() {
        let fx = entry_fixture();
        let mut user_wasms = UserWasms::new();
        user_wasms
            .entry(B256::repeat_byte(1))
            .or_default()
            .insert(WasmTarget::wavm(), Bytes::from_static(b"code"));
        let ready = fx
            .entry
            .into_ready(user_wasms, Bytes::new(), PreimagesMap::new());
        let err = ready
            .to_input(&[WasmTarget::wavm(), WasmTarget::arm64()])
            .unwrap_err();
        assert!(matches!(err, ValidatorError::MissingWasmTarget { .. }));
    }

    #[test]
    fn input_carries_per_target_code() {
        let fx = entry_fixture();
        let code_hash = B256::repeat_byte(1);
        let mut user_wasms = UserWasms::new();
        let per_target = user_wasms.entry(code_hash).or_default();
        per_target.insert(WasmTarget::wavm(), Bytes::from_static(b"wavm code"));
        per_target.insert(WasmTarget::arm64(), Bytes::from_static(b"arm code"));
        let mut preimages = PreimagesMap::new();
        preimages.insert(
            PreimageType::Keccak256,
            B256::repeat_byte(2),
            Bytes::from_static(b"pre"),
        );
        let ready = fx
            .entry
            .into_ready(user_wasms, Bytes::from_static(b"delayed"), preimages);

        let input = ready.to_input(&[WasmTarget::wavm()]).unwrap();
        assert_eq!(input.id, ready.pos().as_u64());
        assert_eq!(input.user_wasms.len(), 1);
        assert_eq!(
            input.user_wasms[&WasmTarget::wavm()][&code_hash],
            Bytes::from_static(b"wavm code")
        );
        assert_eq!(input.start_state, ready.start());
        assert!(!input.debug_chain);
    }
}
