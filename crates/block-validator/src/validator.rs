//! The validator orchestrator: builds Ready entries and dispatches them to
//! execution backends.

use std::sync::Arc;

use alloy_primitives::{Bytes, B256};
use eyre::WrapErr;
use mesa_validation_api::{
    BatchInfo, ExecutionSpawner, GlobalState, MessageIndex, MessageResult, PreimageType,
    UserWasms, ValidationRun, ValidationSpawner, WasmTarget,
};
use mesa_validation_client::{ChallengeExecutionClient, ExecutionClient, PoolValidationClient};
use tracing::{error, info, warn};

use crate::{
    batch::BatchAssembler,
    da::DaReader,
    entry::{ReadyValidationEntry, ValidationEntry},
    position::{self, build_global_state, GlobalStatePosition},
    BlockValidatorConfig, ExecutionRecorder, InboxReader, InboxTracker, TransactionStreamer,
    ValidatorError, ValidatorResult,
};

/// Outcome of auditing one message against an execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationVerdict {
    /// The backend reproduced the locally computed post-state.
    Agreed(GlobalState),
    /// The backend produced a different post-state. Consensus-critical:
    /// either the local execution or the proving machine is wrong.
    Disagreed { observed: GlobalState },
}

impl ValidationVerdict {
    pub fn agreed(&self) -> bool {
        matches!(self, Self::Agreed(_))
    }
}

/// Cancels the wrapped run when dropped, covering every exit path out of
/// dispatch, including unwinds.
struct RunGuard {
    run: Box<dyn ValidationRun>,
}

impl RunGuard {
    fn new(run: Box<dyn ValidationRun>) -> Self {
        Self { run }
    }

    async fn await_output(&mut self) -> eyre::Result<GlobalState> {
        self.run.await_output().await
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.run.cancel();
    }
}

/// Builder for the stateless block validator.
///
/// Collaborators are required; execution spawners are constructed from the
/// configuration unless explicitly injected.
#[derive(Default)]
pub struct StatelessBlockValidatorBuilder {
    config: BlockValidatorConfig,
    latest_wasm_module_root: B256,
    inbox_tracker: Option<Arc<dyn InboxTracker>>,
    inbox_reader: Option<Arc<dyn InboxReader>>,
    streamer: Option<Arc<dyn TransactionStreamer>>,
    recorder: Option<Arc<dyn ExecutionRecorder>>,
    da_readers: Vec<Arc<dyn DaReader>>,
    exec_spawners: Vec<Arc<dyn ExecutionSpawner>>,
    pool_client: Option<Arc<dyn ValidationSpawner>>,
}

impl StatelessBlockValidatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: BlockValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_latest_wasm_module_root(mut self, module_root: B256) -> Self {
        self.latest_wasm_module_root = module_root;
        self
    }

    pub fn with_inbox_tracker(mut self, tracker: Arc<dyn InboxTracker>) -> Self {
        self.inbox_tracker = Some(tracker);
        self
    }

    pub fn with_inbox_reader(mut self, reader: Arc<dyn InboxReader>) -> Self {
        self.inbox_reader = Some(reader);
        self
    }

    pub fn with_streamer(mut self, streamer: Arc<dyn TransactionStreamer>) -> Self {
        self.streamer = Some(streamer);
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn ExecutionRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn with_da_readers(mut self, da_readers: Vec<Arc<dyn DaReader>>) -> Self {
        self.da_readers = da_readers;
        self
    }

    /// Injects a pre-built execution spawner instead of constructing clients
    /// from the configuration.
    pub fn with_execution_spawner(mut self, spawner: Arc<dyn ExecutionSpawner>) -> Self {
        self.exec_spawners.push(spawner);
        self
    }

    /// Injects a pre-built pool client instead of constructing one from the
    /// configuration.
    pub fn with_pool_client(mut self, client: Arc<dyn ValidationSpawner>) -> Self {
        self.pool_client = Some(client);
        self
    }

    pub fn build(self) -> ValidatorResult<StatelessBlockValidator> {
        let inbox_tracker = self
            .inbox_tracker
            .ok_or(ValidatorError::MissingDependency("inbox_tracker"))?;
        let inbox_reader = self
            .inbox_reader
            .ok_or(ValidatorError::MissingDependency("inbox_reader"))?;
        let streamer = self
            .streamer
            .ok_or(ValidatorError::MissingDependency("streamer"))?;
        let recorder = self
            .recorder
            .ok_or(ValidatorError::MissingDependency("recorder"))?;

        let mut exec_spawners = self.exec_spawners;
        if exec_spawners.is_empty() {
            for server in self.config.enabled_servers() {
                let client =
                    ExecutionClient::new(server).map_err(ValidatorError::ExecutionClient)?;
                exec_spawners.push(Arc::new(client));
            }
        }
        if exec_spawners.is_empty() {
            return Err(ValidatorError::NoExecutionServers);
        }
        if self.latest_wasm_module_root == B256::ZERO {
            return Err(ValidatorError::MissingWasmModuleRoot);
        }

        let pool_client = match self.pool_client {
            Some(client) => Some(client),
            None if self.config.validation_pool.is_enabled() => {
                let client = PoolValidationClient::new(&self.config.validation_pool)
                    .map_err(ValidatorError::PoolClient)?;
                Some(Arc::new(client) as Arc<dyn ValidationSpawner>)
            }
            None => None,
        };

        let challenge_spawners = exec_spawners
            .iter()
            .cloned()
            .map(ChallengeExecutionClient::new)
            .collect();

        let batches = BatchAssembler::new(inbox_tracker.clone(), inbox_reader, self.da_readers);

        Ok(StatelessBlockValidator {
            exec_spawners,
            challenge_spawners,
            pool_client,
            recorder,
            inbox_tracker,
            streamer,
            batches,
            latest_wasm_module_root: self.latest_wasm_module_root,
        })
    }
}

/// The stateless block validator: reconstructs proving-machine inputs for
/// sequenced messages and audits execution backends against the node's own
/// results.
pub struct StatelessBlockValidator {
    exec_spawners: Vec<Arc<dyn ExecutionSpawner>>,
    challenge_spawners: Vec<ChallengeExecutionClient>,
    pool_client: Option<Arc<dyn ValidationSpawner>>,
    recorder: Arc<dyn ExecutionRecorder>,
    inbox_tracker: Arc<dyn InboxTracker>,
    streamer: Arc<dyn TransactionStreamer>,
    batches: BatchAssembler,
    latest_wasm_module_root: B256,
}

impl std::fmt::Debug for StatelessBlockValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatelessBlockValidator")
            .field("exec_spawners_len", &self.exec_spawners.len())
            .field("challenge_spawners_len", &self.challenge_spawners.len())
            .field("pool_client_set", &self.pool_client.is_some())
            .field("latest_wasm_module_root", &self.latest_wasm_module_root)
            .finish_non_exhaustive()
    }
}

impl StatelessBlockValidator {
    pub fn builder() -> StatelessBlockValidatorBuilder {
        StatelessBlockValidatorBuilder::new()
    }

    pub fn execution_spawners(&self) -> &[Arc<dyn ExecutionSpawner>] {
        &self.exec_spawners
    }

    pub fn challenge_spawners(&self) -> &[ChallengeExecutionClient] {
        &self.challenge_spawners
    }

    pub fn latest_wasm_module_root(&self) -> B256 {
        self.latest_wasm_module_root
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn override_recorder(&mut self, recorder: Arc<dyn ExecutionRecorder>) {
        self.recorder = recorder;
    }

    /// Global-state positions before and after processing the message at the
    /// specified count.
    pub fn global_state_positions_at_count(
        &self,
        count: MessageIndex,
    ) -> ValidatorResult<(GlobalStatePosition, GlobalStatePosition)> {
        if count.is_zero() {
            return Err(ValidatorError::NoInitialState);
        }
        if count == MessageIndex::new(1) {
            // Bootstrapping: the first message's post-state enters batch 1 at
            // offset 0, its pre-state is the genesis zero.
            return Ok((
                GlobalStatePosition::default(),
                GlobalStatePosition::new(1, 0),
            ));
        }
        let batch = self
            .inbox_tracker
            .find_batch_containing_message(count - 1)?
            .ok_or(ValidatorError::BatchNotOnChain(count - 1))?;
        position::global_state_positions_at_count(self.inbox_tracker.as_ref(), count, batch)
    }

    /// Advances an entry to Ready: cross-checks the local re-execution,
    /// merges its preimages, and fetches the delayed payload if consumed.
    pub async fn record_entry(
        &self,
        mut entry: ValidationEntry,
    ) -> ValidatorResult<ReadyValidationEntry> {
        let mut user_wasms = UserWasms::new();
        if !entry.pos.is_zero() {
            let recording = self
                .recorder
                .record_block_creation(entry.pos, &entry.msg)
                .await?;
            if recording.block_hash != entry.end.block_hash {
                return Err(ValidatorError::RecordingDivergence {
                    pos: entry.pos,
                    expected: entry.end.block_hash,
                    got: recording.block_hash,
                });
            }
            if !recording.preimages.is_empty() {
                entry
                    .preimages
                    .merge_typed(PreimageType::Keccak256, recording.preimages);
            }
            user_wasms = recording.user_wasms;
        }

        let mut delayed_msg = Bytes::new();
        if entry.has_delayed_msg {
            delayed_msg = self
                .inbox_tracker
                .get_delayed_message_bytes(entry.delayed_msg_nr)
                .await
                .map_err(|err| {
                    error!(
                        %err,
                        seq = entry.delayed_msg_nr,
                        pos = %entry.pos,
                        "error while trying to read delayed msg for proving"
                    );
                    err.wrap_err("error while trying to read delayed msg for proving")
                })?;
        }

        let preimages = std::mem::take(&mut entry.preimages);
        Ok(entry.into_ready(user_wasms, delayed_msg, preimages))
    }

    /// Gathers everything needed to re-execute the message at `pos` and
    /// returns the entry in Ready stage.
    pub async fn create_ready_validation_entry(
        &self,
        pos: MessageIndex,
    ) -> ValidatorResult<ReadyValidationEntry> {
        let msg = self.streamer.message(pos)?;
        let result = self.streamer.result_at_message_index(pos)?;
        let (prev_delayed, prev_result) = if !pos.is_zero() {
            let prev = self.streamer.message(pos - 1)?;
            let prev_result = self.streamer.result_at_message_index(pos - 1)?;
            (prev.delayed_messages_read, prev_result)
        } else {
            (0, MessageResult::default())
        };

        let (start_pos, end_pos) = self.global_state_positions_at_count(pos + 1)?;
        let start = build_global_state(prev_result, start_pos);
        let end = build_global_state(result, end_pos);

        let full_batch_info = self
            .batches
            .read_full_batch(start.batch)
            .await?
            .ok_or(ValidatorError::BatchNotFound(start.batch))?;

        let prev_batch_nums = msg.message.past_batches_required()?;
        let mut prev_batches = Vec::with_capacity(prev_batch_nums.len());
        for batch_num in prev_batch_nums {
            let data = self.batches.read_posted_batch(batch_num).await?;
            prev_batches.push(BatchInfo {
                number: batch_num,
                data,
            });
        }

        let entry = ValidationEntry::new(
            pos,
            start,
            end,
            msg,
            &full_batch_info,
            prev_batches,
            prev_delayed,
            self.streamer.chain_config(),
        )?;
        self.record_entry(entry).await
    }

    /// Re-executes the message at `pos` on an execution backend and compares
    /// the produced post-state against the locally computed one.
    ///
    /// With `use_exec` set, the pool client is bypassed and a direct
    /// execution spawner is used even when the pool is configured.
    pub async fn validate_result(
        &self,
        pos: MessageIndex,
        use_exec: bool,
        module_root: B256,
    ) -> ValidatorResult<ValidationVerdict> {
        let entry = self.create_ready_validation_entry(pos).await?;

        let mut run: Option<RunGuard> = None;
        if !use_exec {
            if let Some(pool) = &self.pool_client {
                if pool.supports_module(module_root) {
                    let input = entry.to_input(&pool.stylus_archs())?;
                    run = Some(RunGuard::new(pool.launch(input, module_root)));
                }
            }
        }
        if run.is_none() {
            for spawner in &self.exec_spawners {
                if spawner.supports_module(module_root) {
                    let input = entry.to_input(&spawner.stylus_archs())?;
                    run = Some(RunGuard::new(spawner.launch(input, module_root)));
                    break;
                }
            }
        }
        let Some(mut run) = run else {
            return Err(ValidatorError::ModuleRootUnsupported(module_root));
        };

        let gs_end = run.await_output().await?;
        if gs_end != entry.end() {
            warn!(
                %pos,
                observed = ?gs_end,
                expected = ?entry.end(),
                "execution backend disagrees with local post-state"
            );
            return Ok(ValidationVerdict::Disagreed { observed: gs_end });
        }
        Ok(ValidationVerdict::Agreed(entry.end()))
    }

    /// Builds the transport JSON form of the validation input at `pos`, for
    /// diagnostic export.
    pub async fn validation_inputs_at(
        &self,
        pos: MessageIndex,
        targets: &[WasmTarget],
    ) -> ValidatorResult<serde_json::Value> {
        let entry = self.create_ready_validation_entry(pos).await?;
        let input = entry.to_input(targets)?;
        serde_json::to_value(&input)
            .wrap_err("serializing validation input")
            .map_err(ValidatorError::Other)
    }

    /// Starts the pool client, then each execution spawner.
    pub async fn start(&self) -> ValidatorResult<()> {
        if let Some(pool) = &self.pool_client {
            pool.start()
                .await
                .wrap_err("starting validation pool client")?;
        }
        for spawner in &self.exec_spawners {
            spawner.start().await?;
        }
        info!(
            spawners = self.exec_spawners.len(),
            pool = self.pool_client.is_some(),
            "stateless block validator started"
        );
        Ok(())
    }

    /// Stops the execution spawners, then the pool client.
    pub fn stop(&self) {
        for spawner in &self.exec_spawners {
            spawner.stop();
        }
        if let Some(pool) = &self.pool_client {
            pool.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mesa_validation_api::ChainConfig;
    use mesa_validation_client::PoolClientConfig;

    use super::*;
    use crate::test_utils::{
        TestInboxReader, TestInboxTracker, TestRecorder, TestSpawner, TestStreamer,
    };

    fn collaborators() -> StatelessBlockValidatorBuilder {
        StatelessBlockValidator::builder()
            .with_inbox_tracker(Arc::new(TestInboxTracker::with_batches(&[3, 5])))
            .with_inbox_reader(Arc::new(TestInboxReader::default()))
            .with_streamer(Arc::new(TestStreamer::new(ChainConfig::new(1, false))))
            .with_recorder(Arc::new(TestRecorder::default()))
    }

    fn spawner() -> Arc<TestSpawner> {
        Arc::new(TestSpawner::new(
            "test",
            vec![WasmTarget::wavm()],
            vec![B256::repeat_byte(7)],
            Ok(GlobalState::default()),
        ))
    }

    #[test]
    fn missing_collaborator_is_rejected() {
        let err = StatelessBlockValidator::builder().build().unwrap_err();
        assert!(matches!(err, ValidatorError::MissingDependency(_)));
    }

    #[test]
    fn no_enabled_execution_servers_is_rejected() {
        let err = collaborators()
            .with_latest_wasm_module_root(B256::repeat_byte(7))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidatorError::NoExecutionServers));
    }

    #[test]
    fn zero_module_root_is_rejected() {
        let err = collaborators()
            .with_execution_spawner(spawner())
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidatorError::MissingWasmModuleRoot));
    }

    #[test]
    fn pool_client_with_empty_url_fails_construction() {
        let config = BlockValidatorConfig {
            validation_pool: PoolClientConfig {
                enabled: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = collaborators()
            .with_config(config)
            .with_execution_spawner(spawner())
            .with_latest_wasm_module_root(B256::repeat_byte(7))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidatorError::PoolClient(_)));
    }

    #[test]
    fn builder_derives_challenge_views() {
        let validator = collaborators()
            .with_execution_spawner(spawner())
            .with_latest_wasm_module_root(B256::repeat_byte(7))
            .build()
            .unwrap();
        assert_eq!(validator.execution_spawners().len(), 1);
        assert_eq!(validator.challenge_spawners().len(), 1);
        assert_eq!(validator.challenge_spawners()[0].name(), "test");
        assert_eq!(validator.latest_wasm_module_root(), B256::repeat_byte(7));
    }

    #[test]
    fn positions_at_count_zero_and_one() {
        let validator = collaborators()
            .with_execution_spawner(spawner())
            .with_latest_wasm_module_root(B256::repeat_byte(7))
            .build()
            .unwrap();

        assert!(matches!(
            validator.global_state_positions_at_count(MessageIndex::new(0)),
            Err(ValidatorError::NoInitialState)
        ));
        let (start, end) = validator
            .global_state_positions_at_count(MessageIndex::new(1))
            .unwrap();
        assert_eq!(start, GlobalStatePosition::new(0, 0));
        assert_eq!(end, GlobalStatePosition::new(1, 0));
    }

    #[test]
    fn positions_fail_before_batch_is_posted() {
        let validator = collaborators()
            .with_execution_spawner(spawner())
            .with_latest_wasm_module_root(B256::repeat_byte(7))
            .build()
            .unwrap();

        // Tracker covers messages 0..5; count 7 needs message 6.
        let err = validator
            .global_state_positions_at_count(MessageIndex::new(7))
            .unwrap_err();
        assert!(matches!(err, ValidatorError::BatchNotOnChain(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn record_entry_merges_recorder_preimages_under_keccak() {
        use alloy_primitives::keccak256;

        use crate::{test_utils::entry_fixture, MockExecutionRecorder, RecordResult};

        let mut recorder = MockExecutionRecorder::new();
        recorder
            .expect_record_block_creation()
            .times(1)
            .returning(|_, _| {
                let mut preimages = std::collections::HashMap::new();
                preimages.insert(
                    keccak256(b"recorded"),
                    alloy_primitives::Bytes::from_static(b"recorded"),
                );
                Ok(RecordResult {
                    // Matches the fixture entry's end block hash.
                    block_hash: B256::repeat_byte(0xb1),
                    preimages,
                    user_wasms: Default::default(),
                })
            });

        let validator = collaborators()
            .with_recorder(Arc::new(recorder))
            .with_execution_spawner(spawner())
            .with_latest_wasm_module_root(B256::repeat_byte(7))
            .build()
            .unwrap();

        let ready = validator.record_entry(entry_fixture().entry).await.unwrap();
        let input = ready.to_input(&[]).unwrap();
        assert!(input
            .preimages
            .get(PreimageType::Keccak256, &keccak256(b"recorded"))
            .is_some());
        // The batch-seeded preimage survives the merge.
        assert!(input
            .preimages
            .get(PreimageType::Keccak256, &keccak256(b"seed"))
            .is_some());
    }

    #[test]
    fn message_level_positions_roundtrip_through_count_level() {
        let validator = collaborators()
            .with_execution_spawner(spawner())
            .with_latest_wasm_module_root(B256::repeat_byte(7))
            .build()
            .unwrap();

        let tracker = TestInboxTracker::with_batches(&[3, 5]);
        for pos in 1..5u64 {
            let count = MessageIndex::new(pos + 1);
            let (start, end) = validator.global_state_positions_at_count(count).unwrap();
            let (start2, end2) =
                position::global_state_positions_at_count(&tracker, count, start.batch).unwrap();
            assert_eq!((start, end), (start2, end2));
        }
    }
}
