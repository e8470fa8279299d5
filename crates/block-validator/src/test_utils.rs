//! Deterministic collaborator stand-ins for tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use alloy_primitives::{keccak256, Bytes, B256};
use async_trait::async_trait;
use mesa_validation_api::{
    BatchInfo, ChainConfig, ExecutionSpawner, GlobalState, L1IncomingMessage, MessageHeader,
    MessageIndex, MessageResult, MessageWithMetadata, PreimageType, PreimagesMap,
    ValidationInput, ValidationRun, ValidationSpawner, WasmTarget, L2_MESSAGE_KIND,
};

use crate::{
    da::{DaError, DaReader},
    ExecutionRecorder, FullBatchInfo, InboxReader, InboxTracker, RecordResult,
    TransactionStreamer, ValidationEntry,
};

/// Inbox tracker scripted with cumulative per-batch message counts.
#[derive(Debug, Default)]
pub struct TestInboxTracker {
    batch_msg_counts: Vec<u64>,
    delayed_msgs: HashMap<u64, Bytes>,
}

impl TestInboxTracker {
    /// `counts[i]` is the cumulative message count at the end of batch `i`.
    pub fn with_batches(counts: &[u64]) -> Self {
        Self {
            batch_msg_counts: counts.to_vec(),
            delayed_msgs: HashMap::new(),
        }
    }

    pub fn add_delayed_message(mut self, seq_num: u64, data: Bytes) -> Self {
        self.delayed_msgs.insert(seq_num, data);
        self
    }
}

#[async_trait]
impl InboxTracker for TestInboxTracker {
    async fn get_delayed_message_bytes(&self, seq_num: u64) -> eyre::Result<Bytes> {
        self.delayed_msgs
            .get(&seq_num)
            .cloned()
            .ok_or_else(|| eyre::eyre!("delayed message {seq_num} not found"))
    }

    fn batch_message_count(&self, batch: u64) -> eyre::Result<MessageIndex> {
        self.batch_msg_counts
            .get(batch as usize)
            .map(|c| MessageIndex::new(*c))
            .ok_or_else(|| eyre::eyre!("batch {batch} not tracked"))
    }

    fn batch_acc(&self, batch: u64) -> eyre::Result<B256> {
        Ok(keccak256(batch.to_be_bytes()))
    }

    fn batch_count(&self) -> eyre::Result<u64> {
        Ok(self.batch_msg_counts.len() as u64)
    }

    fn find_batch_containing_message(&self, pos: MessageIndex) -> eyre::Result<Option<u64>> {
        for (batch, count) in self.batch_msg_counts.iter().enumerate() {
            if *count > pos.as_u64() {
                return Ok(Some(batch as u64));
            }
        }
        Ok(None)
    }
}

/// Inbox reader handing out fixed posted payloads per batch.
#[derive(Debug, Default)]
pub struct TestInboxReader {
    batches: Vec<Bytes>,
}

impl TestInboxReader {
    pub fn new(batches: Vec<Bytes>) -> Self {
        Self { batches }
    }
}

#[async_trait]
impl InboxReader for TestInboxReader {
    async fn get_sequencer_message_bytes(&self, batch: u64) -> eyre::Result<(Bytes, B256)> {
        let data = self
            .batches
            .get(batch as usize)
            .cloned()
            .ok_or_else(|| eyre::eyre!("no posted data for batch {batch}"))?;
        let block_hash = keccak256(&data);
        Ok((data, block_hash))
    }

    async fn get_finalized_msg_count(&self) -> eyre::Result<MessageIndex> {
        Ok(MessageIndex::new(0))
    }
}

/// Streamer scripted with per-position messages and execution results.
#[derive(Debug)]
pub struct TestStreamer {
    messages: HashMap<u64, MessageWithMetadata>,
    results: HashMap<u64, MessageResult>,
    chain_config: Arc<ChainConfig>,
}

impl TestStreamer {
    pub fn new(chain_config: ChainConfig) -> Self {
        Self {
            messages: HashMap::new(),
            results: HashMap::new(),
            chain_config: Arc::new(chain_config),
        }
    }

    pub fn add_message(
        mut self,
        pos: u64,
        msg: MessageWithMetadata,
        result: MessageResult,
    ) -> Self {
        self.messages.insert(pos, msg);
        self.results.insert(pos, result);
        self
    }
}

impl TransactionStreamer for TestStreamer {
    fn processed_message_count(&self) -> eyre::Result<MessageIndex> {
        Ok(MessageIndex::new(self.messages.len() as u64))
    }

    fn message(&self, pos: MessageIndex) -> eyre::Result<MessageWithMetadata> {
        self.messages
            .get(&pos.as_u64())
            .cloned()
            .ok_or_else(|| eyre::eyre!("no message at {pos}"))
    }

    fn result_at_message_index(&self, pos: MessageIndex) -> eyre::Result<MessageResult> {
        self.results
            .get(&pos.as_u64())
            .copied()
            .ok_or_else(|| eyre::eyre!("no result at {pos}"))
    }

    fn pause_reorgs(&self) {}
    fn resume_reorgs(&self) {}

    fn chain_config(&self) -> Arc<ChainConfig> {
        self.chain_config.clone()
    }
}

/// Recorder scripted with per-position recording outputs.
#[derive(Debug, Default)]
pub struct TestRecorder {
    outputs: HashMap<u64, RecordResult>,
}

impl TestRecorder {
    pub fn add_recording(mut self, pos: u64, output: RecordResult) -> Self {
        self.outputs.insert(pos, output);
        self
    }
}

#[async_trait]
impl ExecutionRecorder for TestRecorder {
    async fn record_block_creation(
        &self,
        pos: MessageIndex,
        _msg: &MessageWithMetadata,
    ) -> eyre::Result<RecordResult> {
        self.outputs
            .get(&pos.as_u64())
            .cloned()
            .ok_or_else(|| eyre::eyre!("no recording scripted for {pos}"))
    }
}

/// DA reader recognizing a single header byte and yielding one scripted
/// recovery outcome.
pub struct ScriptedDaReader {
    header_byte: u8,
    outcome: Mutex<Option<Result<PreimagesMap, DaError>>>,
    recover_calls: AtomicUsize,
}

impl ScriptedDaReader {
    pub fn recognizing(header_byte: u8, outcome: Result<PreimagesMap, DaError>) -> Self {
        Self {
            header_byte,
            outcome: Mutex::new(Some(outcome)),
            recover_calls: AtomicUsize::new(0),
        }
    }

    pub fn recover_calls(&self) -> usize {
        self.recover_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DaReader for ScriptedDaReader {
    async fn is_valid_header_byte(&self, header_byte: u8) -> bool {
        header_byte == self.header_byte
    }

    async fn recover_payload_from_batch(
        &self,
        _batch_num: u64,
        _batch_block_hash: B256,
        posted_data: &[u8],
        _seed: PreimagesMap,
        _record_preimages: bool,
    ) -> Result<(Bytes, PreimagesMap), DaError> {
        self.recover_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .outcome
            .lock()
            .expect("outcome lock")
            .take()
            .expect("unexpected second recovery call");
        outcome.map(|preimages| (Bytes::copy_from_slice(posted_data), preimages))
    }
}

/// Spawner whose runs resolve to a fixed outcome, tracking launches and
/// cancellations.
pub struct TestSpawner {
    name: String,
    archs: Vec<WasmTarget>,
    module_roots: Vec<B256>,
    outcome: Result<GlobalState, String>,
    launches: AtomicUsize,
    cancelled: Arc<AtomicBool>,
}

impl TestSpawner {
    pub fn new(
        name: impl Into<String>,
        archs: Vec<WasmTarget>,
        module_roots: Vec<B256>,
        outcome: Result<GlobalState, String>,
    ) -> Self {
        Self {
            name: name.into(),
            archs,
            module_roots,
            outcome,
            launches: AtomicUsize::new(0),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Whether a launched run has been cancelled.
    pub fn run_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct TestRun {
    module_root: B256,
    outcome: Option<Result<GlobalState, String>>,
    cancelled: Arc<AtomicBool>,
}

#[async_trait]
impl ValidationRun for TestRun {
    fn wasm_module_root(&self) -> B256 {
        self.module_root
    }

    async fn await_output(&mut self) -> eyre::Result<GlobalState> {
        match self.outcome.take().expect("run awaited twice") {
            Ok(gs) => Ok(gs),
            Err(msg) => Err(eyre::eyre!(msg)),
        }
    }

    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ValidationSpawner for TestSpawner {
    fn stylus_archs(&self) -> Vec<WasmTarget> {
        self.archs.clone()
    }

    fn wasm_module_roots(&self) -> Vec<B256> {
        self.module_roots.clone()
    }

    fn launch(&self, _input: ValidationInput, module_root: B256) -> Box<dyn ValidationRun> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Box::new(TestRun {
            module_root,
            outcome: Some(self.outcome.clone()),
            cancelled: self.cancelled.clone(),
        })
    }

    async fn start(&self) -> eyre::Result<()> {
        Ok(())
    }

    fn stop(&self) {}

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ExecutionSpawner for TestSpawner {
    async fn machine_hashes_with_step_size(
        &self,
        _input: ValidationInput,
        _module_root: B256,
        _machine_start_index: u64,
        _step_size: u64,
        num_desired_hashes: u64,
    ) -> eyre::Result<Vec<B256>> {
        Ok(vec![B256::ZERO; num_desired_hashes as usize])
    }
}

/// A constructed [`ValidationEntry`] plus the pieces it was built from.
pub struct EntryFixture {
    pub entry: ValidationEntry,
    pub msg: MessageWithMetadata,
    pub full_batch: FullBatchInfo,
    pub prev_delayed: u64,
    pub chain_config: Arc<ChainConfig>,
}

/// A ready-for-record entry over batch 2 with one historical batch
/// dependency and a seeded batch preimage.
pub fn entry_fixture() -> EntryFixture {
    let chain_config = Arc::new(ChainConfig::new(412_346, false));
    let prev_delayed = 4;
    let msg = MessageWithMetadata {
        message: L1IncomingMessage {
            header: MessageHeader {
                kind: L2_MESSAGE_KIND,
                block_number: 100,
                timestamp: 1_700_000_000,
            },
            l2_msg: Bytes::from_static(b"payload"),
        },
        delayed_messages_read: prev_delayed,
    };

    let mut preimages = PreimagesMap::new();
    preimages.insert(
        PreimageType::Keccak256,
        keccak256(b"seed"),
        Bytes::from_static(b"seed"),
    );
    let full_batch = FullBatchInfo {
        number: 2,
        posted_data: Bytes::from_static(b"posted"),
        msg_count: MessageIndex::new(10),
        preimages,
    };

    let start = GlobalState {
        block_hash: B256::repeat_byte(0xa1),
        send_root: B256::repeat_byte(0xa2),
        batch: 2,
        pos_in_batch: 1,
    };
    let end = GlobalState {
        block_hash: B256::repeat_byte(0xb1),
        send_root: B256::repeat_byte(0xb2),
        batch: 2,
        pos_in_batch: 2,
    };

    let prev_batches = vec![BatchInfo {
        number: 0,
        data: Bytes::from_static(b"historical"),
    }];
    let entry = ValidationEntry::new(
        MessageIndex::new(8),
        start,
        end,
        msg.clone(),
        &full_batch,
        prev_batches,
        prev_delayed,
        chain_config.clone(),
    )
    .expect("fixture entry");

    EntryFixture {
        entry,
        msg,
        full_batch,
        prev_delayed,
        chain_config,
    }
}
