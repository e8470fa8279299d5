//! Capability traits implemented by validation execution backends.

use alloy_primitives::B256;
use async_trait::async_trait;

use crate::{GlobalState, ValidationInput, WasmTarget};

/// A backend that runs the WASM proving machine over a [`ValidationInput`]
/// and produces the resulting global state.
///
/// Implemented by direct execution clients and by the shared validation work
/// pool client. Implementations are shared, read-only references; the
/// validator core never mutates them.
#[async_trait]
pub trait ValidationSpawner: Send + Sync {
    /// Target architectures this backend can carry user-wasm code for.
    fn stylus_archs(&self) -> Vec<WasmTarget>;

    /// Module roots of the proving machine binaries this backend can run.
    fn wasm_module_roots(&self) -> Vec<B256>;

    /// Whether the backend can run the proving machine identified by
    /// `module_root`.
    fn supports_module(&self, module_root: B256) -> bool {
        self.wasm_module_roots().contains(&module_root)
    }

    /// Starts a validation run. The returned handle is pending; callers must
    /// either await it or cancel it.
    fn launch(&self, input: ValidationInput, module_root: B256) -> Box<dyn ValidationRun>;

    async fn start(&self) -> eyre::Result<()>;

    fn stop(&self);

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// A direct execution backend, additionally able to answer the machine-hash
/// queries used during challenge resolution.
#[async_trait]
pub trait ExecutionSpawner: ValidationSpawner {
    /// Machine hashes at `step_size` intervals starting from
    /// `machine_start_index`, up to `num_desired_hashes` entries.
    async fn machine_hashes_with_step_size(
        &self,
        input: ValidationInput,
        module_root: B256,
        machine_start_index: u64,
        step_size: u64,
        num_desired_hashes: u64,
    ) -> eyre::Result<Vec<B256>>;
}

/// The challenge-protocol view of an execution backend.
///
/// Derived from an [`ExecutionSpawner`]; exposes only what challenge
/// resolution needs.
#[async_trait]
pub trait ChallengeSpawner: Send + Sync {
    fn wasm_module_roots(&self) -> Vec<B256>;

    async fn machine_hashes_with_step_size(
        &self,
        input: ValidationInput,
        module_root: B256,
        machine_start_index: u64,
        step_size: u64,
        num_desired_hashes: u64,
    ) -> eyre::Result<Vec<B256>>;
}

/// A pending validation run on some backend.
#[async_trait]
pub trait ValidationRun: Send {
    /// Module root the run was launched against.
    fn wasm_module_root(&self) -> B256;

    /// Waits for the backend and returns the produced global state.
    async fn await_output(&mut self) -> eyre::Result<GlobalState>;

    /// Aborts the run. Safe to call more than once, and after completion.
    fn cancel(&mut self);
}
