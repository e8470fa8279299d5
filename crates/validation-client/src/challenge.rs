//! Challenge-protocol view of an execution backend.

use std::sync::Arc;

use alloy_primitives::B256;
use async_trait::async_trait;
use mesa_validation_api::{ChallengeSpawner, ExecutionSpawner, ValidationInput};

/// The challenge-protocol execution client, derived from a standard
/// execution spawner. Exposes only the capability queries challenge
/// resolution needs.
pub struct ChallengeExecutionClient {
    inner: Arc<dyn ExecutionSpawner>,
}

impl ChallengeExecutionClient {
    pub fn new(inner: Arc<dyn ExecutionSpawner>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }
}

#[async_trait]
impl ChallengeSpawner for ChallengeExecutionClient {
    fn wasm_module_roots(&self) -> Vec<B256> {
        self.inner.wasm_module_roots()
    }

    async fn machine_hashes_with_step_size(
        &self,
        input: ValidationInput,
        module_root: B256,
        machine_start_index: u64,
        step_size: u64,
        num_desired_hashes: u64,
    ) -> eyre::Result<Vec<B256>> {
        self.inner
            .machine_hashes_with_step_size(
                input,
                module_root,
                machine_start_index,
                step_size,
                num_desired_hashes,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use mesa_validation_api::{ValidationRun, ValidationSpawner, WasmTarget};

    use super::*;

    struct StubSpawner;

    #[async_trait]
    impl ValidationSpawner for StubSpawner {
        fn stylus_archs(&self) -> Vec<WasmTarget> {
            vec![WasmTarget::wavm()]
        }

        fn wasm_module_roots(&self) -> Vec<B256> {
            vec![B256::repeat_byte(4)]
        }

        fn launch(&self, _input: ValidationInput, _module_root: B256) -> Box<dyn ValidationRun> {
            unimplemented!("not used by the challenge view")
        }

        async fn start(&self) -> eyre::Result<()> {
            Ok(())
        }

        fn stop(&self) {}

        fn name(&self) -> &str {
            "stub"
        }
    }

    #[async_trait]
    impl ExecutionSpawner for StubSpawner {
        async fn machine_hashes_with_step_size(
            &self,
            _input: ValidationInput,
            _module_root: B256,
            machine_start_index: u64,
            step_size: u64,
            num_desired_hashes: u64,
        ) -> eyre::Result<Vec<B256>> {
            let _ = (machine_start_index, step_size);
            Ok(vec![B256::ZERO; num_desired_hashes as usize])
        }
    }

    #[tokio::test]
    async fn challenge_view_delegates_to_inner_spawner() {
        let view = ChallengeExecutionClient::new(Arc::new(StubSpawner));
        assert_eq!(view.wasm_module_roots(), vec![B256::repeat_byte(4)]);
        assert_eq!(view.name(), "stub");
        let hashes = view
            .machine_hashes_with_step_size(ValidationInput::default(), B256::ZERO, 0, 1, 3)
            .await
            .unwrap();
        assert_eq!(hashes.len(), 3);
    }
}
