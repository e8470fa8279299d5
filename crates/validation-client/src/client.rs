//! HTTP JSON-RPC validation client.

use std::sync::RwLock;

use alloy_primitives::B256;
use async_trait::async_trait;
use eyre::WrapErr;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use mesa_validation_api::{
    ExecutionSpawner, GlobalState, ValidationInput, ValidationRun, ValidationSpawner, WasmTarget,
};
use tokio::task::JoinHandle;
use tracing::info;

use crate::{api::ValidationApiClient, ClientConfig, ClientError, ServerCapabilities};

/// Shared plumbing for RPC-backed spawners: connection, capabilities cache,
/// and run spawning.
pub(crate) struct RpcValidationClient {
    name: String,
    client: HttpClient,
    capabilities: RwLock<Option<ServerCapabilities>>,
}

impl RpcValidationClient {
    pub(crate) fn from_parts(name: String, config: &ClientConfig) -> Result<Self, ClientError> {
        if !config.is_enabled() {
            return Err(ClientError::EmptyUrl);
        }
        let client = HttpClientBuilder::default()
            .request_timeout(config.request_timeout)
            .build(&config.url)
            .map_err(|e| ClientError::build(&config.url, e))?;
        Ok(Self {
            name,
            client,
            capabilities: RwLock::new(None),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn cached_capabilities(&self) -> ServerCapabilities {
        self.capabilities
            .read()
            .expect("capabilities lock poisoned")
            .clone()
            .unwrap_or_default()
    }

    pub(crate) fn stylus_archs(&self) -> Vec<WasmTarget> {
        self.cached_capabilities().stylus_archs
    }

    pub(crate) fn wasm_module_roots(&self) -> Vec<B256> {
        self.cached_capabilities().wasm_module_roots
    }

    /// Fetches and caches the server capabilities.
    pub(crate) async fn handshake(&self) -> eyre::Result<()> {
        let caps = self
            .client
            .capabilities()
            .await
            .wrap_err_with(|| format!("capabilities handshake with {}", self.name))?;
        info!(
            backend = %self.name,
            archs = caps.stylus_archs.len(),
            module_roots = caps.wasm_module_roots.len(),
            "validation backend ready"
        );
        *self
            .capabilities
            .write()
            .expect("capabilities lock poisoned") = Some(caps);
        Ok(())
    }

    /// Spawns the validation request as an abortable task. Must be called
    /// from within a tokio runtime.
    pub(crate) fn launch(
        &self,
        input: ValidationInput,
        module_root: B256,
    ) -> Box<dyn ValidationRun> {
        let client = self.client.clone();
        let backend = self.name.clone();
        let handle = tokio::spawn(async move {
            client
                .validate(input, module_root)
                .await
                .wrap_err_with(|| format!("validation rpc to {backend}"))
        });
        Box::new(RpcValidationRun {
            module_root,
            backend: self.name.clone(),
            handle,
        })
    }

    pub(crate) async fn machine_hashes(
        &self,
        input: ValidationInput,
        module_root: B256,
        machine_start_index: u64,
        step_size: u64,
        num_desired_hashes: u64,
    ) -> eyre::Result<Vec<B256>> {
        self.client
            .machine_hashes(
                input,
                module_root,
                machine_start_index,
                step_size,
                num_desired_hashes,
            )
            .await
            .wrap_err_with(|| format!("machine hashes rpc to {}", self.name))
    }
}

/// A pending validation run backed by an abortable request task.
struct RpcValidationRun {
    module_root: B256,
    backend: String,
    handle: JoinHandle<eyre::Result<GlobalState>>,
}

#[async_trait]
impl ValidationRun for RpcValidationRun {
    fn wasm_module_root(&self) -> B256 {
        self.module_root
    }

    async fn await_output(&mut self) -> eyre::Result<GlobalState> {
        match (&mut self.handle).await {
            Ok(res) => res,
            Err(err) if err.is_cancelled() => {
                Err(eyre::eyre!("validation run on {} was cancelled", self.backend))
            }
            Err(err) => Err(eyre::eyre!(
                "validation task on {} failed: {err}",
                self.backend
            )),
        }
    }

    fn cancel(&mut self) {
        self.handle.abort();
    }
}

/// A single validation server reached over HTTP JSON-RPC.
pub struct ExecutionClient {
    inner: RpcValidationClient,
}

impl ExecutionClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let inner = RpcValidationClient::from_parts(config.display_name(), config)?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl ValidationSpawner for ExecutionClient {
    fn stylus_archs(&self) -> Vec<WasmTarget> {
        self.inner.stylus_archs()
    }

    fn wasm_module_roots(&self) -> Vec<B256> {
        self.inner.wasm_module_roots()
    }

    fn launch(&self, input: ValidationInput, module_root: B256) -> Box<dyn ValidationRun> {
        self.inner.launch(input, module_root)
    }

    async fn start(&self) -> eyre::Result<()> {
        self.inner.handshake().await
    }

    fn stop(&self) {}

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[async_trait]
impl ExecutionSpawner for ExecutionClient {
    async fn machine_hashes_with_step_size(
        &self,
        input: ValidationInput,
        module_root: B256,
        machine_start_index: u64,
        step_size: u64,
        num_desired_hashes: u64,
    ) -> eyre::Result<Vec<B256>> {
        self.inner
            .machine_hashes(
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
    use super::*;

    #[test]
    fn empty_url_is_rejected() {
        assert!(matches!(
            ExecutionClient::new(&ClientConfig::default()),
            Err(ClientError::EmptyUrl)
        ));
    }

    #[test]
    fn capabilities_are_empty_before_handshake() {
        let client = ExecutionClient::new(&ClientConfig::new("http://127.0.0.1:8549")).unwrap();
        assert!(client.stylus_archs().is_empty());
        assert!(!client.supports_module(B256::repeat_byte(1)));
    }

    #[test]
    fn display_name_defaults_to_url() {
        let client = ExecutionClient::new(&ClientConfig::new("http://127.0.0.1:8549")).unwrap();
        assert_eq!(client.name(), "http://127.0.0.1:8549");
    }
}
