//! Shared validation work pool client.

use alloy_primitives::B256;
use async_trait::async_trait;
use mesa_validation_api::{ValidationInput, ValidationRun, ValidationSpawner, WasmTarget};

use crate::{client::RpcValidationClient, ClientConfig, ClientError, PoolClientConfig};

const POOL_CLIENT_NAME: &str = "validation-pool";

/// Client for the shared validation work pool.
///
/// The pool fans work out to a fleet of validation workers; from the
/// validator's perspective it has the same surface as a direct execution
/// client and is preferred for routine validation when configured.
pub struct PoolValidationClient {
    inner: RpcValidationClient,
}

impl PoolValidationClient {
    pub fn new(config: &PoolClientConfig) -> Result<Self, ClientError> {
        let conn = ClientConfig {
            url: config.url.clone(),
            request_timeout: config.request_timeout,
            name: Some(POOL_CLIENT_NAME.to_string()),
        };
        let inner = RpcValidationClient::from_parts(POOL_CLIENT_NAME.to_string(), &conn)?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl ValidationSpawner for PoolValidationClient {
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
