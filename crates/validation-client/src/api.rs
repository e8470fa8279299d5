//! Validation server RPC API definitions.

use alloy_primitives::B256;
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use mesa_validation_api::{GlobalState, ValidationInput, WasmTarget};
use serde::{Deserialize, Serialize};

/// Capabilities advertised by a validation server during the handshake.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ServerCapabilities {
    /// Target architectures the server can execute user-wasm code for.
    pub stylus_archs: Vec<WasmTarget>,
    /// Module roots of the proving machines available on the server.
    pub wasm_module_roots: Vec<B256>,
}

/// RPC surface of a validation server.
#[rpc(client, namespace = "validation")]
pub trait ValidationApi {
    /// Capabilities handshake, queried once on client start.
    #[method(name = "capabilities")]
    async fn capabilities(&self) -> RpcResult<ServerCapabilities>;

    /// Runs the proving machine identified by `module_root` over `input` and
    /// returns the final global state.
    #[method(name = "validate")]
    async fn validate(&self, input: ValidationInput, module_root: B256)
        -> RpcResult<GlobalState>;

    /// Machine hashes at `step_size` intervals, for challenge resolution.
    #[method(name = "machineHashes")]
    async fn machine_hashes(
        &self,
        input: ValidationInput,
        module_root: B256,
        machine_start_index: u64,
        step_size: u64,
        num_desired_hashes: u64,
    ) -> RpcResult<Vec<B256>>;
}
