//! # mesa-validation-client
//!
//! RPC-backed implementations of the validation spawner surface. An
//! [`ExecutionClient`] talks to a single validation server over HTTP JSON-RPC,
//! performing a capabilities handshake on start and spawning validation runs
//! as abortable tasks. A [`PoolValidationClient`] presents the shared
//! validation work pool through the same surface, and a
//! [`ChallengeExecutionClient`] is the challenge-protocol view derived from
//! any execution spawner.

mod api;
mod challenge;
mod client;
mod config;
mod errors;
mod pool;

pub use api::{ServerCapabilities, ValidationApiClient};
pub use challenge::ChallengeExecutionClient;
pub use client::ExecutionClient;
pub use config::{ClientConfig, PoolClientConfig};
pub use errors::ClientError;
pub use pool::PoolValidationClient;
