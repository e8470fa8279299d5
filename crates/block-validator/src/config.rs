//! Validator configuration.
//!
//! Configuration is a value read once at construction; there is no dynamic
//! reconfiguration.

use mesa_validation_client::{ClientConfig, PoolClientConfig};
use serde::{Deserialize, Serialize};

/// Configuration of the stateless block validator.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockValidatorConfig {
    /// Validation servers, scanned in this order during dispatch.
    pub validation_server_configs: Vec<ClientConfig>,

    /// Shared validation work pool, preferred over direct servers for
    /// routine validation when enabled.
    pub validation_pool: PoolClientConfig,
}

impl BlockValidatorConfig {
    /// Enabled validation server entries, in configured order.
    pub fn enabled_servers(&self) -> impl Iterator<Item = &ClientConfig> {
        self.validation_server_configs
            .iter()
            .filter(|c| c.is_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_servers_are_filtered() {
        let config = BlockValidatorConfig {
            validation_server_configs: vec![
                ClientConfig::default(),
                ClientConfig::new("http://127.0.0.1:8549"),
            ],
            ..Default::default()
        };
        assert_eq!(config.enabled_servers().count(), 1);
    }

    #[test]
    fn config_deserializes_from_empty_table() {
        let config: BlockValidatorConfig = serde_json::from_str("{}").unwrap();
        assert!(config.validation_server_configs.is_empty());
        assert!(!config.validation_pool.is_enabled());
    }
}
