//! Server configuration

use serde::{Deserialize, Serialize};
use tandem_json_rpc::{Encoding, Version};

use crate::method::{MethodOptions, ParamSpec};

/// Configuration for the dispatch engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Protocol revision accepted by this server
    pub version: Version,
    /// Charset for byte-oriented transports
    pub encoding: Encoding,
    /// Default `collect` flag for handlers registered without options
    pub collect: bool,
    /// Default parameter shape for handlers registered without options
    pub params: Option<ParamSpec>,
    /// Buffer size of the observability event channel
    pub event_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: Version::V2,
            encoding: Encoding::Utf8,
            collect: true,
            params: None,
            event_capacity: 256,
        }
    }
}

impl ServerConfig {
    /// Options applied to bare handlers, at registration or when a router returns one
    pub fn method_options(&self) -> MethodOptions {
        MethodOptions {
            collect: self.collect,
            params: self.params.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.version, Version::V2);
        assert!(config.collect);
        assert!(config.params.is_none());
        assert!(config.method_options().collect);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig = serde_json::from_value(json!({
            "version": 1,
            "collect": false,
            "params": {"ordered": ["a", "b"]}
        }))
        .unwrap();
        assert_eq!(config.version, Version::V1);
        assert!(!config.collect);
        assert_eq!(config.params, Some(ParamSpec::ordered(["a", "b"])));
        assert_eq!(config.event_capacity, 256);
    }
}
