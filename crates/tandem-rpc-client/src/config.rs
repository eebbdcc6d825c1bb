//! Configuration types for the client

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tandem_json_rpc::{Encoding, Version};

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Protocol revision spoken by this client
    pub version: Version,

    /// Charset used by byte-oriented transports
    pub encoding: Encoding,

    /// Timeout configurations
    pub timeouts: TimeoutConfig,

    /// Emit `"id": null` on V2 notifications instead of omitting the member
    pub notification_id_null: bool,
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long to wait for the transport to answer a single call or batch.
    /// `None` waits indefinitely.
    #[serde(with = "duration_serde")]
    pub request: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: Version::V2,
            encoding: Encoding::Utf8,
            timeouts: TimeoutConfig::default(),
            notification_id_null: false,
        }
    }
}

impl ClientConfig {
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request = Some(timeout);
        self
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.version, Version::V2);
        assert_eq!(config.encoding, Encoding::Utf8);
        assert!(config.timeouts.request.is_none());
        assert!(!config.notification_id_null);
    }

    #[test]
    fn test_config_serialization() {
        let config = ClientConfig::default()
            .with_version(Version::V1)
            .with_request_timeout(Duration::from_millis(1500));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["timeouts"]["request"], 1500);

        let deserialized: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized.version, Version::V1);
        assert_eq!(deserialized.timeouts.request, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_partial_config() {
        let config: ClientConfig = serde_json::from_str(r#"{"version": 1}"#).unwrap();
        assert_eq!(config.version, Version::V1);
        assert!(config.timeouts.request.is_none());
    }
}
