use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MIB: u64 = 1024 * 1024;

/// Configuration shared by the stream stages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Largest dependency payload the merger will fetch. Bigger payloads are
    /// skipped like missing ones.
    pub max_payload_size: u64,
    /// Attach decoded JSON content to entries whose body is a content address.
    pub annotate_content: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 5 * MIB,
            annotate_content: true,
        }
    }
}

impl StreamConfig {
    /// Parse from TOML. Missing keys take their default.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
