use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_LIVE_MESSAGE_LIMIT: usize = 4;

/// How a system exclusive event in a track chunk is delimited.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SysexFraming {
    /// Payload runs up to the first 0xF7, which is consumed and not stored.
    #[default]
    Terminated,
    /// Standard MIDI File form: a variable-length count, then that many bytes.
    LengthPrefixed,
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub sysex_framing: SysexFraming,
    /// Largest framed live message accepted by the live decoder.
    pub live_message_limit: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig { sysex_framing: SysexFraming::default(), live_message_limit: DEFAULT_LIVE_MESSAGE_LIMIT }
    }
}

impl DecoderConfig {
    pub fn from_yaml_str(text: &str) -> Result<DecoderConfig, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<DecoderConfig, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a `.yaml`/`.yml` or `.json` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<DecoderConfig, ConfigError> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&fs::read_to_string(path)?),
            Some("json") => Self::from_json_str(&fs::read_to_string(path)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn with_sysex_framing(mut self, sysex_framing: SysexFraming) -> DecoderConfig {
        self.sysex_framing = sysex_framing;
        self
    }
}
