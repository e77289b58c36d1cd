use thiserror::Error;

/// Failure while decoding MIDI bytes.
///
/// Every variant is fatal for the track or message being decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A variable-length quantity ran out of input (or past 32 bits) before its last byte.
    #[error("variable-length quantity at offset {offset} is not terminated")]
    MalformedLength { offset: usize },

    /// A status byte that cannot start an event here, or a data byte with no usable running status.
    #[error("status byte {status:#04x} at offset {offset} cannot be decoded")]
    UnknownEventType { status: u8, offset: usize },

    /// The events do not consume exactly the declared track length.
    #[error("track declares {declared} bytes but its events need {consumed}")]
    TrackLengthMismatch { declared: usize, consumed: usize },

    /// A system exclusive run reached the end of its region without a 0xF7.
    #[error("system exclusive message at offset {offset} is not terminated")]
    MalformedSysex { offset: usize },

    /// A live message buffer does not match the size its status byte calls for.
    #[error("message with status {status:#04x} has {actual} bytes, expected {expected}")]
    TruncatedMessage { status: u8, expected: usize, actual: usize },
}

/// A track that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("track {number} is invalid")]
pub struct TrackError {
    pub number: usize,
    #[source]
    pub source: DecodeError,
}

impl TrackError {
    pub fn kind(&self) -> &DecodeError {
        &self.source
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported configuration file {0:?}, expected .yaml, .yml or .json")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_track_error_keeps_source() {
        let err = TrackError {
            number: 3,
            source: DecodeError::MalformedSysex { offset: 12 },
        };
        assert_eq!(err.to_string(), "track 3 is invalid");
        assert_eq!(err.kind(), &DecodeError::MalformedSysex { offset: 12 });
        assert!(err.source().is_some());
    }

    #[test]
    fn test_status_is_formatted_as_hex() {
        let err = DecodeError::UnknownEventType { status: 0xF4, offset: 1 };
        assert_eq!(err.to_string(), "status byte 0xf4 at offset 1 cannot be decoded");
    }
}
