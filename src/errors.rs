use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// All error types that can occur when talking to bulbs or managing presets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No reply arrived within the configured window.
    #[error("no reply from {ip} within {}ms", .waited.as_millis())]
    Timeout { ip: Ipv4Addr, waited: Duration },

    /// The reply was not valid UTF-8 JSON, or lacked the expected keys.
    #[error("malformed response from {ip}: {reason}")]
    MalformedResponse { ip: Ipv4Addr, reason: String },

    /// The bulb answered with an error object.
    #[error("bulb {ip} rejected the command (code {code}): {message}")]
    Device {
        ip: Ipv4Addr,
        code: i64,
        message: String,
    },

    /// A caller-supplied value is out of range. Raised before any network I/O.
    #[error("invalid {name} {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A socket operation failed.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// Failed to serialize a command or preset file.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// The preset file could not be read or written.
    #[error("preset file {path:?}: {err}")]
    PresetFile { path: PathBuf, err: std::io::Error },

    /// The preset file exists but does not hold a name-to-preset map.
    #[error("preset file {path:?} is not valid: {err}")]
    PresetFormat {
        path: PathBuf,
        err: serde_json::Error,
    },

    /// Empty names and the names of built-in presets cannot be used.
    #[error("invalid preset name {0:?}")]
    InvalidPresetName(String),
}

impl Error {
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    pub fn malformed(ip: Ipv4Addr, reason: impl Into<String>) -> Self {
        Error::MalformedResponse {
            ip,
            reason: reason.into(),
        }
    }

    pub fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn preset_file(path: &Path, err: std::io::Error) -> Self {
        Error::PresetFile {
            path: path.to_path_buf(),
            err,
        }
    }

    /// Whether the error is a missing reply, which callers usually surface
    /// as a transient notice.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
