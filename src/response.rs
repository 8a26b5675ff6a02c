//! Reply envelopes.

use std::net::Ipv4Addr;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// A successful reply from a bulb: `{"method": ..., "result": {...}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    ip: Ipv4Addr,
    method: Option<String>,
    result: Value,
}

impl Response {
    /// Decode one reply datagram.
    ///
    /// Replies carrying an `error` object become [`Error::Device`]; anything
    /// that is not JSON with a `result` becomes [`Error::MalformedResponse`].
    pub fn parse(ip: Ipv4Addr, datagram: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(datagram)
            .map_err(|e| Error::malformed(ip, format!("invalid utf-8: {e}")))?;
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| Error::malformed(ip, format!("invalid json: {e}")))?;

        if let Some(error) = envelope.error {
            return Err(Error::Device {
                ip,
                code: error.code,
                message: error.message,
            });
        }

        match envelope.result {
            Some(result) => Ok(Response {
                ip,
                method: envelope.method,
                result,
            }),
            None => Err(Error::malformed(ip, "reply has no result")),
        }
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Deserialize `result` into a typed structure.
    pub fn result_as<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.result)
            .map_err(|e| Error::malformed(self.ip, format!("unexpected result: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ReplyError>,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}
