//! Response envelopes of the two Cloudflare APIs
//!
//! The v4 API wraps every answer as
//! `{"success": bool, "errors": [{"code", "message"}], "result": ...}`.
//! The Host API answers `{"result": "success", "response": ...}` or
//! `{"result": "error", "msg": ..., "err_code": ...}`.
//!
//! Parsing is kept free of I/O so it can be tested on canned bodies.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use zonekit_core::error::{ApiMessage, Error, RemoteError, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    result: Value,
}

/// Short description of a failed HTTP status
pub(crate) fn status_summary(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 | 403 => "Authentication failed: invalid credentials or insufficient permissions",
        409 => "Conflict",
        429 => "Rate limit exceeded",
        500..=599 => "Cloudflare server error",
        _ => "Request failed",
    }
}

/// Decode a v4 response body into the `result` it carries
///
/// # Parameters
///
/// - `status`: HTTP status of the response
/// - `body`: Raw response body
/// - `what`: What was requested, for error messages
///
/// # Returns
///
/// - `Ok(T)`: The decoded `result`
/// - `Err(Error::NotFound)`: HTTP 404
/// - `Err(Error::Remote)`: Non-2xx status or `success == false`
/// - `Err(Error::InvalidResponse)`: A 2xx body that is not an envelope
///   or whose `result` has the wrong shape
pub fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str, what: &str) -> Result<T> {
    if status == 404 {
        return Err(Error::not_found(what.to_string()));
    }

    let ok_status = (200..300).contains(&status);
    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if ok_status => {
            return Err(Error::invalid_response(format!(
                "{}: body is not a v4 envelope: {}",
                what, e
            )));
        }
        Err(_) => {
            return Err(RemoteError::new(format!("{}: {}", what, status_summary(status)))
                .with_status(status)
                .into());
        }
    };

    if !ok_status || !envelope.success {
        let summary = if ok_status {
            "Request was not successful"
        } else {
            status_summary(status)
        };
        let mut remote = RemoteError::new(format!("{}: {}", what, summary));
        remote.status = Some(status);
        remote.errors = envelope.errors;
        return Err(remote.into());
    }

    serde_json::from_value(envelope.result)
        .map_err(|e| Error::invalid_response(format!("{}: unexpected result shape: {}", what, e)))
}

#[derive(Debug, Deserialize)]
struct HostEnvelope {
    result: String,
    #[serde(default)]
    response: Value,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    err_code: Value,
}

/// Decode a Host API response body into its `response`
pub fn parse_host_response<T: DeserializeOwned>(status: u16, body: &str, act: &str) -> Result<T> {
    let envelope: HostEnvelope = serde_json::from_str(body).map_err(|e| {
        if (200..300).contains(&status) {
            Error::invalid_response(format!("Host API {}: malformed body: {}", act, e))
        } else {
            RemoteError::new(format!("Host API {}: {}", act, status_summary(status)))
                .with_status(status)
                .into()
        }
    })?;

    if envelope.result != "success" {
        let msg = envelope.msg.unwrap_or_else(|| "unknown error".to_string());
        let code = match &envelope.err_code {
            Value::Number(n) => n.as_i64().unwrap_or_default(),
            Value::String(s) => s.parse().unwrap_or_default(),
            _ => 0,
        };
        let remote = RemoteError::new(format!("Host API {} failed", act))
            .with_status(status)
            .with_error(code, msg);
        return Err(remote.into());
    }

    serde_json::from_value(envelope.response)
        .map_err(|e| Error::invalid_response(format!("Host API {}: unexpected response: {}", act, e)))
}
