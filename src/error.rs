//! Error types for the scan engine.
//!
//! Network failures are expected and frequent during reconnaissance, so
//! `ProbeError` separates the transient ones (dropped at the probe) from the
//! ones that indicate a bug or bad input and must reach the task boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single HTTP probe.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    #[error("TLS handshake with {url} failed: {reason}")]
    Tls { url: String, reason: String },

    #[error("failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("invalid request url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ProbeError {
    /// Transient failures carry no signal and are skipped silently.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ProbeError::InvalidUrl { .. })
    }

    /// Map a reqwest error onto the probe taxonomy.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_builder() {
            return ProbeError::InvalidUrl { url, reason: err.to_string() };
        }
        if err.is_timeout() {
            return ProbeError::Timeout { url };
        }
        let reason = error_chain(&err);
        if err.is_body() || err.is_decode() {
            return ProbeError::Body { url, reason };
        }
        let lower = reason.to_lowercase();
        if lower.contains("certificate") || lower.contains("tls") || lower.contains("handshake") {
            return ProbeError::Tls { url, reason };
        }
        ProbeError::Connection { url, reason }
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

/// Failure of a discovery producer. Never fatal: the producer yields nothing.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("CT log request failed: {0}")]
    Request(#[from] ProbeError),

    #[error("CT log returned status {0}")]
    Status(u16),

    #[error("CT log returned malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read wordlist {path}: {source}")]
    Wordlist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end a scan task or the whole run.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("illegal phase transition {from} -> {to}")]
    PhaseTransition { from: &'static str, to: &'static str },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to write report {path}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_is_not_transient() {
        let err = ProbeError::InvalidUrl { url: "::".into(), reason: "empty host".into() };
        assert!(!err.is_transient());
        let err = ProbeError::Timeout { url: "http://a.example".into() };
        assert!(err.is_transient());
    }
}
