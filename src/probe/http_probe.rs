use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ProbeError, ScanError};
use crate::http_client::{create_follow_client, create_manual_client, RedirectMode};

/// Statuses that count a URL as serving something worth scanning.
pub const LIVE_STATUSES: [u16; 5] = [200, 301, 302, 401, 403];

/// Bytes of body kept per response. Keyword checks only need the head of a file.
pub const BODY_SNIPPET_LIMIT: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Final URL after any redirects.
    pub url: String,
    pub status: u16,
    /// `Content-Length` when announced, otherwise the bytes received.
    pub size: usize,
    /// At most [`BODY_SNIPPET_LIMIT`] bytes, lossily decoded.
    pub body: String,
    /// `Location` header of a redirect answer.
    pub location: Option<String>,
}

/// A live scheme/host combination found by the liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveEndpoint {
    pub url: String,
    pub status: u16,
    pub size: usize,
}

/// Options for a single probe.
#[derive(Debug, Clone)]
pub struct ProbeRequest<'a> {
    pub headers: &'a [(&'a str, String)],
    pub timeout: Duration,
    pub redirects: RedirectMode,
}

impl<'a> ProbeRequest<'a> {
    pub fn new(timeout: Duration, redirects: RedirectMode) -> Self {
        Self { headers: &[], timeout, redirects }
    }

    pub fn with_headers(mut self, headers: &'a [(&'a str, String)]) -> Self {
        self.headers = headers;
        self
    }
}

/// Issues single GET requests. Cheap to clone; both inner clients share pools.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    follow: Client,
    manual: Client,
}

impl ProbeClient {
    pub fn new(max_idle_connections: usize) -> Result<Self, ScanError> {
        Ok(Self {
            follow: create_follow_client(max_idle_connections)?,
            manual: create_manual_client(max_idle_connections)?,
        })
    }

    /// GET `url` once. No retries: a failure is returned to the caller to drop or escalate.
    ///
    /// The timeout bounds the wait for the response head and, separately, the body
    /// read. Once the status is known a slow or broken body only shortens the snippet.
    pub async fn probe(&self, url: &str, req: &ProbeRequest<'_>) -> Result<ProbeResult, ProbeError> {
        let client = match req.redirects {
            RedirectMode::Follow => &self.follow,
            RedirectMode::Manual => &self.manual,
        };
        let mut builder = client.get(url);
        for (name, value) in req.headers {
            builder = builder.header(*name, value.as_str());
        }

        let mut resp = match tokio::time::timeout(req.timeout, builder.send()).await {
            Ok(sent) => sent.map_err(|e| ProbeError::from_reqwest(url, e))?,
            Err(_) => return Err(ProbeError::Timeout { url: url.to_string() }),
        };
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let declared = resp.content_length();
        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let deadline = tokio::time::Instant::now() + req.timeout;
        let mut snippet = Vec::new();
        let mut received = 0usize;
        loop {
            match tokio::time::timeout_at(deadline, resp.chunk()).await {
                Ok(Ok(Some(chunk))) => {
                    received += chunk.len();
                    let room = BODY_SNIPPET_LIMIT.saturating_sub(snippet.len());
                    snippet.extend_from_slice(&chunk[..chunk.len().min(room)]);
                    if snippet.len() >= BODY_SNIPPET_LIMIT {
                        break;
                    }
                }
                Ok(Ok(None)) => break,
                Ok(Err(e)) => {
                    tracing::debug!(url, status, error = %e, "body read failed, keeping partial body");
                    break;
                }
                Err(_) => {
                    tracing::debug!(url, status, received, "body read timed out, keeping partial body");
                    break;
                }
            }
        }
        let size = declared.map_or(received, |n| n as usize);
        tracing::debug!(url, status, size, "probe");

        Ok(ProbeResult {
            url: final_url,
            status,
            size,
            body: String::from_utf8_lossy(&snippet).into_owned(),
            location,
        })
    }

    /// Probe `http://host` and `https://host`, keeping those that answer with a live status.
    pub async fn check_liveness(&self, host: &str, timeout: Duration) -> Result<Vec<LiveEndpoint>, ProbeError> {
        let req = ProbeRequest::new(timeout, RedirectMode::Follow);
        let mut live = Vec::new();
        for scheme in ["http", "https"] {
            let url = format!("{}://{}", scheme, host);
            match self.probe(&url, &req).await {
                Ok(res) if LIVE_STATUSES.contains(&res.status) => live.push(LiveEndpoint {
                    url,
                    status: res.status,
                    size: res.size,
                }),
                Ok(res) => tracing::debug!(url = %url, status = res.status, "not live"),
                Err(e) if e.is_transient() => tracing::debug!(url = %url, error = %e, "no response"),
                Err(e) => return Err(e),
            }
        }
        Ok(live)
    }
}

/// Case-insensitive substring check over a lower-cased haystack.
pub fn contains_any(haystack_lower: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack_lower.contains(&n.to_lowercase()))
}
