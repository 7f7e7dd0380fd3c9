use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::error::ScanError;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Redirect handling for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Follow,
    /// Report the first response for the requested URL.
    Manual,
}

fn base_builder(max_idle_connections: usize) -> ClientBuilder {
    ClientBuilder::new()
        // Connection pooling - scan tasks hit the same host many times in a row
        .pool_max_idle_per_host(max_idle_connections)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .tcp_nodelay(true)
        .connect_timeout(Duration::from_secs(5))
        .gzip(true)
        .brotli(true)
        .use_rustls_tls()
        .tls_sni(true)
        .https_only(false)
        .user_agent(USER_AGENT)
}

/// Targets are often staging hosts with self-signed certificates.
fn probe_builder(max_idle_connections: usize) -> ClientBuilder {
    base_builder(max_idle_connections).danger_accept_invalid_certs(true)
}

/// Client that follows up to 5 redirects, used for liveness and base fetches.
pub fn create_follow_client(max_idle_connections: usize) -> Result<Client, ScanError> {
    probe_builder(max_idle_connections)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(ScanError::Client)
}

/// Client that never follows redirects, used for sweeps and bypass attempts.
pub fn create_manual_client(max_idle_connections: usize) -> Result<Client, ScanError> {
    probe_builder(max_idle_connections)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(ScanError::Client)
}

/// Certificate-verifying client for public services such as the CT log.
pub fn create_ct_client() -> Result<Client, ScanError> {
    base_builder(2)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(ScanError::Client)
}
