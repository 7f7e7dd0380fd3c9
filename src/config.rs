use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ScanError;

pub const DEFAULT_CT_URL: &str = "https://crt.sh/";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub domain: String,
    /// Worker pool size for DNS bruteforce.
    pub threads: usize,
    /// Upper bound for concurrent per-host scan tasks.
    pub scan_workers: usize,
    /// Timeout for liveness checks, the WordPress base fetch and the CT query.
    pub timeout_secs: u64,
    /// Timeout for canonical WordPress probes, file sweeps and bypass attempts.
    pub file_timeout_secs: u64,
    pub ct_url: String,
    pub enable_ct: bool,
    pub enable_dns: bool,
    pub wordlist: Option<PathBuf>,
    pub out_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            threads: 50,
            scan_workers: 10,
            timeout_secs: 10,
            file_timeout_secs: 5,
            ct_url: DEFAULT_CT_URL.to_string(),
            enable_ct: true,
            enable_dns: true,
            wordlist: None,
            out_dir: PathBuf::from("./results"),
        }
    }
}

impl ScanConfig {
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self { domain: domain.into(), ..Self::default() }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_timeout_secs)
    }

    /// Normalise the domain in place and reject configurations a scan cannot run with.
    pub fn validate(&mut self) -> Result<(), ScanError> {
        let domain = self.domain.trim().trim_end_matches('.').to_lowercase();
        if domain.is_empty() {
            return Err(ScanError::InvalidConfig("target domain is empty".into()));
        }
        if domain.contains("://") || domain.contains('/') || domain.chars().any(char::is_whitespace) {
            return Err(ScanError::InvalidConfig(format!(
                "target must be a bare domain name, got {:?}",
                self.domain
            )));
        }
        if self.threads == 0 || self.scan_workers == 0 {
            return Err(ScanError::InvalidConfig("worker counts must be at least 1".into()));
        }
        if self.timeout_secs == 0 || self.file_timeout_secs == 0 {
            return Err(ScanError::InvalidConfig("timeouts must be at least 1 second".into()));
        }
        self.domain = domain;
        Ok(())
    }

    /// Worst-case wall time of one host task: every probe it can issue hits its timeout.
    pub fn worst_case_host_latency(&self, wp_paths: usize, generic_paths: usize, bypass_probes: usize) -> Duration {
        let slow = 3 * self.timeout_secs;
        let sweeps = (wp_paths + generic_paths) as u64;
        let fast = 3 + sweeps * (1 + bypass_probes as u64);
        Duration::from_secs(slow + fast * self.file_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.threads, 50);
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.scan_workers, 10);
    }

    #[test]
    fn validate_normalises_domain() {
        let mut cfg = ScanConfig::for_domain("  Example.COM. ");
        cfg.validate().unwrap();
        assert_eq!(cfg.domain, "example.com");
    }

    #[test]
    fn validate_rejects_empty_and_urls() {
        assert!(ScanConfig::for_domain("").validate().is_err());
        assert!(ScanConfig::for_domain("https://example.com").validate().is_err());
        let mut cfg = ScanConfig::for_domain("example.com");
        cfg.threads = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn latency_bound_counts_every_probe() {
        let cfg = ScanConfig::default();
        // 3 x 10s slow probes, (3 + 2 x (1 + 1)) x 5s fast probes
        assert_eq!(cfg.worst_case_host_latency(1, 1, 1).as_secs(), 30 + 7 * 5);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: ScanConfig = serde_json::from_str(r#"{"domain":"a.example","threads":5}"#).unwrap();
        assert_eq!(cfg.threads, 5);
        assert_eq!(cfg.file_timeout_secs, 5);
        assert!(cfg.enable_ct);
    }
}
