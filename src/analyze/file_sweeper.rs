use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ProbeError;
use crate::http_client::RedirectMode;
use crate::output::events::EventSink;
use crate::output::report::{Finding, FindingKind};
use crate::probe::http_probe::{contains_any, ProbeClient, ProbeRequest};
use crate::waf::BypassStrategy;
use crate::wordlists::SENSITIVE_KEYWORDS;

/// True when a readable body mentions any credential-ish keyword.
pub fn has_sensitive_content(body: &str) -> bool {
    contains_any(&body.to_lowercase(), SENSITIVE_KEYWORDS)
}

/// True when `location` points at the same path and query as `from`, changing only
/// scheme, host or port. Such hops say nothing about the file itself.
pub fn is_origin_hop(from: &Url, location: &str) -> bool {
    match from.join(location) {
        Ok(to) => to.path() == from.path() && to.query() == from.query() && to != *from,
        Err(_) => false,
    }
}

fn same_path(from: &Url, to: &str) -> bool {
    Url::parse(to).map_or(false, |to| to.path() == from.path() && to.query() == from.query())
}

/// Probes candidate paths under a base URL and keeps the interesting answers.
#[derive(Debug, Clone)]
pub struct FileSweeper {
    client: ProbeClient,
    bypass: BypassStrategy,
    timeout: Duration,
    events: EventSink,
    cancel: CancellationToken,
}

impl FileSweeper {
    pub fn new(client: ProbeClient, timeout: Duration, events: EventSink, cancel: CancellationToken) -> Self {
        let bypass = BypassStrategy::new(client.clone(), timeout, cancel.clone());
        Self { client, bypass, timeout, events, cancel }
    }

    /// Sweep `candidates` under `base_url` in order.
    ///
    /// 200, 403 and 301/302 produce a finding; everything else is skipped. A redirect
    /// that only moves the same path to another origin is followed and the answer
    /// there is evaluated instead. When the scan is cancelled the findings gathered
    /// so far are returned.
    pub async fn sweep(&self, base_url: &str, candidates: &[&str], kind: FindingKind) -> Result<Vec<Finding>, ProbeError> {
        let base = Url::parse(base_url).map_err(|e| ProbeError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let req = ProbeRequest::new(self.timeout, RedirectMode::Manual);
        let follow = ProbeRequest::new(self.timeout, RedirectMode::Follow);
        let mut findings = Vec::new();

        for path in candidates {
            if self.cancel.is_cancelled() {
                tracing::debug!(base_url, "sweep cancelled");
                break;
            }
            let candidate = match base.join(path) {
                Ok(u) => u,
                Err(e) => {
                    tracing::warn!(base_url, path, error = %e, "skipping unjoinable path");
                    continue;
                }
            };
            let mut res = match self.client.probe(candidate.as_str(), &req).await {
                Ok(res) => res,
                Err(e) if e.is_transient() => continue,
                Err(e) => return Err(e),
            };
            let origin_hop = matches!(res.status, 301 | 302)
                && res.location.as_deref().map_or(false, |loc| is_origin_hop(&candidate, loc));
            if origin_hop {
                if self.cancel.is_cancelled() {
                    break;
                }
                match self.client.probe(candidate.as_str(), &follow).await {
                    Ok(followed) if same_path(&candidate, &followed.url) => res = followed,
                    // Landed somewhere else: report the original redirect.
                    Ok(_) => {}
                    Err(e) if e.is_transient() => continue,
                    Err(e) => return Err(e),
                }
            }

            let file_url = res.url.clone();
            let mut finding = Finding::new(&file_url, res.status, res.size, kind);
            match res.status {
                200 => {
                    if has_sensitive_content(&res.body) {
                        finding.sensitive_content = Some(true);
                    }
                }
                403 => {
                    let methods = self.bypass.attempt(&file_url, res.status).await?;
                    if !methods.is_empty() {
                        finding.bypass_methods = Some(methods);
                    }
                }
                301 | 302 => {}
                _ => continue,
            }
            self.events.finding(&finding);
            findings.push(finding);
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitive_keywords() {
        assert!(has_sensitive_content("DB_PASSWORD=x"));
        assert!(has_sensitive_content("POSTGRES_USER=app"));
        assert!(!has_sensitive_content("hello world"));
    }

    #[test]
    fn origin_hops_keep_path_and_query() {
        let from = Url::parse("http://blog.example.com/wp-config.php?x=1").unwrap();
        assert!(is_origin_hop(&from, "https://blog.example.com/wp-config.php?x=1"));
        assert!(is_origin_hop(&from, "http://www.example.com:8080/wp-config.php?x=1"));
        assert!(!is_origin_hop(&from, "https://blog.example.com/wp-config.php"));
        assert!(!is_origin_hop(&from, "/login?next=wp-config.php"));
        assert!(!is_origin_hop(&from, "http://blog.example.com/wp-config.php?x=1"));
    }
}
