use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ProbeError;
use crate::http_client::RedirectMode;
use crate::probe::http_probe::{ProbeClient, ProbeRequest};
use crate::wordlists::{WORDPRESS_INDICATORS, WORDPRESS_PROBES};

/// Minimum score for a WordPress verdict.
pub const WORDPRESS_THRESHOLD: u32 = 2;
/// Score added per canonical endpoint that answers.
pub const PROBE_WEIGHT: u32 = 2;

const PRESENT_STATUSES: [u16; 3] = [200, 302, 401];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_wordpress: bool,
    pub detected_files: BTreeSet<String>,
    pub score: u32,
}

/// Number of indicators present in `body`, case-insensitively.
pub fn indicator_score(body: &str) -> u32 {
    let lower = body.to_lowercase();
    WORDPRESS_INDICATORS
        .iter()
        .filter(|ind| lower.contains(&ind.to_lowercase()))
        .count() as u32
}

#[derive(Debug, Clone)]
pub struct WordPressDetector {
    client: ProbeClient,
    base_timeout: Duration,
    probe_timeout: Duration,
    cancel: CancellationToken,
}

impl WordPressDetector {
    pub fn new(client: ProbeClient, base_timeout: Duration, probe_timeout: Duration, cancel: CancellationToken) -> Self {
        Self { client, base_timeout, probe_timeout, cancel }
    }

    /// Score `url` from body indicators plus the canonical endpoints.
    ///
    /// A base fetch that fails for any transient reason is a plain "not WordPress".
    /// The canonical endpoints follow redirects, so an http→https hop still counts.
    /// Cancellation stops before the next request and scores what was seen.
    pub async fn classify(&self, url: &str) -> Result<Classification, ProbeError> {
        if self.cancel.is_cancelled() {
            return Ok(Classification::default());
        }
        let base = ProbeRequest::new(self.base_timeout, RedirectMode::Follow);
        let page = match self.client.probe(url, &base).await {
            Ok(page) => page,
            Err(e) if e.is_transient() => {
                tracing::debug!(url, error = %e, "wordpress base fetch failed");
                return Ok(Classification::default());
            }
            Err(e) => return Err(e),
        };

        let mut score = indicator_score(&page.body);
        let mut detected_files = BTreeSet::new();

        let base_url = Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let req = ProbeRequest::new(self.probe_timeout, RedirectMode::Follow);
        for path in WORDPRESS_PROBES {
            if self.cancel.is_cancelled() {
                break;
            }
            let probe_url = match base_url.join(path) {
                Ok(u) => u,
                Err(_) => continue,
            };
            match self.client.probe(probe_url.as_str(), &req).await {
                Ok(res) if PRESENT_STATUSES.contains(&res.status) => {
                    score += PROBE_WEIGHT;
                    detected_files.insert(path.to_string());
                }
                Ok(_) => {}
                Err(e) if e.is_transient() => {}
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(url, score, files = ?detected_files, "wordpress score");
        Ok(Classification {
            is_wordpress: score >= WORDPRESS_THRESHOLD,
            detected_files,
            score,
        })
    }
}
