//! Two-phase scan driver.
//!
//! The orchestrator walks `Idle → Discovering → Scanning → Reporting → Done`.
//! Discovery fills a [`HostSet`] from the DNS and CT producers; its frozen
//! snapshot is the exact task list of the scan phase. Each host task runs on a
//! bounded [`WorkerPool`] and merges its findings into the [`SharedReport`] in
//! one locked append.
//!
//! Latency: timeouts are per request, so a dead-slow host holds one worker for
//! at most `3 × timeout + (3 + (23 + 63) × (1 + 38)) × file_timeout` per live
//! URL. See [`ScanConfig::worst_case_host_latency`].

use futures::FutureExt;
use parking_lot::Mutex;
use reqwest::Client;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::analyze::{FileSweeper, WordPressDetector};
use crate::concurrent::WorkerPool;
use crate::config::ScanConfig;
use crate::discover::{FrozenHosts, HostResolver, HostSet, SubdomainDiscoverer};
use crate::error::ScanError;
use crate::http_client::create_ct_client;
use crate::output::events::{EventSink, ScanEvent};
use crate::output::report::{FindingKind, HostOutcome, Report, SharedReport, WordPressSite};
use crate::probe::http_probe::ProbeClient;
use crate::waf::BypassStrategy;
use crate::wordlists::{self, SENSITIVE_PATHS, WORDPRESS_PATHS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Discovering,
    Scanning,
    Reporting,
    Done,
}

impl ScanPhase {
    pub fn name(self) -> &'static str {
        match self {
            ScanPhase::Idle => "idle",
            ScanPhase::Discovering => "discovering",
            ScanPhase::Scanning => "scanning",
            ScanPhase::Reporting => "reporting",
            ScanPhase::Done => "done",
        }
    }

    pub fn next(self) -> Option<ScanPhase> {
        match self {
            ScanPhase::Idle => Some(ScanPhase::Discovering),
            ScanPhase::Discovering => Some(ScanPhase::Scanning),
            ScanPhase::Scanning => Some(ScanPhase::Reporting),
            ScanPhase::Reporting => Some(ScanPhase::Done),
            ScanPhase::Done => None,
        }
    }
}

/// Everything one host task needs. Cloned into each task.
#[derive(Clone)]
struct HostScanner {
    client: ProbeClient,
    detector: WordPressDetector,
    sweeper: FileSweeper,
    timeout: Duration,
    events: EventSink,
    cancel: CancellationToken,
}

impl HostScanner {
    async fn scan_host(&self, host: &str) -> Result<HostOutcome, ScanError> {
        let mut outcome = HostOutcome::default();
        let live = self.client.check_liveness(host, self.timeout).await?;
        if live.is_empty() {
            self.events.emit(ScanEvent::HostUnreachable { host: host.to_string() });
            return Ok(outcome);
        }

        for endpoint in live {
            if self.cancel.is_cancelled() {
                break;
            }
            self.events.emit(ScanEvent::HostLive {
                url: endpoint.url.clone(),
                status: endpoint.status,
                size: endpoint.size,
            });

            let class = self.detector.classify(&endpoint.url).await?;
            if class.is_wordpress {
                self.events.emit(ScanEvent::WordPressDetected {
                    url: endpoint.url.clone(),
                    files: class.detected_files.iter().cloned().collect(),
                });
                self.events.emit(ScanEvent::SweepStarted { url: endpoint.url.clone(), list: "wordpress" });
                let mut findings = self.sweeper.sweep(&endpoint.url, WORDPRESS_PATHS, FindingKind::WordpressFile).await?;
                self.events.emit(ScanEvent::SweepStarted { url: endpoint.url.clone(), list: "sensitive" });
                findings.extend(self.sweeper.sweep(&endpoint.url, SENSITIVE_PATHS, FindingKind::SensitiveFile).await?);
                outcome.wordpress_sites.push(WordPressSite {
                    url: endpoint.url,
                    subdomain: host.to_string(),
                    status: endpoint.status,
                    wp_files_detected: class.detected_files,
                    findings,
                });
            } else {
                self.events.emit(ScanEvent::NotWordPress { url: endpoint.url.clone() });
                self.events.emit(ScanEvent::SweepStarted { url: endpoint.url.clone(), list: "sensitive" });
                let findings = self.sweeper.sweep(&endpoint.url, SENSITIVE_PATHS, FindingKind::SensitiveFile).await?;
                outcome.findings.extend(findings);
            }
        }
        Ok(outcome)
    }
}

pub struct ScanOrchestrator {
    config: Arc<ScanConfig>,
    client: ProbeClient,
    ct_client: Client,
    resolver: Arc<dyn HostResolver>,
    words: Vec<String>,
    events: EventSink,
    cancel: CancellationToken,
    phase: Mutex<ScanPhase>,
}

impl ScanOrchestrator {
    /// Validate the configuration and build the HTTP clients. Fails only on bad input.
    pub fn new(
        mut config: ScanConfig,
        resolver: Arc<dyn HostResolver>,
        events: EventSink,
        cancel: CancellationToken,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        let words = match &config.wordlist {
            Some(path) => wordlists::load_wordlist(path).map_err(|e| ScanError::InvalidConfig(e.to_string()))?,
            None => wordlists::default_subdomain_words(),
        };
        let client = ProbeClient::new(config.scan_workers.max(10) * 4)?;
        let ct_client = create_ct_client()?;
        Ok(Self {
            config: Arc::new(config),
            client,
            ct_client,
            resolver,
            words,
            events,
            cancel,
            phase: Mutex::new(ScanPhase::Idle),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn phase(&self) -> ScanPhase {
        *self.phase.lock()
    }

    fn advance(&self, to: ScanPhase) -> Result<(), ScanError> {
        let mut current = self.phase.lock();
        if current.next() != Some(to) {
            return Err(ScanError::PhaseTransition { from: current.name(), to: to.name() });
        }
        *current = to;
        drop(current);
        tracing::info!(phase = to.name(), "phase changed");
        self.events.emit(ScanEvent::PhaseChanged { phase: to.name() });
        Ok(())
    }

    /// Run discovery, then the per-host scan, and return the frozen report.
    ///
    /// Cancellation skips straight to reporting with whatever was collected and
    /// marks the report as interrupted.
    pub async fn run(&self) -> Result<Report, ScanError> {
        let report = SharedReport::new(Report::new(&self.config.domain));

        self.advance(ScanPhase::Discovering)?;
        let hosts = self.discover().await;
        report.set_hosts(hosts.iter().cloned());

        self.advance(ScanPhase::Scanning)?;
        if !self.cancel.is_cancelled() {
            self.scan_hosts(&hosts, &report).await;
        }

        self.advance(ScanPhase::Reporting)?;
        if self.cancel.is_cancelled() {
            tracing::warn!("scan interrupted, reporting partial results");
            report.mark_interrupted();
        }
        let report = report.into_report();
        self.events.emit(ScanEvent::ScanCompleted {
            hosts: report.subdomains_found.len(),
            wordpress_sites: report.wordpress_sites.len(),
            findings: report.findings.len(),
            interrupted: report.interrupted,
        });

        self.advance(ScanPhase::Done)?;
        Ok(report)
    }

    async fn discover(&self) -> FrozenHosts {
        let hosts = HostSet::new(&self.config.domain);
        let discoverer = SubdomainDiscoverer {
            ct_client: self.ct_client.clone(),
            resolver: self.resolver.clone(),
            words: if self.config.enable_dns { self.words.clone() } else { Vec::new() },
            threads: self.config.threads,
            ct_url: self.config.enable_ct.then(|| self.config.ct_url.clone()),
            timeout: self.config.timeout(),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
        };
        let stats = discoverer.discover(&hosts).await;
        let frozen = hosts.freeze();
        self.events.emit(ScanEvent::DiscoveryFinished { dns: stats.dns, ct: stats.ct, total: frozen.len() });
        frozen
    }

    async fn scan_hosts(&self, hosts: &FrozenHosts, report: &SharedReport) {
        if hosts.is_empty() {
            return;
        }
        let workers = self.config.scan_workers.min(hosts.len()).max(1);
        let bound = self.config.worst_case_host_latency(
            WORDPRESS_PATHS.len(),
            SENSITIVE_PATHS.len(),
            BypassStrategy::MAX_PROBES,
        );
        tracing::info!("Starting host scan: {} hosts with {} workers", hosts.len(), workers);
        tracing::debug!(worst_case_secs = bound.as_secs(), "per-host latency bound");

        let scanner = HostScanner {
            client: self.client.clone(),
            detector: WordPressDetector::new(
                self.client.clone(),
                self.config.timeout(),
                self.config.file_timeout(),
                self.cancel.clone(),
            ),
            sweeper: FileSweeper::new(
                self.client.clone(),
                self.config.file_timeout(),
                self.events.clone(),
                self.cancel.clone(),
            ),
            timeout: self.config.timeout(),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
        };

        let pool = WorkerPool::new(workers, self.cancel.clone());
        let report = report.clone();
        pool.run_all(hosts.to_vec(), move |host: String| {
            let scanner = scanner.clone();
            let report = report.clone();
            async move {
                let task = AssertUnwindSafe(scanner.scan_host(&host)).catch_unwind().await;
                let findings = match task {
                    Ok(Ok(outcome)) => {
                        let count = outcome.finding_count();
                        if !outcome.is_empty() {
                            report.merge(outcome);
                        }
                        count
                    }
                    Ok(Err(e)) => {
                        tracing::error!(host = %host, error = %e, "host task failed");
                        scanner.events.emit(ScanEvent::TaskFailed { host: host.clone(), error: e.to_string() });
                        0
                    }
                    Err(_) => {
                        tracing::error!(host = %host, "host task panicked");
                        scanner.events.emit(ScanEvent::TaskFailed { host: host.clone(), error: "task panicked".into() });
                        0
                    }
                };
                scanner.events.emit(ScanEvent::HostScanned { host, findings });
            }
        })
        .await;

        let stats = pool.stats();
        tracing::info!(completed = stats.completed, failed = stats.failed, skipped = stats.skipped, "host scan finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::StaticResolver;

    fn orchestrator() -> ScanOrchestrator {
        let mut cfg = ScanConfig::for_domain("example.invalid");
        cfg.enable_ct = false;
        ScanOrchestrator::new(cfg, Arc::new(StaticResolver::default()), EventSink::disabled(), CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn phases_cannot_be_skipped() {
        let orch = orchestrator();
        assert_eq!(orch.phase(), ScanPhase::Idle);
        assert!(orch.advance(ScanPhase::Scanning).is_err());
        orch.advance(ScanPhase::Discovering).unwrap();
        assert!(orch.advance(ScanPhase::Reporting).is_err());
        assert_eq!(orch.phase(), ScanPhase::Discovering);
    }

    #[test]
    fn empty_domain_is_rejected() {
        let res = ScanOrchestrator::new(
            ScanConfig::for_domain(" "),
            Arc::new(StaticResolver::default()),
            EventSink::disabled(),
            CancellationToken::new(),
        );
        assert!(matches!(res, Err(ScanError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn cancelled_scan_still_reports() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut cfg = ScanConfig::for_domain("example.invalid");
        cfg.enable_ct = false;
        let orch = ScanOrchestrator::new(cfg, Arc::new(StaticResolver::default()), EventSink::disabled(), cancel).unwrap();
        let report = orch.run().await.unwrap();
        assert!(report.interrupted);
        assert!(report.subdomains_found.contains("example.invalid"));
        assert!(report.findings.is_empty());
        assert_eq!(orch.phase(), ScanPhase::Done);
    }
}
