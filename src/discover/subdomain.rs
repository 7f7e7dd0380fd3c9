use dashmap::DashSet;
use reqwest::Client;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::concurrent::WorkerPool;
use crate::discover::crtsh::crtsh_subdomains;
use crate::discover::dns::HostResolver;
use crate::output::events::{EventSink, HostSource, ScanEvent};
use crate::utils::{is_within_domain, normalize_host};

/// Deduplicated hosts written concurrently during discovery.
///
/// Only names equal to the target domain or under it are accepted.
#[derive(Debug, Clone)]
pub struct HostSet {
    domain: Arc<str>,
    hosts: Arc<DashSet<String>>,
}

impl HostSet {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: Arc::from(normalize_host(domain)),
            hosts: Arc::new(DashSet::new()),
        }
    }

    /// Insert a host; returns true only when it is in scope and was not present.
    pub fn insert(&self, name: &str) -> bool {
        let name = normalize_host(name);
        if !is_within_domain(&name, &self.domain) {
            tracing::debug!(host = %name, "out of scope name dropped");
            return false;
        }
        self.hosts.insert(name)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Immutable, sorted snapshot taken at the discovery/scan boundary.
    pub fn freeze(&self) -> FrozenHosts {
        let sorted: BTreeSet<String> = self.hosts.iter().map(|h| h.key().clone()).collect();
        FrozenHosts(Arc::from(sorted.into_iter().collect::<Vec<_>>()))
    }
}

/// Read-only host list handed to the scan phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenHosts(Arc<[String]>);

impl FrozenHosts {
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, host: &str) -> bool {
        self.0.iter().any(|h| h == host)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.to_vec()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub dns: usize,
    pub ct: usize,
}

/// Runs the DNS and CT producers concurrently into one host set.
pub struct SubdomainDiscoverer {
    /// Certificate-verifying client for the CT query.
    pub ct_client: Client,
    pub resolver: Arc<dyn HostResolver>,
    pub words: Vec<String>,
    pub threads: usize,
    pub ct_url: Option<String>,
    pub timeout: Duration,
    pub events: EventSink,
    pub cancel: CancellationToken,
}

impl SubdomainDiscoverer {
    /// Fill `hosts` from both producers, then add the bare domain.
    ///
    /// Returns once both producers have finished; neither can fail the discovery.
    pub async fn discover(&self, hosts: &HostSet) -> DiscoveryStats {
        let (dns, ct) = tokio::join!(self.dns_bruteforce(hosts), self.certificate_transparency(hosts));
        if hosts.is_empty() {
            tracing::info!("no subdomains discovered, scanning {} only", hosts.domain());
        }

        if hosts.insert(hosts.domain()) {
            self.events.emit(ScanEvent::HostFound {
                host: hosts.domain().to_string(),
                source: HostSource::Target,
            });
        }
        tracing::info!(dns, ct, total = hosts.len(), "discovery finished");
        DiscoveryStats { dns, ct }
    }

    async fn dns_bruteforce(&self, hosts: &HostSet) -> usize {
        let domain = hosts.domain().to_string();
        tracing::debug!("Starting DNS bruteforce for {} prefixes", self.words.len());

        let pool = WorkerPool::new(self.threads, self.cancel.clone());
        let found = Arc::new(AtomicUsize::new(0));
        let candidates: Vec<String> = self.words.iter().map(|w| format!("{}.{}", w, domain)).collect();

        let resolver = self.resolver.clone();
        let set = hosts.clone();
        let events = self.events.clone();
        let counter = found.clone();
        pool.run_all(candidates, move |name: String| {
            let resolver = resolver.clone();
            let set = set.clone();
            let events = events.clone();
            let counter = counter.clone();
            async move {
                if resolver.resolves(&name).await && set.insert(&name) {
                    counter.fetch_add(1, Ordering::Relaxed);
                    events.emit(ScanEvent::HostFound { host: name, source: HostSource::Dns });
                }
            }
        })
        .await;

        let found = found.load(Ordering::Relaxed);
        tracing::info!("DNS bruteforce found {} subdomains", found);
        found
    }

    async fn certificate_transparency(&self, hosts: &HostSet) -> usize {
        let Some(endpoint) = &self.ct_url else {
            return 0;
        };
        let query = crtsh_subdomains(&self.ct_client, endpoint, hosts.domain(), self.timeout);
        let names = tokio::select! {
            _ = self.cancel.cancelled() => return 0,
            res = query => match res {
                Ok(names) => names,
                Err(e) => {
                    tracing::warn!(error = %e, "certificate transparency check failed");
                    return 0;
                }
            },
        };

        let mut added = 0;
        for name in names {
            if hosts.insert(&name) {
                added += 1;
                self.events.emit(ScanEvent::HostFound {
                    host: name,
                    source: HostSource::CertificateTransparency,
                });
            }
        }
        added
    }
}
