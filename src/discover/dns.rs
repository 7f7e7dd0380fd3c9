use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::collections::HashSet;
use std::time::Duration;

/// Answers "does this name resolve to anything". Failures of any kind mean no.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolves(&self, host: &str) -> bool;
}

/// Resolver backed by the system DNS configuration.
pub struct SystemResolver {
    inner: TokioAsyncResolver,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        let inner = match hickory_resolver::system_conf::read_system_conf() {
            Ok((config, mut opts)) => {
                opts.timeout = timeout;
                opts.attempts = 1;
                TokioAsyncResolver::tokio(config, opts)
            }
            Err(e) => {
                tracing::warn!(error = %e, "no system resolver config, using defaults");
                let mut opts = ResolverOpts::default();
                opts.timeout = timeout;
                opts.attempts = 1;
                TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
            }
        };
        Self { inner }
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolves(&self, host: &str) -> bool {
        match self.inner.lookup_ip(host).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => {
                tracing::trace!(host, error = %e, "no address");
                false
            }
        }
    }
}

/// Fixed answer set, for offline runs and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    known: HashSet<String>,
}

impl StaticResolver {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { known: names.into_iter().map(Into::into).collect() }
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolves(&self, host: &str) -> bool {
        self.known.contains(host)
    }
}
