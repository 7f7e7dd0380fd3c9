use serde::Serialize;
use tokio::sync::mpsc;

use crate::output::report::{Finding, FindingCategory};

/// Where a discovered host came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostSource {
    Dns,
    CertificateTransparency,
    Target,
}

/// Typed progress events emitted by the engine. Rendering is left to the consumer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    PhaseChanged { phase: &'static str },
    HostFound { host: String, source: HostSource },
    DiscoveryFinished { dns: usize, ct: usize, total: usize },
    HostLive { url: String, status: u16, size: usize },
    HostUnreachable { host: String },
    WordPressDetected { url: String, files: Vec<String> },
    NotWordPress { url: String },
    SweepStarted { url: String, list: &'static str },
    FindingRecorded { category: FindingCategory, finding: Finding },
    TaskFailed { host: String, error: String },
    HostScanned { host: String, findings: usize },
    ScanCompleted { hosts: usize, wordpress_sites: usize, findings: usize, interrupted: bool },
}

/// Cheap, clonable handle for emitting events. A disabled sink drops everything.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<ScanEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: ScanEvent) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody renders; the scan carries on.
            let _ = tx.send(event);
        }
    }

    pub fn finding(&self, finding: &Finding) {
        self.emit(ScanEvent::FindingRecorded { category: finding.category(), finding: finding.clone() });
    }
}
