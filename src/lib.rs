pub mod analyze;
pub mod concurrent;
pub mod config;
pub mod discover;
pub mod error;
pub mod http_client;
pub mod output;
pub mod probe;
pub mod scan;
pub mod utils;
pub mod waf;
pub mod wordlists;

// re-export the types most callers need
pub use crate::config::ScanConfig;
pub use crate::error::{DiscoveryError, ProbeError, ScanError};
pub use crate::output::Report;
pub use crate::scan::{ScanOrchestrator, ScanPhase};
