pub mod http_probe;

pub use http_probe::{LiveEndpoint, ProbeClient, ProbeRequest, ProbeResult};
