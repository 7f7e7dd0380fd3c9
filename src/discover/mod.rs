pub mod crtsh;
pub mod dns;
pub mod subdomain;

pub use dns::{HostResolver, StaticResolver, SystemResolver};
pub use subdomain::{DiscoveryStats, FrozenHosts, HostSet, SubdomainDiscoverer};
