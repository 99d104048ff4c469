//! SSH-facing half of fleetkey: host list resolution, public-key handling,
//! the trust-on-first-use host-key engine, and the per-host provisioning
//! executor.

pub mod hosts;
pub mod key;
pub mod known_hosts;
pub mod provision;
pub mod trust;

pub use hosts::{normalize_host, resolve_hosts};
pub use key::resolve_public_key;
pub use known_hosts::{KeyCheck, KnownHostsFile};
pub use provision::{provision_host, ClientConfig};
pub use trust::{HostKeyVerifier, HostVerification};
