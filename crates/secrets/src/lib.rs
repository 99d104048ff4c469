//! Secret reference resolution for fleetkey.
//!
//! A secret reference is an opaque URI-like string (`bw://item-id`,
//! `infisical://name?projectId=...`) identifying a credential to resolve,
//! distinct from the credential's plaintext value. This crate provides the
//! provider capability trait, the ordered provider registry, the
//! first-match-wins resolution pipeline, and the concrete backends.

pub mod bitwarden;
pub mod cache;
pub mod infisical;
pub mod local;
pub mod pipeline;
pub mod provider;
pub mod registry;
mod subprocess;

pub use bitwarden::BitwardenProvider;
pub use cache::SecretCache;
pub use infisical::{InfisicalMode, InfisicalProvider};
pub use local::LocalProvider;
pub use pipeline::resolve_secret_reference;
pub use provider::SecretProvider;
pub use registry::ProviderRegistry;
