//! Ordered provider registry.
//!
//! Insertion order is resolution priority. The registry is populated once at
//! startup by the composition root and read concurrently afterwards; a
//! read-write lock keeps registration and snapshotting safe.

use parking_lot::RwLock;
use std::sync::Arc;

use fleetkey_core::{Error, Result};

use crate::provider::SecretProvider;

/// Ordered, deduplicated-by-name collection of secret providers.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<Vec<Arc<dyn SecretProvider>>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider at the end of the resolution order.
    ///
    /// Fails on a duplicate provider name or on a scheme claim that overlaps
    /// an already-registered claim; first-match-wins dispatch stays
    /// deterministic only when claims are disjoint.
    pub fn register(&self, provider: Arc<dyn SecretProvider>) -> Result<()> {
        let mut providers = self.providers.write();
        for existing in providers.iter() {
            if existing.name() == provider.name() {
                return Err(Error::provider_registration(format!(
                    "provider '{}' is already registered",
                    provider.name()
                )));
            }
            for claimed in existing.schemes() {
                for scheme in provider.schemes() {
                    if schemes_overlap(claimed, scheme) {
                        return Err(Error::provider_registration(format!(
                            "scheme '{}' claimed by '{}' overlaps '{}' claimed by '{}'",
                            scheme,
                            provider.name(),
                            claimed,
                            existing.name()
                        )));
                    }
                }
            }
        }
        providers.push(provider);
        Ok(())
    }

    /// Clone the ordered provider list for lock-free iteration
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn SecretProvider>> {
        self.providers.read().clone()
    }

    /// Whether any provider is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    /// Number of registered providers
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }
}

/// Two scheme claims overlap when one is a case-insensitive prefix of the
/// other (`bw:` would shadow `bw://`, and vice versa).
fn schemes_overlap(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long[..short.len()].eq_ignore_ascii_case(short)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fleetkey_core::Secret;

    struct FakeProvider {
        name: &'static str,
        schemes: &'static [&'static str],
    }

    #[async_trait]
    impl SecretProvider for FakeProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn schemes(&self) -> &'static [&'static str] {
            self.schemes
        }

        async fn resolve(&self, _reference: &str) -> fleetkey_core::Result<Secret> {
            Ok(Secret::new("unused"))
        }
    }

    #[test]
    fn registration_order_is_preserved() {
        let registry = ProviderRegistry::new();
        registry
            .register(Arc::new(FakeProvider {
                name: "first",
                schemes: &["a://"],
            }))
            .unwrap();
        registry
            .register(Arc::new(FakeProvider {
                name: "second",
                schemes: &["b://"],
            }))
            .unwrap();
        let names: Vec<&str> = registry.snapshot().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = ProviderRegistry::new();
        registry
            .register(Arc::new(FakeProvider {
                name: "dup",
                schemes: &["a://"],
            }))
            .unwrap();
        let err = registry
            .register(Arc::new(FakeProvider {
                name: "dup",
                schemes: &["b://"],
            }))
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn overlapping_schemes_are_rejected() {
        let registry = ProviderRegistry::new();
        registry
            .register(Arc::new(FakeProvider {
                name: "wide",
                schemes: &["bw:"],
            }))
            .unwrap();
        let err = registry
            .register(Arc::new(FakeProvider {
                name: "narrow",
                schemes: &["bw://"],
            }))
            .unwrap_err();
        assert!(err.to_string().contains("overlaps"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn schemeless_and_alias_claims_register_cleanly() {
        // aliases overlap only across providers, not within one
        let registry = ProviderRegistry::new();
        registry
            .register(Arc::new(FakeProvider {
                name: "local",
                schemes: &[],
            }))
            .unwrap();
        registry
            .register(Arc::new(FakeProvider {
                name: "bitwarden",
                schemes: &["bw://", "bw:"],
            }))
            .unwrap();
        assert_eq!(registry.len(), 2);
    }
}
