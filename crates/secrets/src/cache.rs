//! In-process secret response cache.
//!
//! Keyed by `{endpoint, project, environment, secret-name}` so repeated
//! resolutions of the same reference within one run skip the network and
//! auth round trips. Process-lifetime only: never persisted, never evicted.

use parking_lot::RwLock;
use std::collections::HashMap;

use fleetkey_core::Secret;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    endpoint: String,
    project: String,
    environment: String,
    name: String,
}

#[derive(Default)]
pub struct SecretCache {
    entries: RwLock<HashMap<CacheKey, Secret>>,
}

impl SecretCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, endpoint: &str, project: &str, environment: &str, name: &str) -> Option<Secret> {
        let key = CacheKey {
            endpoint: endpoint.to_string(),
            project: project.to_string(),
            environment: environment.to_string(),
            name: name.to_string(),
        };
        self.entries.read().get(&key).cloned()
    }

    pub fn insert(
        &self,
        endpoint: &str,
        project: &str,
        environment: &str,
        name: &str,
        secret: Secret,
    ) {
        let key = CacheKey {
            endpoint: endpoint.to_string(),
            project: project.to_string(),
            environment: environment.to_string(),
            name: name.to_string(),
        };
        self.entries.write().insert(key, secret);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_requires_every_key_component_to_match() {
        let cache = SecretCache::new();
        cache.insert("https://a", "proj", "prod", "db-pass", Secret::new("v1"));

        assert_eq!(
            cache
                .get("https://a", "proj", "prod", "db-pass")
                .unwrap()
                .expose(),
            "v1"
        );
        assert!(cache.get("https://b", "proj", "prod", "db-pass").is_none());
        assert!(cache.get("https://a", "other", "prod", "db-pass").is_none());
        assert!(cache.get("https://a", "proj", "staging", "db-pass").is_none());
        assert!(cache.get("https://a", "proj", "prod", "api-key").is_none());
    }

    #[test]
    fn insert_overwrites_without_eviction() {
        let cache = SecretCache::new();
        cache.insert("e", "p", "env", "n", Secret::new("old"));
        cache.insert("e", "p", "env", "n", Secret::new("new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("e", "p", "env", "n").unwrap().expose(), "new");
    }
}
