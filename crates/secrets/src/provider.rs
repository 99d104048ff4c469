//! The secret provider capability trait.

use async_trait::async_trait;
use fleetkey_core::{Result, Secret};

/// A credential backend that can resolve secret references.
///
/// Providers declare their URI-scheme claims up front via [`schemes`];
/// the registry uses those claims to reject overlapping registrations, and
/// the default [`supports`] implementation matches them case-insensitively.
///
/// [`schemes`]: SecretProvider::schemes
/// [`supports`]: SecretProvider::supports
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Stable provider identifier used in error messages and logs
    fn name(&self) -> &'static str;

    /// URI-style prefixes this provider claims, e.g. `&["bw://", "bw:"]`.
    ///
    /// An empty slice means the provider is never selected by reference
    /// matching and must be chosen explicitly by the caller.
    fn schemes(&self) -> &'static [&'static str];

    /// Pure predicate: does this provider recognize the reference?
    fn supports(&self, reference: &str) -> bool {
        self.schemes()
            .iter()
            .any(|scheme| has_prefix_ignore_case(reference, scheme))
    }

    /// Resolve the reference to a plaintext secret.
    ///
    /// May invoke subprocesses, perform network calls, or consult an
    /// in-process cache. Errors must not echo the raw reference text.
    async fn resolve(&self, reference: &str) -> Result<Secret>;
}

/// Strip the longest matching scheme prefix, case-insensitively, returning
/// the remaining identifier. `None` when no scheme matches.
#[must_use]
pub fn strip_scheme<'a>(reference: &'a str, schemes: &[&str]) -> Option<&'a str> {
    let mut best: Option<&str> = None;
    for scheme in schemes.iter().copied() {
        if has_prefix_ignore_case(reference, scheme)
            && best.map_or(true, |b| scheme.len() > b.len())
        {
            best = Some(scheme);
        }
    }
    best.map(|scheme| &reference[scheme.len()..])
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len() && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_scheme_prefers_longest_match() {
        let schemes = &["bw:", "bw://"];
        assert_eq!(strip_scheme("bw://item-id", schemes), Some("item-id"));
        assert_eq!(strip_scheme("bw:item-id", schemes), Some("item-id"));
        assert_eq!(strip_scheme("vault://item-id", schemes), None);
    }

    #[test]
    fn strip_scheme_is_case_insensitive() {
        assert_eq!(strip_scheme("BW://Item", &["bw://"]), Some("Item"));
    }
}
