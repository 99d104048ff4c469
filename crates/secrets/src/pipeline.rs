//! First-match-wins secret resolution.
//!
//! The pipeline walks the registry in registration order and resolves via the
//! first provider that recognizes the reference. A provider that "succeeds"
//! with a blank value is a hard failure, not a skip; a provider that errors is
//! recorded and the walk continues to the next matching provider. The pipeline
//! itself is side-effect-free beyond provider invocation.

use fleetkey_core::{Error, Result, Secret};

use crate::registry::ProviderRegistry;

/// Resolve a secret reference through the ordered provider registry.
pub async fn resolve_secret_reference(
    reference: &str,
    registry: &ProviderRegistry,
) -> Result<Secret> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(Error::secret_pipeline("empty secret reference"));
    }
    let providers = registry.snapshot();
    if providers.is_empty() {
        return Err(Error::secret_pipeline("no providers configured"));
    }

    let mut failures: Vec<Error> = Vec::new();
    for provider in &providers {
        if !provider.supports(reference) {
            continue;
        }
        tracing::debug!(provider = provider.name(), "resolving secret reference");
        match provider.resolve(reference).await {
            Ok(secret) => {
                if secret.is_blank() {
                    return Err(Error::secret_resolution(
                        provider.name(),
                        "returned an empty secret",
                    ));
                }
                return Ok(Secret::new(secret.expose().trim().to_string()));
            }
            Err(err) => {
                // provider name + generic message only; the raw reference
                // text must not end up in logs
                tracing::warn!(provider = provider.name(), error = %err, "provider failed");
                failures.push(match err {
                    Error::SecretResolution { .. } => err,
                    other => Error::secret_resolution(provider.name(), other.to_string()),
                });
            }
        }
    }

    if failures.is_empty() {
        return Err(Error::secret_pipeline(format!(
            "no provider supports reference scheme '{}'",
            reference_scheme(reference)
        )));
    }
    if failures.len() == 1 {
        return Err(failures.remove(0));
    }
    let joined = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(Error::secret_pipeline(joined))
}

/// The scheme portion of a reference (`bw://`, `infisical:`), safe to echo.
fn reference_scheme(reference: &str) -> &str {
    if let Some(idx) = reference.find("://") {
        return &reference[..idx + 3];
    }
    if let Some(idx) = reference.find(':') {
        return &reference[..idx + 1];
    }
    ""
}
