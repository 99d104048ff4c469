//! Local password source backed by a designated environment variable.

use async_trait::async_trait;

use fleetkey_core::constants::FLEETKEY_PASSWORD_VAR;
use fleetkey_core::{Error, Result, Secret};

use crate::provider::SecretProvider;

/// Resolves the password from `FLEETKEY_PASSWORD`.
///
/// This provider claims no reference schemes: it is never selected by
/// reference matching, only explicitly by the caller when the configured
/// credential is a bare password rather than a secret reference.
#[derive(Default)]
pub struct LocalProvider;

impl LocalProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretProvider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &[]
    }

    async fn resolve(&self, _reference: &str) -> Result<Secret> {
        match std::env::var(FLEETKEY_PASSWORD_VAR) {
            Ok(value) if !value.trim().is_empty() => Ok(Secret::new(value)),
            _ => Err(Error::environment(
                FLEETKEY_PASSWORD_VAR,
                format!(
                    "not set or blank; export {FLEETKEY_PASSWORD_VAR} or configure a secret reference"
                ),
            )),
        }
    }
}
