//! Bitwarden-backed secret resolution.
//!
//! References look like `bw://<item-id>` (or the short `bw:<item-id>` form).
//! Resolution first asks the classic `bw` CLI for the item's password; if
//! that fails for any reason it falls back to the Secrets Manager `bws` CLI,
//! whose output is a JSON object carrying the secret in its `value` field.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use fleetkey_core::constants::{
    BWS_CLI_VAR, BW_CLI_VAR, DEFAULT_BWS_CLI, DEFAULT_BW_CLI, DEFAULT_PROVIDER_TIMEOUT_SECS,
    FLEETKEY_PROVIDER_TIMEOUT_VAR,
};
use fleetkey_core::{Error, Result, Secret};

use crate::provider::{strip_scheme, SecretProvider};
use crate::subprocess::run_captured;

const SCHEMES: &[&str] = &["bw://", "bw:"];

pub struct BitwardenProvider {
    bw_cli: String,
    bws_cli: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct BwsSecret {
    value: String,
}

impl BitwardenProvider {
    /// Build from environment overrides (`BW_CLI`, `BWS_CLI`,
    /// `FLEETKEY_PROVIDER_TIMEOUT_SECS`), falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let timeout = std::env::var(FLEETKEY_PROVIDER_TIMEOUT_VAR)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS);
        Self::new(
            std::env::var(BW_CLI_VAR).unwrap_or_else(|_| DEFAULT_BW_CLI.to_string()),
            std::env::var(BWS_CLI_VAR).unwrap_or_else(|_| DEFAULT_BWS_CLI.to_string()),
            Duration::from_secs(timeout),
        )
    }

    #[must_use]
    pub fn new(bw_cli: impl Into<String>, bws_cli: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bw_cli: bw_cli.into(),
            bws_cli: bws_cli.into(),
            timeout,
        }
    }

    fn identifier<'a>(&self, reference: &'a str) -> Result<&'a str> {
        let id = strip_scheme(reference, SCHEMES)
            .ok_or_else(|| Error::secret_resolution("bitwarden", "unrecognized reference"))?
            .trim();
        if id.is_empty() {
            return Err(Error::secret_resolution(
                "bitwarden",
                "secret identifier is blank",
            ));
        }
        Ok(id)
    }

    async fn resolve_primary(&self, id: &str) -> Result<Secret> {
        let args = vec![
            "get".to_string(),
            "password".to_string(),
            id.to_string(),
            "--raw".to_string(),
        ];
        let stdout = run_captured(&self.bw_cli, &args, "bw get password", self.timeout).await?;
        Ok(Secret::new(stdout))
    }

    async fn resolve_fallback(&self, id: &str) -> Result<Secret> {
        let args = vec!["secret".to_string(), "get".to_string(), id.to_string()];
        let stdout = run_captured(&self.bws_cli, &args, "bws secret get", self.timeout).await?;
        let parsed: BwsSecret = serde_json::from_str(&stdout).map_err(|e| {
            Error::secret_resolution("bitwarden", format!("bws output is not valid JSON: {e}"))
        })?;
        if parsed.value.trim().is_empty() {
            return Err(Error::secret_resolution(
                "bitwarden",
                "bws returned an empty secret value",
            ));
        }
        Ok(Secret::new(parsed.value))
    }
}

#[async_trait]
impl SecretProvider for BitwardenProvider {
    fn name(&self) -> &'static str {
        "bitwarden"
    }

    fn schemes(&self) -> &'static [&'static str] {
        SCHEMES
    }

    async fn resolve(&self, reference: &str) -> Result<Secret> {
        let id = self.identifier(reference)?;
        match self.resolve_primary(id).await {
            Ok(secret) => Ok(secret),
            Err(primary_err) => {
                tracing::debug!(error = %primary_err, "bw lookup failed, trying bws");
                self.resolve_fallback(id).await.map_err(|fallback_err| {
                    Error::secret_resolution(
                        "bitwarden",
                        format!("{fallback_err} (primary attempt: {primary_err})"),
                    )
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> BitwardenProvider {
        BitwardenProvider::new("bw", "bws", Duration::from_secs(5))
    }

    #[test]
    fn supports_both_uri_and_short_alias_forms() {
        let p = provider();
        assert!(p.supports("bw://item-id"));
        assert!(p.supports("bw:item-id"));
        assert!(p.supports("BW://item-id"));
        assert!(!p.supports("bws://item-id"));
        assert!(!p.supports("infisical://item"));
    }

    #[test]
    fn identifier_requires_non_blank_body() {
        let p = provider();
        assert_eq!(p.identifier("bw://item-id").unwrap(), "item-id");
        assert_eq!(p.identifier("bw:  padded  ").unwrap(), "padded");
        let err = p.identifier("bw://   ").unwrap_err();
        assert!(err.to_string().contains("blank"));
    }

    #[tokio::test]
    async fn fallback_rejects_undecodable_json() {
        let p = BitwardenProvider::new(
            "fleetkey-no-such-bw",
            "echo", // "echo <id>" prints the id, which is not JSON
            Duration::from_secs(5),
        );
        let err = p.resolve("bw://item").await.unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[cfg(unix)]
    fn stub_script(dir: &std::path::Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fallback_parses_bws_value_field() {
        let dir = tempfile::tempdir().unwrap();
        let bws = stub_script(dir.path(), "bws", r#"echo '{"id":"x","value":"s3cret"}'"#);
        let p = BitwardenProvider::new("fleetkey-no-such-bw", bws, Duration::from_secs(5));
        let secret = p.resolve("bw://item").await.unwrap();
        assert_eq!(secret.expose(), "s3cret");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fallback_rejects_blank_value_field() {
        let dir = tempfile::tempdir().unwrap();
        let bws = stub_script(dir.path(), "bws", r#"echo '{"value":"   "}'"#);
        let p = BitwardenProvider::new("fleetkey-no-such-bw", bws, Duration::from_secs(5));
        let err = p.resolve("bw://item").await.unwrap_err();
        assert!(err.to_string().contains("empty secret value"));
    }

    #[tokio::test]
    async fn both_paths_failing_reports_fallback_with_primary_context() {
        let p = BitwardenProvider::new(
            "fleetkey-no-such-bw",
            "fleetkey-no-such-bws",
            Duration::from_secs(5),
        );
        let err = p.resolve("bw://item").await.unwrap_err();
        assert!(err.to_string().contains("primary attempt"));
    }
}
