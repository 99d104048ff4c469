//! Infisical-backed secret resolution.
//!
//! References look like `infisical://secret-name?projectId=...&environment=...`
//! (short `infisical:` form accepted). Project and environment may be given as
//! query parameters (`projectId`/`workspaceId`, `environment`/`env`); when
//! absent they fall back to `INFISICAL_PROJECT_ID` / `INFISICAL_ENVIRONMENT`.
//!
//! Three resolution modes exist, selected by configuration rather than
//! guessed: the `infisical` CLI, a service token, and universal-auth client
//! credentials. The two HTTP modes share one timeout-bounded client and
//! require an `https://` endpoint; resolved values are cached in-process for
//! the lifetime of the run.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::Mutex;

use fleetkey_core::constants::{
    DEFAULT_INFISICAL_API_URL, DEFAULT_PROVIDER_TIMEOUT_SECS, FLEETKEY_PROVIDER_TIMEOUT_VAR,
    INFISICAL_API_URL_VAR, INFISICAL_CLIENT_ID_VAR, INFISICAL_CLIENT_SECRET_VAR,
    INFISICAL_ENVIRONMENT_VAR, INFISICAL_PROJECT_ID_VAR, INFISICAL_TOKEN_VAR,
};
use fleetkey_core::{Error, Result, Secret};

use crate::cache::SecretCache;
use crate::provider::{strip_scheme, SecretProvider};
use crate::subprocess::run_captured;

const SCHEMES: &[&str] = &["infisical://", "infisical:"];

/// How the provider talks to Infisical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfisicalMode {
    /// Shell out to the `infisical` CLI
    Cli,
    /// Authenticate with a service token from `INFISICAL_TOKEN`
    Token,
    /// Client-credential login via `INFISICAL_CLIENT_ID`/`INFISICAL_CLIENT_SECRET`
    UniversalAuth,
}

impl std::str::FromStr for InfisicalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cli" => Ok(Self::Cli),
            "token" => Ok(Self::Token),
            "universal-auth" => Ok(Self::UniversalAuth),
            other => Err(Error::configuration(format!(
                "unknown infisical mode '{other}' (expected cli, token, or universal-auth)"
            ))),
        }
    }
}

pub struct InfisicalProvider {
    mode: InfisicalMode,
    endpoint: String,
    cli: String,
    timeout: Duration,
    client: reqwest::Client,
    cache: SecretCache,
    access_token: Mutex<Option<String>>,
}

/// The reference body split into its addressing fields.
#[derive(Debug, PartialEq, Eq)]
struct SecretAddress {
    name: String,
    project: Option<String>,
    environment: Option<String>,
}

#[derive(Deserialize)]
struct RawSecretResponse {
    secret: RawSecret,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSecret {
    secret_value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

impl InfisicalProvider {
    /// Build from environment configuration for the given mode.
    pub fn from_env(mode: InfisicalMode) -> Result<Self> {
        let endpoint = std::env::var(INFISICAL_API_URL_VAR)
            .unwrap_or_else(|_| DEFAULT_INFISICAL_API_URL.to_string());
        let timeout = std::env::var(FLEETKEY_PROVIDER_TIMEOUT_VAR)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS);
        Self::new(mode, endpoint, Duration::from_secs(timeout))
    }

    pub fn new(mode: InfisicalMode, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            mode,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            cli: "infisical".to_string(),
            timeout,
            client,
            cache: SecretCache::new(),
            access_token: Mutex::new(None),
        })
    }

    /// The configured endpoint, validated as HTTPS.
    ///
    /// Rejected here, before any network call, so a plaintext endpoint never
    /// sees a token or a secret name.
    fn https_endpoint(&self) -> Result<&str> {
        if self.endpoint.starts_with("https://") {
            Ok(&self.endpoint)
        } else {
            Err(Error::configuration(format!(
                "infisical endpoint must use https:// (got '{}')",
                self.endpoint
            )))
        }
    }

    fn address(&self, reference: &str) -> Result<SecretAddress> {
        let body = strip_scheme(reference, SCHEMES)
            .ok_or_else(|| Error::secret_resolution("infisical", "unrecognized reference"))?;
        let mut address = parse_reference_body(body)?;
        if address.project.is_none() {
            address.project = non_blank_env(INFISICAL_PROJECT_ID_VAR);
        }
        if address.environment.is_none() {
            address.environment = non_blank_env(INFISICAL_ENVIRONMENT_VAR);
        }
        Ok(address)
    }

    fn required(field: Option<String>, what: &str, var: &str) -> Result<String> {
        field.ok_or_else(|| {
            Error::secret_resolution(
                "infisical",
                format!("{what} is required (pass ?{what}= in the reference or set {var})"),
            )
        })
    }

    async fn resolve_cli(&self, name: &str, project: &str, environment: &str) -> Result<Secret> {
        let args = vec![
            "secrets".to_string(),
            "get".to_string(),
            name.to_string(),
            "--projectId".to_string(),
            project.to_string(),
            "--env".to_string(),
            environment.to_string(),
            "--plain".to_string(),
            "--silent".to_string(),
        ];
        let stdout = run_captured(&self.cli, &args, "infisical secrets get", self.timeout).await?;
        Ok(Secret::new(stdout))
    }

    async fn fetch_raw_secret(
        &self,
        token: &str,
        name: &str,
        project: &str,
        environment: &str,
    ) -> Result<Secret> {
        let endpoint = self.https_endpoint()?;
        let url = format!("{endpoint}/api/v3/secrets/raw/{name}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[("workspaceId", project), ("environment", environment)])
            .send()
            .await
            .map_err(|e| Error::network(endpoint, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(
                endpoint,
                format!("secret fetch returned HTTP {status}"),
            ));
        }
        let parsed: RawSecretResponse = response
            .json()
            .await
            .map_err(|e| Error::network(endpoint, format!("undecodable secret response: {e}")))?;
        Ok(Secret::new(parsed.secret.secret_value))
    }

    async fn universal_auth_token(&self) -> Result<String> {
        let mut guard = self.access_token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let endpoint = self.https_endpoint()?;
        let client_id = non_blank_env(INFISICAL_CLIENT_ID_VAR).ok_or_else(|| {
            Error::environment(INFISICAL_CLIENT_ID_VAR, "required for universal-auth mode")
        })?;
        let client_secret = non_blank_env(INFISICAL_CLIENT_SECRET_VAR).ok_or_else(|| {
            Error::environment(
                INFISICAL_CLIENT_SECRET_VAR,
                "required for universal-auth mode",
            )
        })?;
        let url = format!("{endpoint}/api/v1/auth/universal-auth/login");
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "clientId": client_id,
                "clientSecret": client_secret,
            }))
            .send()
            .await
            .map_err(|e| Error::network(endpoint, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(
                endpoint,
                format!("universal-auth login returned HTTP {status}"),
            ));
        }
        let parsed: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::network(endpoint, format!("undecodable login response: {e}")))?;
        *guard = Some(parsed.access_token.clone());
        Ok(parsed.access_token)
    }
}

#[async_trait]
impl SecretProvider for InfisicalProvider {
    fn name(&self) -> &'static str {
        "infisical"
    }

    fn schemes(&self) -> &'static [&'static str] {
        SCHEMES
    }

    async fn resolve(&self, reference: &str) -> Result<Secret> {
        let address = self.address(reference)?;
        let name = address.name;
        let project = Self::required(address.project, "projectId", INFISICAL_PROJECT_ID_VAR)?;
        let environment =
            Self::required(address.environment, "environment", INFISICAL_ENVIRONMENT_VAR)?;

        if let Some(hit) = self.cache.get(&self.endpoint, &project, &environment, &name) {
            tracing::debug!(secret = %name, "infisical cache hit");
            return Ok(hit);
        }

        let secret = match self.mode {
            InfisicalMode::Cli => self.resolve_cli(&name, &project, &environment).await?,
            InfisicalMode::Token => {
                let token = non_blank_env(INFISICAL_TOKEN_VAR).ok_or_else(|| {
                    Error::environment(INFISICAL_TOKEN_VAR, "required for token mode")
                })?;
                self.fetch_raw_secret(&token, &name, &project, &environment)
                    .await?
            }
            InfisicalMode::UniversalAuth => {
                let token = self.universal_auth_token().await?;
                self.fetch_raw_secret(&token, &name, &project, &environment)
                    .await?
            }
        };

        self.cache
            .insert(&self.endpoint, &project, &environment, &name, secret.clone());
        Ok(secret)
    }
}

/// Split `name[?query]` into addressing fields, honoring the
/// `projectId`/`workspaceId` and `environment`/`env` aliases.
fn parse_reference_body(body: &str) -> Result<SecretAddress> {
    let (name, query) = match body.split_once('?') {
        Some((name, query)) => (name, Some(query)),
        None => (body, None),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::secret_resolution("infisical", "secret name is blank"));
    }

    let mut project = None;
    let mut environment = None;
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "projectId" | "workspaceId" => project = Some(value.to_string()),
                "environment" | "env" => environment = Some(value.to_string()),
                _ => {}
            }
        }
    }
    Ok(SecretAddress {
        name: name.to_string(),
        project,
        environment,
    })
}

fn non_blank_env(variable: &str) -> Option<String> {
    std::env::var(variable)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_body_parses_name_and_overrides() {
        let address = parse_reference_body("db-pass?projectId=p-123&environment=prod").unwrap();
        assert_eq!(address.name, "db-pass");
        assert_eq!(address.project.as_deref(), Some("p-123"));
        assert_eq!(address.environment.as_deref(), Some("prod"));
    }

    #[test]
    fn reference_body_honors_alias_parameters() {
        let address = parse_reference_body("db-pass?workspaceId=w-9&env=staging").unwrap();
        assert_eq!(address.project.as_deref(), Some("w-9"));
        assert_eq!(address.environment.as_deref(), Some("staging"));
    }

    #[test]
    fn reference_body_without_query_leaves_fields_unset() {
        let address = parse_reference_body("db-pass").unwrap();
        assert_eq!(address.project, None);
        assert_eq!(address.environment, None);
    }

    #[test]
    fn blank_secret_name_is_rejected() {
        let err = parse_reference_body("  ?projectId=p").unwrap_err();
        assert!(err.to_string().contains("secret name is blank"));
    }

    #[test]
    fn blank_query_values_are_ignored() {
        let address = parse_reference_body("n?projectId=&environment=prod").unwrap();
        assert_eq!(address.project, None);
        assert_eq!(address.environment.as_deref(), Some("prod"));
    }

    #[test]
    fn plaintext_endpoint_is_rejected_before_any_request() {
        let p = InfisicalProvider::new(
            InfisicalMode::Token,
            "http://infisical.internal:8080",
            Duration::from_secs(5),
        )
        .unwrap();
        let err = p.https_endpoint().unwrap_err();
        assert!(err.to_string().contains("must use https://"));
    }

    #[test]
    fn https_endpoint_passes_validation_with_trailing_slash_trimmed() {
        let p = InfisicalProvider::new(
            InfisicalMode::Token,
            "https://app.infisical.com/",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(p.https_endpoint().unwrap(), "https://app.infisical.com");
    }

    #[test]
    fn mode_parses_from_flag_values() {
        assert_eq!("cli".parse::<InfisicalMode>().unwrap(), InfisicalMode::Cli);
        assert_eq!(
            "universal-auth".parse::<InfisicalMode>().unwrap(),
            InfisicalMode::UniversalAuth
        );
        assert!("sdk".parse::<InfisicalMode>().is_err());
    }
}
