//! Validated run options assembled from flags and the environment.
//!
//! All class-one configuration errors (bad port, bad timeout, unknown
//! provider mode) are raised here, before any credential resolution or
//! network activity.

use std::path::PathBuf;
use std::time::Duration;

use fleetkey_core::{Error, Result};
use fleetkey_secrets::InfisicalMode;

use crate::cli::Cli;

#[derive(Debug)]
pub struct Options {
    pub username: String,
    pub password_ref: String,
    pub host: Option<String>,
    pub hosts: Option<String>,
    pub hosts_file: Option<PathBuf>,
    pub key: Option<String>,
    pub key_file: Option<PathBuf>,
    pub port: u16,
    pub timeout: Duration,
    pub known_hosts: PathBuf,
    pub insecure: bool,
    pub infisical_mode: InfisicalMode,
    pub dry_run: bool,
}

impl Options {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if let Some(env_file) = &cli.env_file {
            dotenv::from_path(env_file).map_err(|e| {
                Error::configuration(format!(
                    "failed to load env file '{}': {e}",
                    env_file.display()
                ))
            })?;
        }

        if cli.port == 0 {
            return Err(Error::configuration("port must be between 1 and 65535"));
        }
        if cli.timeout_secs == 0 {
            return Err(Error::configuration("timeout must be at least 1 second"));
        }
        if cli.user.trim().is_empty() {
            return Err(Error::configuration("username must not be blank"));
        }

        let infisical_mode: InfisicalMode = cli.infisical_mode.parse()?;
        let known_hosts = PathBuf::from(shellexpand::tilde(&cli.known_hosts).into_owned());

        Ok(Self {
            username: cli.user.clone(),
            password_ref: cli.password_ref.trim().to_string(),
            host: cli.host.clone(),
            hosts: cli.hosts.clone(),
            hosts_file: cli.hosts_file.clone(),
            key: cli.key.clone(),
            key_file: cli.key_file.clone(),
            port: cli.port,
            timeout: Duration::from_secs(cli.timeout_secs),
            known_hosts,
            insecure: cli.insecure,
            infisical_mode,
            dry_run: cli.dry_run,
        })
    }
}
