use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleetkey")]
#[command(about = "Provision SSH public-key access across a fleet of hosts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Remote username to authenticate as
    #[arg(long, short)]
    pub user: String,

    /// Secret reference for the SSH password (e.g. bw://item-id or
    /// infisical://name?projectId=...). Empty means read $FLEETKEY_PASSWORD.
    #[arg(long, default_value = "")]
    pub password_ref: String,

    /// A single host (host or host:port)
    #[arg(long)]
    pub host: Option<String>,

    /// Comma-separated host list
    #[arg(long)]
    pub hosts: Option<String>,

    /// File with one host per line; blank lines and # comments are ignored
    #[arg(long)]
    pub hosts_file: Option<PathBuf>,

    /// Inline authorized_keys line to provision
    #[arg(long, conflicts_with = "key_file")]
    pub key: Option<String>,

    /// Path to the public key file to provision
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Default SSH port applied to hosts without an explicit one
    #[arg(long, default_value_t = 22)]
    pub port: u16,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// known_hosts file used for host-key trust decisions
    #[arg(long, default_value = "~/.ssh/known_hosts")]
    pub known_hosts: String,

    /// Accept any host key without verification
    #[arg(long)]
    pub insecure: bool,

    /// dotenv file loaded before provider settings are read
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Infisical resolution mode: cli, token, or universal-auth
    #[arg(long, default_value = "cli")]
    pub infisical_mode: String,

    /// Resolve credential, hosts, and key, then stop before connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn inline_key_and_key_file_conflict() {
        let result = Cli::try_parse_from([
            "fleetkey",
            "--user",
            "ops",
            "--key",
            "ssh-ed25519 AAAA",
            "--key-file",
            "/tmp/key.pub",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn defaults_are_applied() {
        let cli = Cli::try_parse_from(["fleetkey", "--user", "ops"]).unwrap();
        assert_eq!(cli.port, 22);
        assert_eq!(cli.timeout_secs, 10);
        assert_eq!(cli.known_hosts, "~/.ssh/known_hosts");
        assert_eq!(cli.infisical_mode, "cli");
        assert!(cli.password_ref.is_empty());
        assert!(!cli.insecure);
    }
}
