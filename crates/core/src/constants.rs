/// Constants used throughout the fleetkey codebase
// SSH defaults
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_KNOWN_HOSTS_PATH: &str = "~/.ssh/known_hosts";

// Secret provider defaults
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INFISICAL_API_URL: &str = "https://app.infisical.com";

// Environment variable names
pub const FLEETKEY_PASSWORD_VAR: &str = "FLEETKEY_PASSWORD";
pub const FLEETKEY_LOG_VAR: &str = "FLEETKEY_LOG";
pub const FLEETKEY_PROVIDER_TIMEOUT_VAR: &str = "FLEETKEY_PROVIDER_TIMEOUT_SECS";

// Bitwarden provider
pub const BW_CLI_VAR: &str = "BW_CLI";
pub const BWS_CLI_VAR: &str = "BWS_CLI";
pub const DEFAULT_BW_CLI: &str = "bw";
pub const DEFAULT_BWS_CLI: &str = "bws";

// Infisical provider
pub const INFISICAL_API_URL_VAR: &str = "INFISICAL_API_URL";
pub const INFISICAL_TOKEN_VAR: &str = "INFISICAL_TOKEN";
pub const INFISICAL_CLIENT_ID_VAR: &str = "INFISICAL_CLIENT_ID";
pub const INFISICAL_CLIENT_SECRET_VAR: &str = "INFISICAL_CLIENT_SECRET";
pub const INFISICAL_PROJECT_ID_VAR: &str = "INFISICAL_PROJECT_ID";
pub const INFISICAL_ENVIRONMENT_VAR: &str = "INFISICAL_ENVIRONMENT";
