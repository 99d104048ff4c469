use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for fleetkey operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fleetkey operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors, reported before any network activity
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Environment variable related errors
    #[error("environment variable '{variable}' error: {message}")]
    Environment { variable: String, message: String },

    /// Secret resolution errors; deliberately carries the provider name
    /// and a generic message, never the raw secret reference
    #[error("secret provider '{provider}': {message}")]
    SecretResolution { provider: String, message: String },

    /// Aggregated resolution-pipeline failures (every matching provider failed)
    #[error("failed to resolve secret reference: {message}")]
    SecretPipeline { message: String },

    /// Provider registration errors (duplicate names, overlapping schemes)
    #[error("provider registration error: {message}")]
    ProviderRegistration { message: String },

    /// Subprocess execution errors
    #[error("{}", format_command_error(.command, .args, .message, .exit_code))]
    CommandExecution {
        command: String,
        args: Vec<String>,
        message: String,
        exit_code: Option<i32>,
    },

    /// Operation timeout errors
    #[error("operation '{operation}' timed out after {}s", .duration.as_secs())]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Network-related errors
    #[error("network error for '{endpoint}': {message}")]
    Network { endpoint: String, message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Host key verification failures (trust engine)
    #[error("host key verification failed for {host}: {message}")]
    HostKey { host: String, message: String },

    /// Remote provisioning failures, fatal for one host only
    #[error("{message}")]
    Remote { host: String, message: String },
}

fn format_command_error(
    command: &str,
    args: &[String],
    message: &str,
    exit_code: &Option<i32>,
) -> String {
    let args_str = args.join(" ");
    match exit_code {
        Some(code) => {
            if args_str.is_empty() {
                format!("command '{command}' failed with exit code {code}: {message}")
            } else {
                format!("command '{command} {args_str}' failed with exit code {code}: {message}")
            }
        }
        None => {
            if args_str.is_empty() {
                format!("command '{command}' failed: {message}")
            } else {
                format!("command '{command} {args_str}' failed: {message}")
            }
        }
    }
}

// Conversion implementations
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create an environment variable error
    #[must_use]
    pub fn environment(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Environment {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Create a secret resolution error
    #[must_use]
    pub fn secret_resolution(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SecretResolution {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an aggregated pipeline error
    #[must_use]
    pub fn secret_pipeline(message: impl Into<String>) -> Self {
        Error::SecretPipeline {
            message: message.into(),
        }
    }

    /// Create a provider registration error
    #[must_use]
    pub fn provider_registration(message: impl Into<String>) -> Self {
        Error::ProviderRegistration {
            message: message.into(),
        }
    }

    /// Create a command execution error
    #[must_use]
    pub fn command_execution(
        command: impl Into<String>,
        args: Vec<String>,
        message: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Error::CommandExecution {
            command: command.into(),
            args,
            message: message.into(),
            exit_code,
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a network error
    #[must_use]
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a host key verification error
    #[must_use]
    pub fn host_key(host: impl Into<String>, message: impl Into<String>) -> Self {
        Error::HostKey {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a remote provisioning error
    #[must_use]
    pub fn remote(host: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Remote {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a subprocess timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_error_names_duration_in_seconds() {
        let err = Error::timeout("bw get password", Duration::from_secs(30));
        assert_eq!(
            err.to_string(),
            "operation 'bw get password' timed out after 30s"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn command_error_includes_args_and_exit_code() {
        let err = Error::command_execution(
            "bws",
            vec!["secret".to_string(), "get".to_string()],
            "no such secret".to_string(),
            Some(1),
        );
        let text = err.to_string();
        assert!(text.contains("bws secret get"));
        assert!(text.contains("exit code 1"));
    }

    #[test]
    fn secret_resolution_error_never_echoes_reference() {
        let err = Error::secret_resolution("bitwarden", "item lookup failed");
        assert_eq!(
            err.to_string(),
            "secret provider 'bitwarden': item lookup failed"
        );
    }
}
