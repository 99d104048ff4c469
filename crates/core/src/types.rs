use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Error, Result};

/// A normalized `host:port` address.
///
/// Always carries an explicit, validated port; IPv6 literals are
/// bracket-normalized. Constructed by the host list resolver, which owns the
/// normalization rules. Ordering is plain lexicographic ordering of the
/// normalized string, which is the contract for run order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostAddress(String);

impl HostAddress {
    /// Wrap an already-normalized `host:port` string
    #[must_use]
    pub fn new(normalized: impl Into<String>) -> Self {
        Self(normalized.into())
    }

    /// Get the address as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into the host part and the port part.
    ///
    /// The port separator is the final `:`; brackets around an IPv6 host are
    /// stripped from the returned host part.
    #[must_use]
    pub fn split(&self) -> (&str, u16) {
        let idx = self.0.rfind(':').unwrap_or(0);
        let host = self.0[..idx].trim_start_matches('[').trim_end_matches(']');
        let port = self.0[idx + 1..].parse().unwrap_or(0);
        (host, port)
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved plaintext credential with secure handling.
///
/// The inner value is zeroized on drop and is never printed by `Debug`;
/// callers reach the plaintext only through [`Secret::expose`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Wrap a plaintext value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the plaintext value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the value is empty after trimming
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Exactly one validated `authorized_keys`-format line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyLine {
    line: String,
    key_type: String,
    blob: Vec<u8>,
}

impl PublicKeyLine {
    /// Parse a single key line of the form `<type> <base64-blob> [comment]`.
    ///
    /// Surrounding whitespace is trimmed; the base64 blob must decode.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        let key_type = tokens
            .next()
            .ok_or_else(|| Error::configuration("public key line is empty"))?;
        let blob_b64 = tokens.next().ok_or_else(|| {
            Error::configuration(format!(
                "public key line is missing its base64 key material (got only '{key_type}')"
            ))
        })?;
        let blob = STANDARD.decode(blob_b64).map_err(|e| {
            Error::configuration(format!("public key material is not valid base64: {e}"))
        })?;
        Ok(Self {
            line: line.to_string(),
            key_type: key_type.to_string(),
            blob,
        })
    }

    /// The full trimmed key line
    #[must_use]
    pub fn as_line(&self) -> &str {
        &self.line
    }

    /// The key algorithm token, e.g. `ssh-ed25519`
    #[must_use]
    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    /// OpenSSH-style `SHA256:` fingerprint of the key material
    #[must_use]
    pub fn sha256_fingerprint(&self) -> String {
        sha256_fingerprint(&self.blob)
    }
}

impl fmt::Display for PublicKeyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line)
    }
}

/// OpenSSH-style `SHA256:` fingerprint of raw key material
#[must_use]
pub fn sha256_fingerprint(blob: &[u8]) -> String {
    let digest = Sha256::digest(blob);
    format!("SHA256:{}", STANDARD_NO_PAD.encode(digest))
}

/// Per-host result of one provisioning attempt.
///
/// Created when a host's attempt completes, consumed by the recap printer.
#[derive(Debug)]
pub struct HostRunOutcome {
    pub host: HostAddress,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl HostRunOutcome {
    /// Record a successful attempt
    #[must_use]
    pub fn ok(host: HostAddress, elapsed: Duration) -> Self {
        Self {
            host,
            elapsed,
            error: None,
        }
    }

    /// Record a failed attempt
    #[must_use]
    pub fn failed(host: HostAddress, elapsed: Duration, message: impl Into<String>) -> Self {
        Self {
            host,
            elapsed,
            error: Some(message.into()),
        }
    }

    /// Whether the attempt succeeded
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Interactive I/O abstraction consumed by the trust engine.
///
/// The CLI provides a terminal-backed implementation; tests substitute
/// scripted ones.
pub trait Interact: Send + Sync {
    /// Prompt the operator and read one line of input
    fn prompt_line(&self, prompt: &str) -> Result<String>;

    /// Print an informational line
    fn info(&self, line: &str);

    /// Whether an interactive terminal is attached
    fn is_interactive(&self) -> bool;
}
