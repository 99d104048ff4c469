//! Trust-on-first-use host-key verification.
//!
//! Per connection the engine consults the known_hosts lookup first. A match
//! succeeds immediately; a host present under a different key fails
//! immediately and never reaches the trust prompt; only a host entirely
//! absent from the store triggers the interactive prompt. An accepted key is
//! appended and the in-memory lookup rebuilt from the file, so a second
//! connection to the same host within the same run succeeds silently.
//!
//! The whole check-prompt-append-reload sequence runs under one mutex scoped
//! to the trust-store path; concurrent per-host connections cannot interleave
//! appends or observe a half-updated store.

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

use fleetkey_core::types::sha256_fingerprint;
use fleetkey_core::{Error, Interact, Result};

use crate::known_hosts::{append_entry, lookup_pattern, KeyCheck, KnownHostsFile};

/// How presented host keys are verified.
pub enum HostVerification {
    /// Explicit override accepting any key. A distinct code path selected
    /// only by configuration, never a fallback on trust-store errors.
    InsecureAcceptAny,
    /// The TOFU engine backed by a known_hosts file.
    Tofu(Arc<HostKeyVerifier>),
}

/// TOFU verification state for one trust-store path.
pub struct HostKeyVerifier {
    path: PathBuf,
    state: Mutex<KnownHostsFile>,
    interact: Arc<dyn Interact>,
}

impl HostKeyVerifier {
    /// Construct a verifier over the given known_hosts path.
    pub fn new(path: impl Into<PathBuf>, interact: Arc<dyn Interact>) -> Result<Self> {
        let path = path.into();
        let state = KnownHostsFile::load(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(state),
            interact,
        })
    }

    /// Verify a presented host key, prompting on first contact.
    pub fn verify(&self, host: &str, port: u16, key_type: &str, key_blob: &[u8]) -> Result<()> {
        let address = lookup_pattern(host, port);
        let mut state = self.state.lock();

        match state.check(host, port, key_type, key_blob) {
            KeyCheck::Match => {
                tracing::debug!(host = %address, "host key matches known_hosts");
                Ok(())
            }
            KeyCheck::Mismatch => Err(Error::host_key(
                address,
                format!(
                    "known key for this host differs from the presented {key_type} key ({}); \
                     possible key swap, refusing to connect",
                    sha256_fingerprint(key_blob)
                ),
            )),
            KeyCheck::NotFound => {
                if !self.interact.is_interactive() {
                    return Err(Error::host_key(
                        address,
                        format!(
                            "unknown host in a non-interactive session; add its key to {} \
                             out of band or rerun with --insecure",
                            self.path.display()
                        ),
                    ));
                }
                let fingerprint = sha256_fingerprint(key_blob);
                self.interact.info(&format!(
                    "The authenticity of host '{address}' can't be established."
                ));
                self.interact
                    .info(&format!("{key_type} key fingerprint is {fingerprint}."));
                let answer = self
                    .interact
                    .prompt_line("Are you sure you want to continue connecting (yes/no)? ")?;
                if !answer.trim().eq_ignore_ascii_case("yes") {
                    return Err(Error::host_key(address, "host key rejected by operator"));
                }

                append_entry(&self.path, host, port, key_type, key_blob)?;
                *state = KnownHostsFile::load(&self.path)?;
                tracing::info!(host = %address, %fingerprint, "host key accepted and persisted");
                self.interact.info(&format!(
                    "Warning: Permanently added '{address}' ({key_type}) to the list of known hosts."
                ));
                Ok(())
            }
        }
    }

    /// The trust-store path this verifier guards
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}
