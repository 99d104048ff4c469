//! Remote provisioning executor.
//!
//! Opens one password-authenticated SSH connection per host, verifies the
//! presented host key through the configured [`HostVerification`], and runs a
//! fixed idempotent shell sequence that appends the public key to the remote
//! account's `authorized_keys` only when an exact line match is absent.
//! Each host is attempted exactly once per run; all resources are released on
//! every exit path.

use ssh2::Session;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use fleetkey_core::{Error, HostAddress, PublicKeyLine, Result, Secret};

use crate::trust::HostVerification;

/// Connection settings shared by every host in a run.
pub struct ClientConfig {
    pub username: String,
    pub password: Secret,
    pub verification: HostVerification,
    pub timeout: Duration,
}

/// The fixed remote sequence. Reads the key line from standard input and
/// appends it only when `grep -qxF` finds no exact match; re-running against
/// an already-provisioned account changes nothing. Line endings are bare
/// `\n` throughout; a carriage return in this text is a packaging defect.
const PROVISION_SCRIPT: &str = "set -eu\n\
umask 077\n\
ssh_dir=\"$HOME/.ssh\"\n\
auth_path=\"$ssh_dir/authorized_keys\"\n\
mkdir -p \"$ssh_dir\"\n\
chmod 700 \"$ssh_dir\"\n\
[ -f \"$auth_path\" ] || : > \"$auth_path\"\n\
chmod 600 \"$auth_path\"\n\
IFS= read -r key_line\n\
key_line=\"$(printf %s \"$key_line\" | tr -d '\\r')\"\n\
[ -n \"$key_line\" ] || { echo \"empty key line on stdin\" >&2; exit 2; }\n\
if grep -qxF \"$key_line\" \"$auth_path\"; then\n\
  echo present\n\
else\n\
  printf '%s\\n' \"$key_line\" >> \"$auth_path\"\n\
  echo added\n\
fi\n";

/// Provision one host: connect, verify, authenticate, run the script.
pub fn provision_host(
    host: &HostAddress,
    key: &PublicKeyLine,
    config: &ClientConfig,
) -> Result<()> {
    let (hostname, port) = host.split();

    let addr = (hostname, port)
        .to_socket_addrs()
        .map_err(|e| Error::remote(host.as_str(), format!("address lookup failed: {e}")))?
        .next()
        .ok_or_else(|| {
            Error::remote(host.as_str(), "address lookup returned no addresses")
        })?;
    let tcp = TcpStream::connect_timeout(&addr, config.timeout)
        .map_err(|e| Error::remote(host.as_str(), format!("connection failed: {e}")))?;
    tcp.set_read_timeout(Some(config.timeout)).ok();
    tcp.set_write_timeout(Some(config.timeout)).ok();

    let mut session = Session::new()
        .map_err(|e| Error::remote(host.as_str(), format!("failed to create session: {e}")))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(config.timeout.as_millis() as u32);
    session
        .handshake()
        .map_err(|e| Error::remote(host.as_str(), format!("handshake failed: {e}")))?;

    let (key_blob, key_kind) = session
        .host_key()
        .ok_or_else(|| Error::remote(host.as_str(), "server presented no host key"))?;
    match &config.verification {
        HostVerification::InsecureAcceptAny => {
            tracing::warn!(host = %host, "host key verification disabled, accepting any key");
        }
        HostVerification::Tofu(verifier) => {
            verifier.verify(hostname, port, host_key_type_name(key_kind), key_blob)?;
        }
    }

    session
        .userauth_password(&config.username, config.password.expose())
        .map_err(|e| Error::remote(host.as_str(), format!("authentication failed: {e}")))?;
    if !session.authenticated() {
        return Err(Error::remote(host.as_str(), "authentication failed"));
    }

    let mut channel = session
        .channel_session()
        .map_err(|e| Error::remote(host.as_str(), format!("failed to open channel: {e}")))?;
    channel
        .exec(PROVISION_SCRIPT)
        .map_err(|e| Error::remote(host.as_str(), format!("failed to start script: {e}")))?;

    channel
        .write_all(format!("{}\n", key.as_line()).as_bytes())
        .map_err(|e| Error::remote(host.as_str(), format!("failed to send key line: {e}")))?;
    channel
        .send_eof()
        .map_err(|e| Error::remote(host.as_str(), format!("failed to close stdin: {e}")))?;

    let mut stdout = String::new();
    channel.read_to_string(&mut stdout).ok();
    let mut stderr = String::new();
    channel.stderr().read_to_string(&mut stderr).ok();

    channel
        .wait_close()
        .map_err(|e| Error::remote(host.as_str(), format!("channel close failed: {e}")))?;
    let status = channel
        .exit_status()
        .map_err(|e| Error::remote(host.as_str(), format!("no exit status: {e}")))?;

    if status != 0 {
        let combined = format!("{stdout}{stderr}");
        return Err(exit_error(host, status, &combined));
    }

    tracing::debug!(host = %host, result = %stdout.trim(), "provisioning script finished");
    Ok(())
}

/// Build the error for a non-zero remote exit.
///
/// Output produced by the remote process is appended trimmed; when there was
/// none, the bare status error is returned with no fabricated suffix.
fn exit_error(host: &HostAddress, status: i32, combined_output: &str) -> Error {
    let output = combined_output.trim();
    let base = format!("remote provisioning script exited with status {status}");
    if output.is_empty() {
        Error::remote(host.as_str(), base)
    } else {
        Error::remote(host.as_str(), format!("{base}: {output}"))
    }
}

fn host_key_type_name(kind: ssh2::HostKeyType) -> &'static str {
    match kind {
        ssh2::HostKeyType::Rsa => "ssh-rsa",
        ssh2::HostKeyType::Dss => "ssh-dss",
        ssh2::HostKeyType::Ecdsa256 => "ecdsa-sha2-nistp256",
        ssh2::HostKeyType::Ecdsa384 => "ecdsa-sha2-nistp384",
        ssh2::HostKeyType::Ecdsa521 => "ecdsa-sha2-nistp521",
        ssh2::HostKeyType::Ed25519 => "ssh-ed25519",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_contains_no_carriage_returns() {
        assert!(!PROVISION_SCRIPT.contains('\r'));
    }

    #[test]
    fn script_appends_only_on_missing_exact_match() {
        assert!(PROVISION_SCRIPT.contains("grep -qxF"));
        assert!(PROVISION_SCRIPT.contains(">> \"$auth_path\""));
        assert!(PROVISION_SCRIPT.contains("chmod 700"));
        assert!(PROVISION_SCRIPT.contains("chmod 600"));
    }

    #[test]
    fn empty_remote_output_gets_no_fabricated_suffix() {
        let host = HostAddress::new("web-1:22");
        let err = exit_error(&host, 2, "   \n");
        let text = err.to_string();
        assert_eq!(text, "remote provisioning script exited with status 2");
        assert!(!text.ends_with(": "));
    }

    #[test]
    fn remote_output_is_appended_trimmed() {
        let host = HostAddress::new("web-1:22");
        let err = exit_error(&host, 2, "\nempty key line on stdin\n");
        assert_eq!(
            err.to_string(),
            "remote provisioning script exited with status 2: empty key line on stdin"
        );
    }
}
