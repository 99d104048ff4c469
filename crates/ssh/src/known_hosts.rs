//! Line-oriented known_hosts store.
//!
//! Reads and appends the standard `hostname-pattern key-type base64-key`
//! format so trust decisions interoperate with other SSH clients sharing the
//! same file. The store is append-only: stale or mismatched keys are never
//! rewritten here; a mismatch is surfaced to the trust engine as a hard
//! failure.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::io::Write;
use std::path::Path;

use fleetkey_core::{Error, Result};

/// Result of looking a host key up in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCheck {
    /// The store has this host with this exact key
    Match,
    /// The store has this host under a different key
    Mismatch,
    /// The store has no entry for this host
    NotFound,
}

#[derive(Debug, Clone)]
struct KnownHostEntry {
    patterns: Vec<String>,
    key_type: String,
    key_blob: Vec<u8>,
}

/// Parsed snapshot of one known_hosts file.
#[derive(Debug, Default)]
pub struct KnownHostsFile {
    entries: Vec<KnownHostEntry>,
}

impl KnownHostsFile {
    /// Load and parse the file; a missing file is an empty store.
    ///
    /// Comment lines, `@`-marker lines (cert-authority, revoked), hashed
    /// `|1|` patterns, and undecodable keys are skipped rather than failed,
    /// so a known_hosts shared with other tooling keeps working.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::file_system(path, "read", e)),
        };
        let mut entries = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('@') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(patterns), Some(key_type), Some(key_b64)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if patterns.starts_with('|') {
                continue;
            }
            let Ok(key_blob) = STANDARD.decode(key_b64) else {
                continue;
            };
            entries.push(KnownHostEntry {
                patterns: patterns.split(',').map(str::to_string).collect(),
                key_type: key_type.to_string(),
                key_blob,
            });
        }
        Ok(Self { entries })
    }

    /// Check a presented host key against the store.
    ///
    /// Any entry for the host whose key differs (in type or material) makes
    /// the verdict `Mismatch`; a host can therefore never be silently
    /// re-keyed through this path.
    #[must_use]
    pub fn check(&self, host: &str, port: u16, key_type: &str, key_blob: &[u8]) -> KeyCheck {
        let wanted = lookup_pattern(host, port);
        let mut seen_host = false;
        for entry in &self.entries {
            if !entry
                .patterns
                .iter()
                .any(|p| p.eq_ignore_ascii_case(&wanted))
            {
                continue;
            }
            seen_host = true;
            if entry.key_type == key_type && entry.key_blob == key_blob {
                return KeyCheck::Match;
            }
        }
        if seen_host {
            KeyCheck::Mismatch
        } else {
            KeyCheck::NotFound
        }
    }

    /// Number of parsed entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The OpenSSH lookup pattern: bare hostname for port 22, `[host]:port`
/// otherwise.
#[must_use]
pub fn lookup_pattern(host: &str, port: u16) -> String {
    if port == 22 {
        host.to_string()
    } else {
        format!("[{host}]:{port}")
    }
}

/// Append one accepted host key to the file, creating it (0600, directory
/// 0700) when absent.
pub fn append_entry(
    path: &Path,
    host: &str,
    port: u16,
    key_type: &str,
    key_blob: &[u8],
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::file_system(parent, "create", e))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700));
            }
        }
    }

    let mut options = std::fs::OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .map_err(|e| Error::file_system(path, "open", e))?;

    let line = format!(
        "{} {} {}\n",
        lookup_pattern(host, port),
        key_type,
        STANDARD.encode(key_blob)
    );
    file.write_all(line.as_bytes())
        .map_err(|e| Error::file_system(path, "append", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &[u8] = b"host key material A";
    const KEY_B: &[u8] = b"host key material B";

    fn store_with(lines: &[String]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();
        (dir, path)
    }

    fn plain_line(pattern: &str, key_type: &str, blob: &[u8]) -> String {
        format!("{pattern} {key_type} {}", STANDARD.encode(blob))
    }

    #[test]
    fn match_mismatch_and_not_found_are_distinguished() {
        let (_dir, path) = store_with(&[plain_line("web-1", "ssh-ed25519", KEY_A)]);
        let store = KnownHostsFile::load(&path).unwrap();

        assert_eq!(store.check("web-1", 22, "ssh-ed25519", KEY_A), KeyCheck::Match);
        assert_eq!(
            store.check("web-1", 22, "ssh-ed25519", KEY_B),
            KeyCheck::Mismatch
        );
        assert_eq!(
            store.check("web-1", 22, "ssh-rsa", KEY_A),
            KeyCheck::Mismatch
        );
        assert_eq!(
            store.check("web-2", 22, "ssh-ed25519", KEY_A),
            KeyCheck::NotFound
        );
    }

    #[test]
    fn non_default_ports_use_bracketed_patterns() {
        let (_dir, path) = store_with(&[plain_line("[web-1]:2222", "ssh-ed25519", KEY_A)]);
        let store = KnownHostsFile::load(&path).unwrap();

        assert_eq!(
            store.check("web-1", 2222, "ssh-ed25519", KEY_A),
            KeyCheck::Match
        );
        // the port-22 lookup uses the bare name and must not see this entry
        assert_eq!(
            store.check("web-1", 22, "ssh-ed25519", KEY_A),
            KeyCheck::NotFound
        );
    }

    #[test]
    fn comma_separated_patterns_all_match() {
        let (_dir, path) = store_with(&[plain_line("web-1,10.0.0.5", "ssh-ed25519", KEY_A)]);
        let store = KnownHostsFile::load(&path).unwrap();
        assert_eq!(
            store.check("10.0.0.5", 22, "ssh-ed25519", KEY_A),
            KeyCheck::Match
        );
    }

    #[test]
    fn foreign_line_shapes_are_skipped_not_fatal() {
        let (_dir, path) = store_with(&[
            "# comment".to_string(),
            "@revoked web-0 ssh-rsa AAAA".to_string(),
            "|1|hash|hash ssh-ed25519 AAAA".to_string(),
            "short-line".to_string(),
            plain_line("web-1", "ssh-ed25519", KEY_A),
        ]);
        let store = KnownHostsFile::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.check("web-1", 22, "ssh-ed25519", KEY_A), KeyCheck::Match);
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = KnownHostsFile::load(&dir.path().join("absent")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn append_then_reload_round_trips_to_a_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh").join("known_hosts");

        append_entry(&path, "web-1", 2222, "ssh-ed25519", KEY_A).unwrap();
        let store = KnownHostsFile::load(&path).unwrap();
        assert_eq!(
            store.check("web-1", 2222, "ssh-ed25519", KEY_A),
            KeyCheck::Match
        );
        assert_eq!(
            store.check("web-1", 2222, "ssh-ed25519", KEY_B),
            KeyCheck::Mismatch
        );
    }

    #[test]
    fn append_preserves_existing_entries() {
        let (_dir, path) = store_with(&[plain_line("web-1", "ssh-ed25519", KEY_A)]);
        append_entry(&path, "web-2", 22, "ssh-rsa", KEY_B).unwrap();
        let store = KnownHostsFile::load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.check("web-1", 22, "ssh-ed25519", KEY_A), KeyCheck::Match);
        assert_eq!(store.check("web-2", 22, "ssh-rsa", KEY_B), KeyCheck::Match);
    }
}
