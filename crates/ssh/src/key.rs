//! Public key source resolution.
//!
//! The configured key may arrive inline or as a file path. Either way the
//! input must contain exactly one non-comment, non-blank logical line;
//! multiple candidate lines is a fatal input error, never a silent
//! "first wins".

use std::path::Path;

use fleetkey_core::{Error, PublicKeyLine, Result};

/// Resolve the single public key line from the configured source.
pub fn resolve_public_key(inline: Option<&str>, file: Option<&Path>) -> Result<PublicKeyLine> {
    let text = match (inline, file) {
        (Some(_), Some(_)) => {
            return Err(Error::configuration(
                "both an inline public key and a key file were provided; pick one",
            ));
        }
        (Some(text), None) => text.to_string(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).map_err(|e| Error::file_system(path, "read", e))?
        }
        (None, None) => {
            return Err(Error::configuration(
                "no public key provided; use --key or --key-file",
            ));
        }
    };
    extract_single_key_line(&text)
}

/// Pull exactly one key line out of the text, ignoring blanks and comments.
fn extract_single_key_line(text: &str) -> Result<PublicKeyLine> {
    let mut candidate: Option<&str> = None;
    let mut count = 0usize;
    for line in text.lines() {
        let line = line.trim_end_matches('\r').trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        count += 1;
        candidate.get_or_insert(line);
    }
    match count {
        0 => Err(Error::configuration(
            "public key input contains no key line",
        )),
        1 => PublicKeyLine::parse(candidate.unwrap_or_default()),
        n => Err(Error::configuration(format!(
            "public key input must contain exactly one key line, found {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BLOB: &str = "ZmxlZXRrZXkgdGVzdCBrZXk=";

    #[test]
    fn single_line_with_comments_and_blanks_succeeds() {
        let text = format!("# provisioning key\n\n  ssh-ed25519 {BLOB} ops@bastion  \n\n");
        let key = resolve_public_key(Some(&text), None).unwrap();
        assert_eq!(key.as_line(), format!("ssh-ed25519 {BLOB} ops@bastion"));
    }

    #[test]
    fn two_key_lines_are_fatal() {
        let text = format!("ssh-ed25519 {BLOB} a\nssh-ed25519 {BLOB} b\n");
        let err = resolve_public_key(Some(&text), None).unwrap_err();
        assert!(err.to_string().contains("exactly one key line"));
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn comment_only_input_is_fatal() {
        let err = resolve_public_key(Some("# nothing here\n"), None).unwrap_err();
        assert!(err.to_string().contains("no key line"));
    }

    #[test]
    fn crlf_input_is_tolerated() {
        let text = format!("ssh-ed25519 {BLOB} ops@bastion\r\n");
        let key = resolve_public_key(Some(&text), None).unwrap();
        assert!(!key.as_line().contains('\r'));
    }

    #[test]
    fn file_source_is_read_and_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ssh-ed25519 {BLOB} ops@bastion").unwrap();
        let key = resolve_public_key(None, Some(file.path())).unwrap();
        assert_eq!(key.key_type(), "ssh-ed25519");
    }

    #[test]
    fn conflicting_sources_are_rejected() {
        let err = resolve_public_key(Some("x"), Some(Path::new("/tmp/k.pub"))).unwrap_err();
        assert!(err.to_string().contains("pick one"));
    }

    #[test]
    fn missing_source_is_rejected() {
        let err = resolve_public_key(None, None).unwrap_err();
        assert!(err.to_string().contains("no public key"));
    }
}
