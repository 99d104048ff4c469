//! Host list resolution.
//!
//! Merges the three host sources (single host, comma list, file) into one
//! deduplicated, lexicographically sorted list of normalized `host:port`
//! addresses. The sort order, not insertion order, is the contract: it gives
//! every run a deterministic host sequence.

use std::collections::BTreeSet;
use std::path::Path;

use fleetkey_core::{Error, HostAddress, Result};

/// Normalize one host entry to `host:port`.
///
/// An explicit port is validated (1-65535); otherwise `default_port` is
/// applied. Bracketed IPv6 literals are handled in both forms, and a bare
/// IPv6 literal (more than one `:`, no brackets) is wrapped. Normalization is
/// idempotent: feeding the output back in returns the same string.
pub fn normalize_host(entry: &str, default_port: u16) -> Result<HostAddress> {
    let entry = entry.trim();
    if entry.is_empty() {
        return Err(Error::configuration("empty host entry"));
    }

    if let Some(rest) = entry.strip_prefix('[') {
        let (inner, after) = rest
            .split_once(']')
            .ok_or_else(|| Error::configuration(format!("unclosed '[' in host entry '{entry}'")))?;
        if inner.is_empty() {
            return Err(Error::configuration(format!("empty host in entry '{entry}'")));
        }
        let port = match after {
            "" => default_port,
            _ => match after.strip_prefix(':') {
                Some(port_str) => parse_port(port_str, entry)?,
                None => {
                    return Err(Error::configuration(format!(
                        "unexpected text after ']' in host entry '{entry}'"
                    )));
                }
            },
        };
        return Ok(HostAddress::new(format!("[{inner}]:{port}")));
    }

    match entry.matches(':').count() {
        0 => Ok(HostAddress::new(format!("{entry}:{default_port}"))),
        1 => {
            let (host, port_str) = entry.split_once(':').unwrap_or((entry, ""));
            if host.is_empty() {
                return Err(Error::configuration(format!("empty host in entry '{entry}'")));
            }
            let port = parse_port(port_str, entry)?;
            Ok(HostAddress::new(format!("{host}:{port}")))
        }
        // a bare IPv6 literal without a port
        _ => Ok(HostAddress::new(format!("[{entry}]:{default_port}"))),
    }
}

fn parse_port(port_str: &str, entry: &str) -> Result<u16> {
    let port: u16 = port_str.parse().map_err(|_| {
        Error::configuration(format!("invalid port '{port_str}' in host entry '{entry}'"))
    })?;
    if port == 0 {
        return Err(Error::configuration(format!(
            "invalid port '0' in host entry '{entry}'"
        )));
    }
    Ok(port)
}

/// Merge all host sources into a deduplicated, sorted host list.
///
/// `hosts_file` is one entry per line; blank lines and `#` comments are
/// ignored. Resolving zero hosts across every source is a fatal
/// configuration error.
pub fn resolve_hosts(
    host: Option<&str>,
    host_list: Option<&str>,
    hosts_file: Option<&Path>,
    default_port: u16,
) -> Result<Vec<HostAddress>> {
    let mut resolved: BTreeSet<HostAddress> = BTreeSet::new();

    if let Some(single) = host {
        if !single.trim().is_empty() {
            resolved.insert(normalize_host(single, default_port)?);
        }
    }

    if let Some(list) = host_list {
        for entry in list.split(',') {
            if entry.trim().is_empty() {
                continue;
            }
            resolved.insert(normalize_host(entry, default_port)?);
        }
    }

    if let Some(path) = hosts_file {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read", e))?;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            resolved.insert(normalize_host(line, default_port)?);
        }
    }

    if resolved.is_empty() {
        return Err(Error::configuration(
            "no hosts resolved; provide --host, --hosts, or --hosts-file",
        ));
    }

    Ok(resolved.into_iter().collect())
}
