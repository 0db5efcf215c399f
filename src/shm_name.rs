// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX shm name normalisation. Both processes must derive the same object
// name from the configured one, so the rules live in one place.

use crate::error::{Error, Result};

/// Maximum length of a POSIX shm name, including the leading '/'.
///
/// On macOS `PSHMNAMLEN` is 31. On Linux the object lives under `/dev/shm`
/// and the limit is `NAME_MAX` (255).
#[cfg(target_os = "macos")]
pub const SHM_NAME_MAX: usize = 31;

#[cfg(not(target_os = "macos"))]
pub const SHM_NAME_MAX: usize = 255;

/// Produce the POSIX form of `name` (exactly one leading '/').
///
/// Unlike a hashing shortener, over-long names are rejected: a producer and a
/// consumer built with different truncation rules would silently miss each
/// other.
pub fn make_shm_name(name: &str) -> Result<String> {
    let invalid = |reason| Error::InvalidName {
        name: name.to_string(),
        reason,
    };

    let body = name.strip_prefix('/').unwrap_or(name);
    if body.is_empty() {
        return Err(invalid("empty"));
    }
    if body.contains('/') {
        return Err(invalid("contains '/' after the leading one"));
    }
    if body.contains('\0') {
        return Err(invalid("contains NUL"));
    }

    let posix = format!("/{body}");
    if posix.len() > SHM_NAME_MAX {
        return Err(invalid("too long"));
    }
    Ok(posix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_slash() {
        assert_eq!(make_shm_name("foo").unwrap(), "/foo");
    }

    #[test]
    fn keeps_existing_slash() {
        assert_eq!(make_shm_name("/bar").unwrap(), "/bar");
    }

    #[test]
    fn rejects_empty() {
        assert!(make_shm_name("").is_err());
        assert!(make_shm_name("/").is_err());
    }

    #[test]
    fn rejects_nested_path() {
        assert!(matches!(
            make_shm_name("/a/b"),
            Err(Error::InvalidName { .. })
        ));
    }

    #[test]
    fn rejects_nul() {
        assert!(make_shm_name("a\0b").is_err());
    }

    #[test]
    fn length_limit_counts_slash() {
        let ok = "x".repeat(SHM_NAME_MAX - 1);
        assert_eq!(make_shm_name(&ok).unwrap().len(), SHM_NAME_MAX);
        let too_long = "x".repeat(SHM_NAME_MAX);
        assert!(make_shm_name(&too_long).is_err());
    }
}
