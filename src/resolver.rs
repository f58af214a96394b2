//! Confines untrusted path strings to a trusted root directory.
//!
//! [`resolve`] is the only resolver request handlers should use. It decodes
//! the input once, collapses it lexically against the root and then checks the
//! result against the root with a separator-qualified prefix test. Nothing here
//! touches the filesystem, so it is safe to call from any number of tasks.
//!
//! [`resolve_unchecked`] is the broken version kept for side-by-side teaching.

use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{is_separator, Component, Path, PathBuf, MAIN_SEPARATOR_STR};

use percent_encoding::percent_decode_str;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("path traversal detected")]
    TraversalDetected,
}

/// Resolve `input` against `root`, returning an absolute path that is either
/// `root` itself or one of its descendants.
///
/// `root` must be absolute. It is expected to be canonical already (see
/// [`crate::config::prepare_root`]); symlinks below it are not followed here.
pub fn resolve(root: &Path, input: &str) -> Result<PathBuf, ResolveError> {
    if input.contains('\0') {
        return Err(ResolveError::InvalidInput("null byte not allowed"));
    }
    let decoded = percent_decode(input)?;
    if decoded.contains('\0') {
        return Err(ResolveError::InvalidInput("null byte not allowed"));
    }

    let root: PathBuf = root.components().collect();
    let candidate = normalize(&root, &decoded);
    if !is_within(&root, &candidate) {
        return Err(ResolveError::TraversalDetected);
    }
    Ok(candidate)
}

/// Strict single-pass percent decoding.
///
/// Every `%` must be followed by two hex digits and the decoded bytes must be
/// UTF-8. Anything else is rejected rather than passed through raw.
pub fn percent_decode(input: &str) -> Result<Cow<'_, str>, ResolveError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes
                .get(i + 1..i + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !well_formed {
                return Err(ResolveError::InvalidInput("malformed percent-encoding"));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    percent_decode_str(input)
        .decode_utf8()
        .map_err(|_| ResolveError::InvalidInput("percent-encoding is not valid utf-8"))
}

/// Join `relative` onto `root` and collapse `.`, `..` and repeated separators
/// the way the OS would, without consulting the filesystem.
///
/// A leading separator restarts from the filesystem root, and `..` at the
/// filesystem root stays there.
pub fn normalize(root: &Path, relative: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Prefix(prefix) => out = PathBuf::from(prefix.as_os_str()),
            Component::RootDir => {
                let mut base: PathBuf = out
                    .components()
                    .take_while(|c| matches!(c, Component::Prefix(_)))
                    .collect();
                base.push(Component::RootDir.as_os_str());
                out = base;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// True when `candidate` equals `root` or starts with `root` followed by a
/// separator. A bare prefix test would admit `/files-other` under `/files`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    let root = root.as_os_str().as_encoded_bytes();
    let candidate = candidate.as_os_str().as_encoded_bytes();
    if candidate == root {
        return true;
    }
    if !candidate.starts_with(root) {
        return false;
    }
    // only the filesystem root itself ends in a separator after normalization
    if root.last().is_some_and(|b| is_separator(*b as char)) {
        return true;
    }
    candidate
        .get(root.len())
        .is_some_and(|b| is_separator(*b as char))
}

/// UNSAFE: plain string concatenation of root and raw input.
///
/// No decoding, no normalization and no boundary check. `../` segments survive
/// into the returned path and the OS follows them when the path is opened.
/// Only the opt-in demo route calls this.
pub fn resolve_unchecked(root: &Path, raw: &str) -> PathBuf {
    let mut joined = OsString::from(root.as_os_str());
    joined.push(MAIN_SEPARATOR_STR);
    joined.push(raw);
    PathBuf::from(joined)
}
