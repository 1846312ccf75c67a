//! Filename derivation, display names, and destination path claims.
//!
//! The on-disk name comes from the response's Content-Disposition header when it
//! carries one, otherwise from the last segment of the URL path exactly as it
//! appears in the URL. Percent-decoding is only applied to the name shown next to
//! the progress bar.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dashmap::DashSet;
use sha2::{Digest, Sha256};
use url::Url;

use super::constants::DISPLAY_NAME_MAX_CHARS;

/// Marker appended to display names that were cut short.
const ELLIPSIS: &str = "...";

/// Number of hex digits of the URL hash used in fallback names.
const HASH_PREFIX_LEN: usize = 16;

/// Parses Content-Disposition header to extract filename.
///
/// Handles:
/// - `attachment; filename="example.zip"`
/// - `attachment; filename=example.zip`
/// - `attachment; filename*=UTF-8''example.zip` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    // Try filename*= first (RFC 5987 encoded)
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        // Format: charset'language'encoded_value
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            if let Ok(decoded) = urlencoding::decode(encoded[..end].trim()) {
                let decoded = decoded.into_owned();
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + 9..].trim();

    let filename = if let Some(stripped) = value.strip_prefix('"') {
        let end = stripped.find('"')?;
        &stripped[..end]
    } else {
        let end = value.find(';').unwrap_or(value.len());
        value[..end].trim()
    };

    (!filename.is_empty()).then(|| filename.to_string())
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Returns the last URL path segment, still percent-encoded, if it is non-empty.
pub(crate) fn filename_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    (!last.is_empty()).then(|| sanitize_filename(last))
}

/// Stable name for URLs whose path ends in `/` (or has no path at all).
///
/// `download_` followed by the first 16 hex digits of the SHA-256 of the URL, so
/// re-running a batch writes the same file instead of colliding on an empty name.
pub(crate) fn hashed_filename(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut name = String::from("download_");
    for byte in digest.iter().take(HASH_PREFIX_LEN / 2) {
        let _ = write!(name, "{byte:02x}");
    }
    name
}

/// Picks the on-disk filename for a response.
///
/// Content-Disposition wins, then the URL's last path segment, then
/// [`hashed_filename`].
pub(crate) fn resolve_filename(content_disposition: Option<&str>, url: &Url) -> String {
    content_disposition
        .and_then(parse_content_disposition)
        .map(|name| sanitize_filename(&name))
        .or_else(|| filename_from_url(url))
        .unwrap_or_else(|| hashed_filename(url.as_str()))
}

/// Human-readable name for progress output.
///
/// Percent-decodes `filename` and cuts it to 30 characters, the last three of
/// which become `...` when the name is longer.
#[must_use]
pub fn display_name(filename: &str) -> String {
    let readable = urlencoding::decode(filename)
        .map_or_else(|_| filename.to_string(), std::borrow::Cow::into_owned);

    if readable.chars().count() <= DISPLAY_NAME_MAX_CHARS {
        return readable;
    }

    let keep = DISPLAY_NAME_MAX_CHARS - ELLIPSIS.len();
    let mut shortened: String = readable.chars().take(keep).collect();
    shortened.push_str(ELLIPSIS);
    shortened
}

/// Set of destination paths currently being written.
///
/// Cloning shares the underlying set. Two concurrent downloads that derive the
/// same filename get distinct paths: the second one is written as `name_2.ext`,
/// the third as `name_3.ext`, and so on. A path is released as soon as the
/// attempt writing it finishes.
#[derive(Debug, Clone, Default)]
pub struct PathClaims {
    in_flight: Arc<DashSet<PathBuf>>,
}

impl PathClaims {
    /// Creates an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of paths currently claimed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns `true` when no path is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Claims `dir/filename`, or the first free numbered variant of it.
    pub fn claim(&self, dir: &Path, filename: &str) -> PathClaim {
        let (stem, ext) = match filename.rfind('.') {
            Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
            _ => (filename, ""),
        };

        let mut suffix = 1usize;
        loop {
            let candidate = if suffix == 1 {
                dir.join(filename)
            } else {
                dir.join(format!("{stem}_{suffix}{ext}"))
            };
            if self.in_flight.insert(candidate.clone()) {
                return PathClaim {
                    claims: Arc::clone(&self.in_flight),
                    path: candidate,
                };
            }
            suffix += 1;
        }
    }
}

/// A claimed destination path, released on drop.
#[derive(Debug)]
pub struct PathClaim {
    claims: Arc<DashSet<PathBuf>>,
    path: PathBuf,
}

impl PathClaim {
    /// The claimed path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PathClaim {
    fn drop(&mut self) {
        self.claims.remove(&self.path);
    }
}
