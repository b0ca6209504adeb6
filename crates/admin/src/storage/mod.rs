//! Object storage for uploaded media.
//!
//! Files are addressed by a key of the form `folder/xxxxxxxx-name.ext`.
//! Keys are built here from sanitized folder and file names, so a backend
//! never sees user-controlled path segments.
//!
//! The storefront serves the local store's directory under `/media`, so a
//! file's public URL is `{media_base_url}/{key}`.

mod local;

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

pub use local::LocalObjectStore;

/// Errors from the object store or upload checks.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("file is {size} bytes, the limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("content type {0} is not allowed here")]
    UnsupportedType(String),

    #[error("file is empty")]
    Empty,
}

/// Byte storage addressed by key.
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing object.
    fn put(&self, key: &str, bytes: &[u8]) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Remove the object. Deleting a missing object is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// What an upload is for. Each kind has its own size and type limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    /// Product and content images.
    #[default]
    Media,
    /// Logo, hero image and favicon.
    Branding,
}

/// Size cap and MIME allowlist for one kind of upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_types: &'static [&'static str],
}

const MB: usize = 1024 * 1024;

const MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/avif",
    "video/mp4",
];

const BRANDING_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/svg+xml",
    "image/x-icon",
];

impl UploadKind {
    #[must_use]
    pub const fn policy(self) -> UploadPolicy {
        match self {
            Self::Media => UploadPolicy {
                max_bytes: 10 * MB,
                allowed_types: MEDIA_TYPES,
            },
            Self::Branding => UploadPolicy {
                max_bytes: 5 * MB,
                allowed_types: BRANDING_TYPES,
            },
        }
    }

    /// Default folder when the request names none.
    #[must_use]
    pub const fn default_folder(self) -> &'static str {
        match self {
            Self::Media => "products",
            Self::Branding => "branding",
        }
    }
}

impl UploadPolicy {
    /// Check an upload's declared type and size.
    ///
    /// # Errors
    ///
    /// Returns the first limit the upload breaks.
    pub fn check(&self, content_type: &str, size: usize) -> Result<(), StorageError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !self.allowed_types.contains(&essence.as_str()) {
            return Err(StorageError::UnsupportedType(essence));
        }
        if size == 0 {
            return Err(StorageError::Empty);
        }
        if size > self.max_bytes {
            return Err(StorageError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

const MAX_SEGMENT_LEN: usize = 80;

/// Reduce a name to lowercase `[a-z0-9._-]`, collapsing runs of anything
/// else into one `-`. Leading dots are dropped so nothing becomes hidden.
fn sanitize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_dash = false;
    for c in raw.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
            if c == '.' && last_dash {
                out.pop();
            }
            out.push(c);
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    let trimmed = out.trim_start_matches('.').trim_end_matches(['-', '.']);
    trimmed.chars().take(MAX_SEGMENT_LEN).collect()
}

/// Sanitize a folder path. Each `/`-separated part is cleaned and `..` or
/// empty parts are dropped. Returns an empty string for the root.
#[must_use]
pub fn sanitize_folder(raw: &str) -> String {
    raw.split(['/', '\\'])
        .filter(|part| !matches!(part.trim(), "" | "." | ".."))
        .map(sanitize_segment)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Sanitize an uploaded file name, keeping its extension.
#[must_use]
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = sanitize_segment(base);
    if cleaned.is_empty() || cleaned.starts_with('.') {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Build a unique key for a new object.
#[must_use]
pub fn object_key(folder: &str, file_name: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    let prefix = &id[..8];
    if folder.is_empty() {
        format!("{prefix}-{file_name}")
    } else {
        format!("{folder}/{prefix}-{file_name}")
    }
}

/// Reject keys that could escape the store root.
///
/// # Errors
///
/// Returns `StorageError::InvalidKey` for empty, absolute or `..` keys.
pub fn check_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|p| p.is_empty() || p == "." || p == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Public URL of an object.
#[must_use]
pub fn public_url(base_url: &str, key: &str) -> String {
    format!("{}/{key}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_limits() {
        let media = UploadKind::Media.policy();
        assert!(media.check("image/png", 1024).is_ok());
        assert!(media.check("IMAGE/JPEG; charset=binary", 1024).is_ok());
        assert!(matches!(
            media.check("application/pdf", 10),
            Err(StorageError::UnsupportedType(_))
        ));
        assert!(matches!(
            media.check("image/png", 11 * MB),
            Err(StorageError::TooLarge { .. })
        ));
        assert!(matches!(media.check("image/png", 0), Err(StorageError::Empty)));

        let branding = UploadKind::Branding.policy();
        assert!(branding.check("image/svg+xml", 100).is_ok());
        assert!(branding.check("image/png", 6 * MB).is_err());
        assert!(branding.check("video/mp4", 100).is_err());
    }

    #[test]
    fn test_sanitize_folder() {
        assert_eq!(sanitize_folder("products/Summer 2025"), "products/summer-2025");
        assert_eq!(sanitize_folder("../../etc"), "etc");
        assert_eq!(sanitize_folder("/a//b/./c/"), "a/b/c");
        assert_eq!(sanitize_folder(""), "");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My Photo (1).JPG"), "my-photo-1.jpg");
        assert_eq!(sanitize_file_name("C:\\Users\\x\\shirt.png"), "shirt.png");
        assert_eq!(sanitize_file_name(".htaccess"), "htaccess");
        assert_eq!(sanitize_file_name("???"), "file");
    }

    #[test]
    fn test_object_key_and_check() {
        let key = object_key("products", "shirt.png");
        assert!(key.starts_with("products/"));
        assert!(key.ends_with("-shirt.png"));
        assert!(check_key(&key).is_ok());
        assert!(check_key(&object_key("", "a.png")).is_ok());

        assert!(check_key("../secret").is_err());
        assert!(check_key("/etc/passwd").is_err());
        assert!(check_key("a//b").is_err());
        assert!(check_key("").is_err());
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("http://localhost:3000/media/", "products/ab-x.png"),
            "http://localhost:3000/media/products/ab-x.png"
        );
    }
}
