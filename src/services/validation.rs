//! Input checks applied before a request reaches the storage server.

use crate::errors::{StorageError, StorageResult};

pub const MAX_OBJECT_KEY_LEN: usize = 1024;
const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;
/// SigV4 presigned URLs cannot outlive seven days.
pub const MAX_PRESIGN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Reject empty, oversized or control-character keys, and keys with `.` or
/// `..` segments.
///
/// S3 itself accepts almost anything; these are the keys that cannot travel
/// through a URL path or a `Content-Disposition` header intact.
pub fn ensure_key_safe(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::Validation("object key must not be empty".into()));
    }
    if key.len() > MAX_OBJECT_KEY_LEN {
        return Err(StorageError::Validation(format!(
            "object key exceeds {MAX_OBJECT_KEY_LEN} bytes"
        )));
    }
    if key.chars().any(|c| c.is_control()) {
        return Err(StorageError::Validation(
            "object key must not contain control characters".into(),
        ));
    }
    if key.split('/').any(|segment| matches!(segment, "." | "..")) {
        return Err(StorageError::Validation(format!(
            "object key `{key}` must not contain `.` or `..` segments"
        )));
    }
    Ok(())
}

/// Validate bucket name format.
///
/// Enforces S3 naming rules:
/// - 3–63 characters
/// - lowercase letters, digits, dots, hyphens only
/// - cannot start/end with dot or hyphen
/// - cannot contain consecutive dots or dot-hyphen patterns
/// - cannot look like an IPv4 address
pub fn ensure_bucket_name_safe(name: &str) -> StorageResult<()> {
    let invalid = |reason: &str| {
        Err(StorageError::Validation(format!(
            "bucket `{name}` invalid: {reason}"
        )))
    };

    let len = name.len();
    if !(BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&len) {
        return invalid("must be between 3 and 63 characters");
    }

    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        return invalid("allowed characters are lowercase letters, digits, dots, and hyphens");
    }

    if name.starts_with('.') || name.ends_with('.') || name.starts_with('-') || name.ends_with('-')
    {
        return invalid("must start and end with a lowercase letter or digit");
    }

    if name.contains("..") || name.contains("-.") || name.contains(".-") {
        return invalid("cannot contain consecutive dots or dot-hyphen combinations");
    }

    if is_ipv4_like(name) {
        return invalid("must not be formatted like an IP address");
    }

    Ok(())
}

/// Regions are free-form on S3-compatible servers; only the shape is checked.
pub fn ensure_region_valid(region: &str) -> StorageResult<()> {
    if !region.is_empty()
        && region
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-'))
    {
        Ok(())
    } else {
        Err(StorageError::Validation(format!(
            "region `{region}` is not valid"
        )))
    }
}

pub fn ensure_presign_ttl(ttl_secs: u64) -> StorageResult<()> {
    if (1..=MAX_PRESIGN_TTL_SECS).contains(&ttl_secs) {
        Ok(())
    } else {
        Err(StorageError::Validation(format!(
            "expiry must be between 1 and {MAX_PRESIGN_TTL_SECS} seconds"
        )))
    }
}

/// Check if a string matches IPv4-like dotted decimal form.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|segment| {
            !segment.is_empty()
                && segment.len() <= 3
                && segment.chars().all(|c| c.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}
