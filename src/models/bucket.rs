//! Represents a logical bucket — a top-level container for objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bucket as reported by the storage server.
///
/// Names are unique per server and follow DNS naming rules; the creation date
/// is optional because some S3-compatible servers omit it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
}
