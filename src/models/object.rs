//! Represents an object (file) stored in a bucket, and the entries a listing
//! is made of.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::{fmt, io};

/// Metadata of a single object. The content bytes live on the server.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    /// Full "/"-delimited path within the bucket.
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Zero-byte keys ending in "/" stand in for folders on a flat keyspace.
    pub fn is_folder_placeholder(&self) -> bool {
        self.key.ends_with('/') && self.size == 0
    }

    pub fn file_name(&self) -> &str {
        file_name(&self.key)
    }
}

/// One line of a listing: a real object or a common prefix ("folder").
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ListEntry {
    Object(ObjectInfo),
    Prefix { prefix: String },
}

impl ListEntry {
    pub fn object(&self) -> Option<&ObjectInfo> {
        match self {
            ListEntry::Object(info) => Some(info),
            ListEntry::Prefix { .. } => None,
        }
    }
}

/// A downloadable object: its metadata plus the body as a byte stream.
pub struct ObjectBody {
    pub info: ObjectInfo,
    pub stream: BoxStream<'static, io::Result<Bytes>>,
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Last path segment of a key (`photos/2025/img.jpg` -> `img.jpg`).
pub fn file_name(key: &str) -> &str {
    key.trim_end_matches('/').rsplit('/').next().unwrap_or(key)
}
