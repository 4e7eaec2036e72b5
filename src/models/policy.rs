//! Bucket access levels and the canned policy documents behind them.
//!
//! A bucket policy is an opaque JSON document on the server. The console only
//! understands three canned shapes; anything else is kept verbatim as
//! [`AccessLevel::Custom`].

use crate::errors::{StorageError, StorageResult};
use serde::Deserialize;
use serde_json::json;
use std::fmt;

const ACTION_GET: &str = "s3:GetObject";
const ACTION_PUT: &str = "s3:PutObject";
const ACTION_DELETE: &str = "s3:DeleteObject";
const ACTION_ALL: &str = "s3:*";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessLevel {
    /// No policy attached.
    Private,
    /// Anonymous `s3:GetObject`.
    PublicRead,
    /// Anonymous get, put and delete.
    PublicReadWrite,
    /// A parseable policy that matches neither canned shape.
    Custom(String),
}

#[derive(Deserialize)]
struct PolicyDocument {
    #[serde(rename = "Statement", default)]
    statement: OneOrMany<Statement>,
}

#[derive(Deserialize)]
struct Statement {
    #[serde(rename = "Effect", default)]
    effect: Option<String>,
    #[serde(rename = "Action", default)]
    action: OneOrMany<String>,
}

/// IAM documents allow both `"Action": "s3:GetObject"` and a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item).iter(),
            OneOrMany::Many(items) => items.iter(),
        }
    }
}

impl AccessLevel {
    /// Classify a policy document as returned by the server.
    ///
    /// Empty and unparseable documents both count as private. JSON that is
    /// not a policy object is kept verbatim as custom.
    pub fn parse(document: &str) -> AccessLevel {
        if document.trim().is_empty() {
            return AccessLevel::Private;
        }
        let Ok(parsed) = serde_json::from_str::<PolicyDocument>(document) else {
            return match serde_json::from_str::<serde_json::Value>(document) {
                Ok(_) => AccessLevel::Custom(document.to_string()),
                Err(_) => AccessLevel::Private,
            };
        };

        let actions: Vec<&str> = parsed
            .statement
            .iter()
            .filter(|s| {
                s.effect
                    .as_deref()
                    .is_none_or(|e| e.eq_ignore_ascii_case("allow"))
            })
            .flat_map(|s| s.action.iter().map(String::as_str))
            .collect();

        if actions
            .iter()
            .any(|a| matches!(*a, ACTION_PUT | ACTION_DELETE | ACTION_ALL))
        {
            AccessLevel::PublicReadWrite
        } else if actions.contains(&ACTION_GET) {
            AccessLevel::PublicRead
        } else {
            AccessLevel::Custom(document.to_string())
        }
    }

    /// Parse one of the settable level names (`private`, `public-read`,
    /// `public-read-write`).
    pub fn from_canned_name(name: &str) -> StorageResult<AccessLevel> {
        match name {
            "private" => Ok(AccessLevel::Private),
            "public-read" => Ok(AccessLevel::PublicRead),
            "public-read-write" => Ok(AccessLevel::PublicReadWrite),
            other => Err(StorageError::Validation(format!(
                "unknown access level `{other}`; expected private, public-read or public-read-write"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AccessLevel::Private => "private",
            AccessLevel::PublicRead => "public-read",
            AccessLevel::PublicReadWrite => "public-read-write",
            AccessLevel::Custom(_) => "custom",
        }
    }

    /// The full document to store for `bucket`. Private is the empty string,
    /// which clears the policy.
    pub fn to_policy(&self, bucket: &str) -> String {
        match self {
            AccessLevel::Private => String::new(),
            AccessLevel::PublicRead => canned_policy(bucket, &[ACTION_GET]),
            AccessLevel::PublicReadWrite => {
                canned_policy(bucket, &[ACTION_GET, ACTION_PUT, ACTION_DELETE])
            }
            AccessLevel::Custom(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn canned_policy(bucket: &str, actions: &[&str]) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "AWS": ["*"] },
            "Action": actions,
            "Resource": [format!("arn:aws:s3:::{bucket}/*")]
        }]
    })
    .to_string()
}
