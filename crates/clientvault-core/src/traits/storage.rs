//! Object storage trait for pluggable, prefix-addressed byte stores.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// RFC 5987 `attr-char`: everything else is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// How a signed download URL asks the browser to present the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Render in the browser (preview).
    Inline,
    /// Save to disk under the display name.
    Attachment,
}

impl Disposition {
    /// Build a `Content-Disposition` header value for the given display name.
    ///
    /// Non-ASCII names get an ASCII `filename` fallback plus the UTF-8
    /// `filename*` parameter.
    pub fn header_value(&self, file_name: &str) -> String {
        let fallback: String = file_name
            .chars()
            .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
            .collect();
        let escaped = fallback.replace('\\', "\\\\").replace('"', "\\\"");
        let mut value = format!("{self}; filename=\"{escaped}\"");
        if !file_name.is_ascii() {
            value.push_str("; filename*=UTF-8''");
            value.extend(utf8_percent_encode(file_name, ATTR_CHAR));
        }
        value
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Attachment => write!(f, "attachment"),
        }
    }
}

/// Trait for flat, key-addressed object stores.
///
/// Every call is independent: implementations are correct per call but
/// nothing is atomic across several keys. Object stores have no folders,
/// so there is no rename-directory primitive; callers relocate objects
/// one key at a time with [`copy`](ObjectStore::copy) and
/// [`delete`](ObjectStore::delete).
///
/// Implementations must report a missing source key on `copy` with
/// [`ErrorKind::NotFound`](crate::error::ErrorKind::NotFound) and must
/// treat `delete` of a missing key as success.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3", "memory").
    fn provider_type(&self) -> &str;

    /// Store `data` under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()>;

    /// Copy the object at `from` to `to`.
    async fn copy(&self, from: &str, to: &str) -> AppResult<()>;

    /// Delete the object at `key`.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether an object exists at `key`.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Issue a time-limited URL for reading the object at `key`.
    async fn signed_url(
        &self,
        key: &str,
        disposition: Disposition,
        file_name: &str,
        ttl: Duration,
    ) -> AppResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value_escapes_quotes() {
        assert_eq!(
            Disposition::Attachment.header_value("Q3 \"final\".pdf"),
            "attachment; filename=\"Q3 \\\"final\\\".pdf\""
        );
        assert_eq!(
            Disposition::Inline.header_value("scan.png"),
            "inline; filename=\"scan.png\""
        );
    }

    #[test]
    fn test_header_value_encodes_non_ascii_names() {
        assert_eq!(
            Disposition::Attachment.header_value("Überweisung 2023.pdf"),
            "attachment; filename=\"_berweisung 2023.pdf\"; \
             filename*=UTF-8''%C3%9Cberweisung%202023.pdf"
        );
    }
}
