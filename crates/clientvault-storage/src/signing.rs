//! Signed download URLs for stores that cannot presign on their own.
//!
//! A URL carries the object key, an expiry timestamp, the disposition,
//! and the display name. The signature is an HMAC-SHA256 tag over those
//! fields, encoded as URL-safe base64.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use ring::hmac;

use clientvault_core::error::AppError;
use clientvault_core::result::AppResult;
use clientvault_core::traits::Disposition;

/// Issues and checks signed object URLs.
#[derive(Clone)]
pub struct UrlSigner {
    base_url: String,
    key: hmac::Key,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .field("secret", &"****")
            .finish()
    }
}

/// The fields recovered from a valid signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedGrant {
    /// Object key.
    pub key: String,
    /// Requested disposition.
    pub disposition: Disposition,
    /// Display name for the download.
    pub file_name: String,
}

impl UrlSigner {
    /// Create a signer for objects served under `base_url`.
    pub fn new(base_url: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_ref()),
        }
    }

    /// Build a URL valid until `now + ttl`.
    pub fn sign(
        &self,
        key: &str,
        disposition: Disposition,
        file_name: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| AppError::validation("Signed URL lifetime is out of range"))?;
        let expires = (now + ttl).timestamp();
        let name = URL_SAFE_NO_PAD.encode(file_name.as_bytes());
        let tag = hmac::sign(&self.key, &signed_message(key, expires, disposition, &name));
        let signature = URL_SAFE_NO_PAD.encode(tag.as_ref());
        Ok(format!(
            "{}/{}?expires={expires}&disposition={disposition}&name={name}&signature={signature}",
            self.base_url,
            key.trim_start_matches('/'),
        ))
    }

    /// Check a signed URL's query fields. Fails for tampered or expired grants.
    pub fn verify(
        &self,
        key: &str,
        expires: i64,
        disposition: &str,
        name: &str,
        signature: &str,
        now: DateTime<Utc>,
    ) -> AppResult<SignedGrant> {
        let disposition = match disposition {
            "inline" => Disposition::Inline,
            "attachment" => Disposition::Attachment,
            other => {
                return Err(AppError::validation(format!(
                    "Unknown disposition '{other}'"
                )));
            }
        };
        let tag = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AppError::forbidden("Invalid URL signature"))?;
        hmac::verify(
            &self.key,
            &signed_message(key, expires, disposition, name),
            &tag,
        )
        .map_err(|_| AppError::forbidden("Invalid URL signature"))?;
        if now.timestamp() > expires {
            return Err(AppError::forbidden("Signed URL has expired"));
        }
        let file_name = URL_SAFE_NO_PAD
            .decode(name)
            .ok()
            .and_then(|raw| String::from_utf8(raw).ok())
            .ok_or_else(|| AppError::validation("Malformed file name in signed URL"))?;
        Ok(SignedGrant {
            key: key.to_string(),
            disposition,
            file_name,
        })
    }
}

/// The signed fields, NUL-separated.
fn signed_message(key: &str, expires: i64, disposition: Disposition, name: &str) -> Vec<u8> {
    let expires = expires.to_string();
    let disposition = disposition.to_string();
    let mut message = Vec::new();
    for part in [key, expires.as_str(), disposition.as_str(), name] {
        message.extend_from_slice(part.as_bytes());
        message.push(0);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_value<'a>(url: &'a str, field: &str) -> &'a str {
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{field}=")))
            .unwrap_or_default()
    }

    #[test]
    fn test_sign_then_verify() {
        let signer = UrlSigner::new("http://files.local/objects/", "s3cret");
        let now = Utc::now();
        let key = "clients/c1/documents/years/2023/abc123.pdf";
        let url = signer
            .sign(key, Disposition::Inline, "Invoice March.pdf", Duration::from_secs(60), now)
            .unwrap();
        assert!(url.starts_with("http://files.local/objects/clients/c1/"));

        let grant = signer
            .verify(
                key,
                query_value(&url, "expires").parse().unwrap(),
                query_value(&url, "disposition"),
                query_value(&url, "name"),
                query_value(&url, "signature"),
                now,
            )
            .unwrap();
        assert_eq!(grant.disposition, Disposition::Inline);
        assert_eq!(grant.file_name, "Invoice March.pdf");
    }

    #[test]
    fn test_expired_and_tampered_urls_are_rejected() {
        let signer = UrlSigner::new("http://files.local", "s3cret");
        let now = Utc::now();
        let url = signer
            .sign("clients/c1/a.pdf", Disposition::Attachment, "a.pdf", Duration::from_secs(5), now)
            .unwrap();
        let expires: i64 = query_value(&url, "expires").parse().unwrap();
        let name = query_value(&url, "name");
        let signature = query_value(&url, "signature");

        let late = now + chrono::Duration::seconds(30);
        assert!(signer
            .verify("clients/c1/a.pdf", expires, "attachment", name, signature, late)
            .is_err());
        assert!(signer
            .verify("clients/c2/a.pdf", expires, "attachment", name, signature, now)
            .is_err());
        assert!(signer
            .verify("clients/c1/a.pdf", expires, "inline", name, signature, now)
            .is_err());
    }

    #[test]
    fn test_signature_from_another_secret_is_rejected() {
        let now = Utc::now();
        let key = "clients/c1/a.pdf";
        let ours = UrlSigner::new("http://files.local", "s3cret");
        let theirs = UrlSigner::new("http://files.local", "guess");
        let forged = theirs
            .sign(key, Disposition::Inline, "a.pdf", Duration::from_secs(60), now)
            .unwrap();
        let expires: i64 = query_value(&forged, "expires").parse().unwrap();
        let name = query_value(&forged, "name");

        let err = ours
            .verify(key, expires, "inline", name, query_value(&forged, "signature"), now)
            .unwrap_err();
        assert_eq!(err.kind, clientvault_core::error::ErrorKind::Forbidden);
        assert!(ours
            .verify(key, expires, "inline", name, "not base64 !", now)
            .is_err());
    }
}
