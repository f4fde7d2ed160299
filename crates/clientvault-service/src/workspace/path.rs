//! Object key layout.
//!
//! A client's tree lives under `{key_root}/{client_id}/`. Every folder
//! below the root adds `{slug}/`, and a file's key is its folder prefix
//! followed by the generated file name:
//!
//! ```text
//! clients/7d9f.../documents/years/2023/4be1c0d2....pdf
//! ```
//!
//! Everything here is pure and independent of storage.

use uuid::Uuid;

use clientvault_core::error::AppError;
use clientvault_core::result::AppResult;
use clientvault_core::types::id::ClientId;

/// Longest slug kept from a display name.
const MAX_SLUG_LEN: usize = 80;

/// Longest accepted display name, in characters.
const MAX_NAME_LEN: usize = 255;

/// Validate and normalize a user-supplied display name.
pub fn display_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "Name cannot be longer than {MAX_NAME_LEN} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(AppError::validation("Name cannot contain control characters"));
    }
    Ok(name.to_string())
}

/// Derive a key-safe slug from a display name.
///
/// Lowercases, turns whitespace and separators into hyphens, drops any
/// other character outside `[a-z0-9._-]`, and collapses repeated hyphens.
pub fn slugify(name: &str) -> AppResult<String> {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().to_lowercase().chars() {
        match ch {
            'a'..='z' | '0'..='9' | '_' | '.' => slug.push(ch),
            c if c.is_whitespace() || matches!(c, '-' | '/' | '\\' | '+' | ',' | ':') => {
                if !slug.ends_with('-') {
                    slug.push('-');
                }
            }
            _ => {}
        }
    }

    let mut slug = slug
        .trim_matches(|c| c == '-' || c == '.')
        .to_string();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug = slug.trim_end_matches(['-', '.']).to_string();
    }
    if slug.is_empty() {
        return Err(AppError::validation(format!(
            "Name '{name}' has no characters usable in a storage path"
        )));
    }
    Ok(slug)
}

/// Return `base` if unused, else the first free `base-2`, `base-3`, ...
pub fn unique_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| format!("{base}-{}", Uuid::new_v4().simple()))
}

/// Prefix of a client's root folder.
pub fn root_prefix(key_root: &str, client_id: ClientId) -> String {
    format!("{}/{client_id}/", key_root.trim_matches('/'))
}

/// Prefix of a child folder.
pub fn child_prefix(parent_prefix: &str, slug: &str) -> String {
    format!("{parent_prefix}{slug}/")
}

/// Object key of a file stored in the folder with `folder_prefix`.
pub fn key_of(folder_prefix: &str, file_name: &str) -> String {
    format!("{folder_prefix}{file_name}")
}

/// Move `key` from under `old_prefix` to under `new_prefix`.
pub fn rebase(key: &str, old_prefix: &str, new_prefix: &str) -> AppResult<String> {
    key.strip_prefix(old_prefix)
        .map(|rest| format!("{new_prefix}{rest}"))
        .ok_or_else(|| {
            AppError::internal(format!(
                "Key '{key}' does not live under prefix '{old_prefix}'"
            ))
        })
}

/// Generate a storage name for an upload: a random token plus the
/// lowercased original extension when that extension is key-safe.
pub fn generate_file_name(original_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match safe_extension(original_name) {
        Some(ext) => format!("{token}.{ext}"),
        None => token,
    }
}

fn safe_extension(original_name: &str) -> Option<String> {
    let (stem, ext) = original_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    ext.chars()
        .all(|c| c.is_ascii_alphanumeric())
        .then(|| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("  Tax 2023 ").unwrap(), "Tax 2023");
        assert!(display_name(" ").is_err());
        assert!(display_name("bad\nname").is_err());
        assert!(display_name(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("2023 Final").unwrap(), "2023-final");
        assert_eq!(slugify("  Tax  Returns / Q1 ").unwrap(), "tax-returns-q1");
        assert_eq!(slugify("Receipts (scanned)").unwrap(), "receipts-scanned");
        assert_eq!(slugify("v1.2_draft").unwrap(), "v1.2_draft");
        assert_eq!(slugify("..hidden..").unwrap(), "hidden");
        assert_eq!(slugify("Café").unwrap(), "caf");
    }

    #[test]
    fn test_slugify_rejects_unusable_names() {
        assert!(slugify("   ").is_err());
        assert!(slugify("../..").is_err());
        assert!(slugify("日本").is_err());
    }

    #[test]
    fn test_unique_slug_appends_suffix() {
        let taken = vec!["invoices".to_string(), "invoices-2".to_string()];
        assert_eq!(unique_slug("receipts", &taken), "receipts");
        assert_eq!(unique_slug("invoices", &taken), "invoices-3");
    }

    #[test]
    fn test_prefix_layout() {
        let client = ClientId::new();
        let root = root_prefix("clients/", client);
        assert_eq!(root, format!("clients/{client}/"));
        let docs = child_prefix(&root, "documents");
        let years = child_prefix(&docs, "years");
        let y2023 = child_prefix(&years, "2023");
        assert_eq!(y2023, format!("clients/{client}/documents/years/2023/"));
        assert_eq!(
            key_of(&y2023, "abc123.pdf"),
            format!("clients/{client}/documents/years/2023/abc123.pdf")
        );
    }

    #[test]
    fn test_rebase() {
        assert_eq!(
            rebase(
                "clients/c1/documents/years/2023/sub/abc.pdf",
                "clients/c1/documents/years/2023/",
                "clients/c1/documents/years/2023-final/"
            )
            .unwrap(),
            "clients/c1/documents/years/2023-final/sub/abc.pdf"
        );
        assert!(rebase("clients/c2/a.pdf", "clients/c1/", "clients/c3/").is_err());
    }

    #[test]
    fn test_generate_file_name() {
        let name = generate_file_name("Invoice March.PDF");
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), 32 + 4);
        assert!(!generate_file_name("README").contains('.'));
        assert!(!generate_file_name("weird.p?f").contains('.'));
        assert!(!generate_file_name(".bashrc").contains('.'));
        assert_ne!(generate_file_name("a.pdf"), generate_file_name("a.pdf"));
    }
}
