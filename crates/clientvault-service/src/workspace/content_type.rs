//! MIME type detection from display names.

/// Fallback for content whose type cannot be determined.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess a MIME type from a file name's extension.
pub fn guess(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "tif" | "tiff" => "image/tiff",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "odt" => "application/vnd.oasis.opendocument.text",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        _ => return None,
    };
    Some(mime)
}

/// Resolve the content type of an upload: the declared type if any,
/// else a guess from the name, else octet-stream.
pub fn resolve(declared: Option<&str>, file_name: &str) -> String {
    declared
        .map(str::trim)
        .filter(|m| !m.is_empty() && m.contains('/'))
        .map(str::to_ascii_lowercase)
        .or_else(|| guess(file_name).map(str::to_string))
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess() {
        assert_eq!(guess("invoice.PDF"), Some("application/pdf"));
        assert_eq!(guess("ledger.xlsx").map(|m| m.ends_with("sheet")), Some(true));
        assert_eq!(guess("noext"), None);
    }

    #[test]
    fn test_declared_type_wins() {
        assert_eq!(resolve(Some("image/PNG"), "scan.pdf"), "image/png");
        assert_eq!(resolve(Some("garbage"), "scan.pdf"), "application/pdf");
        assert_eq!(resolve(None, "blob"), OCTET_STREAM);
    }
}
