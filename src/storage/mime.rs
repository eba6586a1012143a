//! MIME type resolution and the public-area allow-list.

/// Content types the public area accepts. The public subtree is served
/// directly by a static file route, so it is limited to media that is safe
/// to hand out without a download prompt.
pub const PUBLIC_ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "image/svg+xml",
];

/// Whether a content type may be stored in the public area.
pub fn is_public_type(mime: &str) -> bool {
    PUBLIC_ALLOWED_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(mime))
}

/// Resolves a content type from the declared value and the filename.
///
/// A concrete declared type wins; otherwise the extension is consulted,
/// with `application/octet-stream` as the last resort.
pub fn resolve_mime(declared: Option<&str>, file_name: &str) -> String {
    match declared {
        Some(t) if !t.is_empty() && t != "application/octet-stream" => t.to_string(),
        _ => mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

/// Extension of a filename, lowercased, without the dot. Only plain
/// alphanumeric extensions qualify; anything else is treated as absent.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_membership() {
        assert!(is_public_type("image/png"));
        assert!(is_public_type("application/pdf"));
        assert!(is_public_type("IMAGE/JPEG"));
        assert!(!is_public_type("application/zip"));
        assert!(!is_public_type("text/html"));
    }

    #[test]
    fn declared_type_wins() {
        assert_eq!(
            resolve_mime(Some("application/pdf"), "syllabus.bin"),
            "application/pdf"
        );
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(resolve_mime(None, "syllabus.pdf"), "application/pdf");
        assert_eq!(resolve_mime(Some(""), "photo.webp"), "image/webp");
        assert_eq!(
            resolve_mime(Some("application/octet-stream"), "deck.png"),
            "image/png"
        );
        assert_eq!(resolve_mime(None, "mystery"), "application/octet-stream");
    }

    #[test]
    fn extensions() {
        assert_eq!(file_extension("a.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension(".gitignore"), None);
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("weird.p/df"), None);
    }
}
