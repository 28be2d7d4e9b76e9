//! Per-page text extraction for corpus documents.
//!
//! PDFs are split into one text entry per page; plain-text formats become
//! single-page documents. Extraction never panics: failures are returned to
//! the store, which logs and skips the file.

use std::path::Path;

/// File extensions recognized as corpus documents.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

/// Extraction error. A failed file is skipped; the load continues.
#[derive(Debug)]
pub enum ExtractError {
    UnsupportedExtension(String),
    Pdf(String),
    Io(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedExtension(ext) => {
                write!(f, "unsupported document extension: {}", ext)
            }
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Io(e) => write!(f, "failed to read document: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Whether a filename carries a recognized document extension.
pub fn is_supported(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

fn extension_of(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// Extracts plain text from a document, one entry per page.
///
/// A page that yields no text comes back as an empty string rather than an
/// error; per-page extraction noise must not discard the whole document.
pub fn extract_pages(path: &Path) -> Result<Vec<String>, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match ext.as_str() {
        "pdf" => pdf_extract::extract_text_by_pages(path).map_err(|e| ExtractError::Pdf(e.to_string())),
        "txt" | "md" => std::fs::read_to_string(path)
            .map(|text| vec![text])
            .map_err(|e| ExtractError::Io(e.to_string())),
        other => Err(ExtractError::UnsupportedExtension(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_extensions_recognized() {
        assert!(is_supported("report.pdf"));
        assert!(is_supported("notes.TXT"));
        assert!(is_supported("readme.md"));
        assert!(!is_supported("archive.zip"));
        assert!(!is_supported("no_extension"));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        let err = extract_pages(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn text_file_is_a_single_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "alpha beta gamma").unwrap();
        let pages = extract_pages(&path).unwrap();
        assert_eq!(pages, vec!["alpha beta gamma".to_string()]);
    }

    #[test]
    fn unsupported_extension_returns_error() {
        let err = extract_pages(Path::new("data.bin")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedExtension(_)));
    }
}
