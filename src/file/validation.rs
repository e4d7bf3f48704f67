//! Upload validation: PDF detection and filename cleanup.

use crate::{Result, ShelfError};

/// MIME type accepted for uploads.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Magic bytes every PDF starts with.
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Declared types that say nothing about the content.
const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// Check that a submission is a PDF.
///
/// A specific declared type must be `application/pdf`. When the client sent
/// no type or only a generic one, the type guessed from the filename must be
/// PDF instead. In every case the content itself must carry the PDF
/// signature.
pub fn ensure_pdf(content: &[u8], original_name: &str, declared_mime: Option<&str>) -> Result<()> {
    match declared_mime.map(essence).filter(|m| !m.is_empty()) {
        Some(mime) if !GENERIC_MIME_TYPES.contains(&mime.as_str()) => {
            if mime != PDF_MIME_TYPE {
                return Err(ShelfError::InvalidFileType(format!(
                    "declared type {mime} is not {PDF_MIME_TYPE}"
                )));
            }
        }
        _ => {
            let guessed = mime_guess::from_path(original_name).first();
            if guessed.as_ref().map(|m| m.essence_str()) != Some(PDF_MIME_TYPE) {
                return Err(ShelfError::InvalidFileType(format!(
                    "{original_name} does not look like a PDF"
                )));
            }
        }
    }

    if !has_pdf_signature(content) {
        return Err(ShelfError::InvalidFileType(
            "content is missing the PDF signature".to_string(),
        ));
    }

    Ok(())
}

/// Whether the content starts with the PDF signature.
pub fn has_pdf_signature(content: &[u8]) -> bool {
    content.starts_with(PDF_SIGNATURE)
}

/// Lowercased MIME type without parameters (`Application/PDF; x=y` → `application/pdf`).
fn essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

/// Clean a client-supplied filename for display and storage in metadata.
///
/// Keeps only the final path component (some browsers send a fake full
/// path) and drops control characters. Returns `None` if nothing is left.
pub fn clean_original_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";

    #[test]
    fn test_accepts_declared_pdf() {
        assert!(ensure_pdf(PDF, "report.pdf", Some("application/pdf")).is_ok());
    }

    #[test]
    fn test_accepts_declared_pdf_with_parameters() {
        assert!(ensure_pdf(PDF, "report.pdf", Some("Application/PDF; charset=binary")).is_ok());
    }

    #[test]
    fn test_declared_type_wins_over_extension() {
        // A PDF renamed without extension is fine when the client declares it.
        assert!(ensure_pdf(PDF, "scan", Some("application/pdf")).is_ok());
    }

    #[test]
    fn test_rejects_declared_text_plain() {
        let result = ensure_pdf(PDF, "notes.pdf", Some("text/plain"));
        assert!(matches!(result, Err(ShelfError::InvalidFileType(_))));
    }

    #[test]
    fn test_generic_type_falls_back_to_extension() {
        assert!(ensure_pdf(PDF, "report.pdf", Some("application/octet-stream")).is_ok());

        let result = ensure_pdf(PDF, "report.bin", Some("application/octet-stream"));
        assert!(matches!(result, Err(ShelfError::InvalidFileType(_))));
    }

    #[test]
    fn test_missing_type_falls_back_to_extension() {
        assert!(ensure_pdf(PDF, "REPORT.PDF", None).is_ok());
        assert!(ensure_pdf(PDF, "report.pdf", Some("")).is_ok());

        let result = ensure_pdf(PDF, "image.png", None);
        assert!(matches!(result, Err(ShelfError::InvalidFileType(_))));
    }

    #[test]
    fn test_rejects_content_without_signature() {
        let result = ensure_pdf(b"hello world", "fake.pdf", Some("application/pdf"));
        assert!(matches!(result, Err(ShelfError::InvalidFileType(_))));
    }

    #[test]
    fn test_rejects_empty_content() {
        let result = ensure_pdf(b"", "empty.pdf", Some("application/pdf"));
        assert!(matches!(result, Err(ShelfError::InvalidFileType(_))));
    }

    #[test]
    fn test_has_pdf_signature() {
        assert!(has_pdf_signature(b"%PDF-2.0"));
        assert!(!has_pdf_signature(b"%PD"));
        assert!(!has_pdf_signature(b" %PDF-1.4"));
    }

    #[test]
    fn test_clean_original_name() {
        assert_eq!(clean_original_name("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(
            clean_original_name("C:\\fakepath\\report.pdf").as_deref(),
            Some("report.pdf")
        );
        assert_eq!(clean_original_name("/tmp/a/b.pdf").as_deref(), Some("b.pdf"));
        assert_eq!(
            clean_original_name("evil\r\nname.pdf").as_deref(),
            Some("evilname.pdf")
        );
        assert_eq!(clean_original_name("日本語.pdf").as_deref(), Some("日本語.pdf"));
        assert_eq!(clean_original_name("   "), None);
        assert_eq!(clean_original_name("dir/"), None);
        assert_eq!(clean_original_name(""), None);
    }
}
