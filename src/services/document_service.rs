use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;

pub const UNSUPPORTED_FORMAT_MESSAGE: &str =
    "Unsupported file format. Please upload a Word (.docx) or PDF file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "txt" => Ok(DocumentKind::Text),
            _ => Err(Error::UnsupportedFormat(UNSUPPORTED_FORMAT_MESSAGE.to_string())),
        }
    }

    /// Rejects uploads whose bytes do not look like the claimed format.
    pub fn check_signature(self, data: &[u8]) -> Result<()> {
        match self {
            DocumentKind::Pdf if !data.starts_with(b"%PDF") => {
                Err(Error::BadRequest("Invalid PDF file content".into()))
            }
            DocumentKind::Docx if !data.starts_with(b"PK\x03\x04") => {
                Err(Error::BadRequest("Invalid Word file content".into()))
            }
            _ => Ok(()),
        }
    }
}

/// Binary document -> plain text. Blocking; run it off the async runtime.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentParser: Send + Sync {
    fn extract_text(&self, kind: DocumentKind, data: &[u8]) -> Result<String>;
}

/// PDF through `pdf-extract`, Word through a headless LibreOffice
/// conversion, text decoded directly.
#[derive(Debug, Clone, Default)]
pub struct FileDocumentParser;

impl DocumentParser for FileDocumentParser {
    fn extract_text(&self, kind: DocumentKind, data: &[u8]) -> Result<String> {
        kind.check_signature(data)?;

        match kind {
            DocumentKind::Pdf => pdf_to_text(data),
            DocumentKind::Docx => docx_to_text(data),
            DocumentKind::Text => Ok(String::from_utf8_lossy(data).into_owned()),
        }
    }
}

fn pdf_to_text(data: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed fonts and streams.
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
        .map_err(|_| Error::DocumentParse("Error parsing PDF file: malformed document".into()))?;

    extracted.map_err(|e| {
        tracing::error!("Failed to extract PDF text: {}", e);
        Error::DocumentParse(format!("Error parsing PDF file: {}", e))
    })
}

fn docx_to_text(data: &[u8]) -> Result<String> {
    let temp_dir = std::env::temp_dir().join(format!("quizcard_docx_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&temp_dir)?;

    let result = convert_docx(&temp_dir, data);

    if let Err(e) = std::fs::remove_dir_all(&temp_dir) {
        tracing::warn!("Failed to clean up {:?}: {}", temp_dir, e);
    }
    result
}

fn convert_docx(temp_dir: &Path, data: &[u8]) -> Result<String> {
    let input = temp_dir.join("document.docx");
    std::fs::write(&input, data)?;

    let output = Command::new("libreoffice")
        .arg("--headless")
        .arg("--norestore")
        .arg("--convert-to")
        .arg("txt:Text")
        .arg("--outdir")
        .arg(temp_dir)
        .arg(&input)
        .output()
        .map_err(|e| {
            tracing::error!("Failed to run libreoffice: {}", e);
            Error::DocumentParse("Word conversion is not available".to_string())
        })?;

    if !output.status.success() {
        return Err(Error::DocumentParse(format!(
            "Word conversion failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let text_path = temp_dir.join("document.txt");
    let bytes = std::fs::read(&text_path).map_err(|_| {
        Error::DocumentParse("Word conversion produced no text output".to_string())
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
