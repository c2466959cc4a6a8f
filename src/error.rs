//! Error types for the automag library.
//!
//! Every failure that reaches the caller is fatal: the magazine is either
//! written completely or not at all. Recoverable problems never become
//! errors. A single embedded image that fails to decode, a table that matches
//! no classifier rule, a flattened row with too few tokens: these are logged
//! and skipped where they happen.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the automag library.
#[derive(Debug, Error)]
pub enum MagazineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The template exists but is not a DOCX (ZIP) package.
    #[error("Template is not a DOCX package: '{path}'\nFirst bytes: {magic:?}")]
    NotADocx { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password. Report PDFs are expected to be unencrypted.
    #[error("PDF '{path}' is encrypted; decrypt it before generating the magazine.")]
    PasswordRequired { path: PathBuf },

    /// Text extraction failed for a specific page.
    #[error("Text extraction failed for page {page} of '{path}': {detail}")]
    PageTextFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// Could not create the directory extracted images are written to.
    #[error("Cannot create image directory '{path}': {source}")]
    ImageDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform and either:\n\
  • place it next to the automag binary, or\n\
  • set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Template errors ───────────────────────────────────────────────────
    /// The DOCX package could not be read or is missing a required part.
    #[error("Template '{path}' is unreadable: {detail}")]
    TemplateInvalid { path: PathBuf, detail: String },

    // ── AI errors ─────────────────────────────────────────────────────────
    /// A required credential is not set in the environment.
    #[error("{var} not set.\nExport it before generating the magazine.")]
    MissingCredential { var: &'static str },

    /// The configured provider is not initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error during {step}: {message}")]
    LlmApiError { step: &'static str, message: String },

    /// The LLM call exceeded the configured timeout.
    #[error("LLM call for {step} timed out after {secs}s")]
    LlmTimeout { step: &'static str, secs: u64 },

    /// The image service answered with a non-200 status.
    #[error("Image generation failed (HTTP {status}): {body}")]
    ImageGenerationFailed { status: u16, body: String },

    /// The image service could not be reached or timed out.
    #[error("Image generation request failed: {0}")]
    ImageRequestFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output DOCX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for MagazineError {
    fn from(e: zip::result::ZipError) -> Self {
        MagazineError::Internal(format!("zip: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_the_variable() {
        let e = MagazineError::MissingCredential {
            var: "OPENAI_API_KEY",
        };
        assert!(e.to_string().starts_with("OPENAI_API_KEY not set"));
    }

    #[test]
    fn image_generation_display_carries_status() {
        let e = MagazineError::ImageGenerationFailed {
            status: 503,
            body: "model loading".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("503"), "got: {msg}");
        assert!(msg.contains("model loading"));
    }

    #[test]
    fn llm_timeout_display() {
        let e = MagazineError::LlmTimeout {
            step: "topic selection",
            secs: 90,
        };
        assert!(e.to_string().contains("90s"));
        assert!(e.to_string().contains("topic selection"));
    }

    #[test]
    fn page_text_failure_display() {
        let e = MagazineError::PageTextFailed {
            path: PathBuf::from("doc1.pdf"),
            page: 4,
            detail: "no text layer".into(),
        };
        assert!(e.to_string().contains("page 4"));
        assert!(e.to_string().contains("doc1.pdf"));
    }
}
