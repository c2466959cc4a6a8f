//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! pdfium and the ZIP reader both want a file-system path, so URLs are
//! downloaded into a `TempDir` that lives as long as the [`ResolvedInput`].
//! Magic bytes are checked up front so a mislabelled file fails with a
//! specific error instead of deep inside pdfium or the DOCX editor.

use crate::error::MagazineError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// What a resolved input must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A source report (`%PDF`).
    Pdf,
    /// The DOCX template (a ZIP, `PK\x03\x04`).
    Docx,
}

impl InputKind {
    fn magic(self) -> &'static [u8; 4] {
        match self {
            InputKind::Pdf => b"%PDF",
            InputKind::Docx => b"PK\x03\x04",
        }
    }

    fn fallback_name(self) -> &'static str {
        match self {
            InputKind::Pdf => "downloaded.pdf",
            InputKind::Docx => "template.docx",
        }
    }

    fn mismatch(self, path: PathBuf, magic: [u8; 4]) -> MagazineError {
        match self {
            InputKind::Pdf => MagazineError::NotAPdf { path, magic },
            InputKind::Docx => MagazineError::NotADocx { path, magic },
        }
    }
}

/// The resolved input: a local path or a downloaded temp file.
pub enum ResolvedInput {
    Local(PathBuf),
    /// The `TempDir` is held so the file outlives processing.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local file of the given kind.
pub async fn resolve_input(
    input: &str,
    kind: InputKind,
    timeout_secs: u64,
) -> Result<ResolvedInput, MagazineError> {
    if is_url(input) {
        download_url(input, kind, timeout_secs).await
    } else {
        resolve_local(input, kind)
    }
}

fn resolve_local(path_str: &str, kind: InputKind) -> Result<ResolvedInput, MagazineError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(MagazineError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            let read = f.read_exact(&mut magic);
            if read.is_err() || &magic != kind.magic() {
                return Err(kind.mismatch(path, magic));
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(MagazineError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(MagazineError::FileNotFound { path });
        }
    }

    debug!("Resolved local {:?}: {}", kind, path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(
    url: &str,
    kind: InputKind,
    timeout_secs: u64,
) -> Result<ResolvedInput, MagazineError> {
    info!("Downloading {:?} from: {}", kind, url);

    let failed = |reason: String| MagazineError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            MagazineError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url).unwrap_or_else(|| kind.fallback_name().to_string());
    let temp_dir = TempDir::new().map_err(|e| MagazineError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    if bytes.len() < 4 || &bytes[..4] != kind.magic() {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(kind.mismatch(file_path, magic));
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| MagazineError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of `url`, if it looks like a file name.
fn filename_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    (!last.is_empty() && last.contains('.')).then(|| last.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_comes_from_the_last_segment() {
        assert_eq!(
            filename_from_url("https://x.org/reports/q1.pdf?dl=1").as_deref(),
            Some("q1.pdf")
        );
        assert_eq!(filename_from_url("https://x.org/reports/"), None);
        assert_eq!(filename_from_url("https://x.org/download"), None);
    }

    #[test]
    fn local_magic_is_checked_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("a.pdf");
        let docx = dir.path().join("t.docx");
        std::fs::write(&pdf, b"%PDF-1.7\n").unwrap();
        std::fs::write(&docx, b"PK\x03\x04rest").unwrap();

        let as_str = |p: &Path| p.to_string_lossy().into_owned();
        assert!(resolve_local(&as_str(&pdf), InputKind::Pdf).is_ok());
        assert!(resolve_local(&as_str(&docx), InputKind::Docx).is_ok());
        assert!(matches!(
            resolve_local(&as_str(&docx), InputKind::Pdf),
            Err(MagazineError::NotAPdf { magic, .. }) if &magic == b"PK\x03\x04"
        ));
        assert!(matches!(
            resolve_local(&as_str(&pdf), InputKind::Docx),
            Err(MagazineError::NotADocx { .. })
        ));
    }

    #[test]
    fn missing_and_short_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.pdf");
        assert!(matches!(
            resolve_local(&missing.to_string_lossy(), InputKind::Pdf),
            Err(MagazineError::FileNotFound { .. })
        ));

        let short = dir.path().join("short.pdf");
        std::fs::write(&short, b"%P").unwrap();
        assert!(matches!(
            resolve_local(&short.to_string_lossy(), InputKind::Pdf),
            Err(MagazineError::NotAPdf { .. })
        ));
    }
}
