use std::fmt;

/// Document formats accepted by the upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Txt,
    Pdf,
}

impl DocumentKind {
    /// Pick the kind from a filename's suffix, case-insensitively
    pub fn from_filename(filename: &str) -> Option<Self> {
        let name = filename.trim().to_lowercase();
        if name.ends_with(".txt") {
            Some(DocumentKind::Txt)
        } else if name.ends_with(".pdf") {
            Some(DocumentKind::Pdf)
        } else {
            None
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Txt => f.write_str("txt"),
            DocumentKind::Pdf => f.write_str("pdf"),
        }
    }
}

/// Produces the textual content of an uploaded document.
///
/// Implementations are synchronous and may be CPU heavy; callers run them
/// on a blocking thread.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, anyhow::Error>;
}
