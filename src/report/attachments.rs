//! Local attachment policy and identity checks.
//!
//! These checks run before any network call; a file that violates them is
//! rejected with a descriptive error and no upload is attempted. After a
//! mutating call the server's returned file list is the only source of truth
//! for the slot; the client never appends or merges locally.

use crate::api::models::{FileDescriptor, FileKind};
use std::fmt;
use std::path::Path;

pub const MAX_PDF_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "svg"];

/// Local rejection of an attachment action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    /// Extension does not match the expected kind.
    WrongType { filename: String, kind: FileKind },
    /// File exceeds the size ceiling for its kind.
    TooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },
    /// Kind could not be determined from the extension.
    UnknownType { filename: String },
    /// A descriptor is missing filename or path and cannot be addressed.
    MissingFileInfo,
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentError::WrongType { filename, kind } => match kind {
                FileKind::Pdf => write!(f, "{filename}: only PDF files are accepted here"),
                FileKind::Image => write!(f, "{filename}: only image files are accepted here"),
            },
            AttachmentError::TooLarge {
                filename,
                size,
                limit,
            } => write!(
                f,
                "{filename} is {:.1} MB; the limit is {} MB",
                *size as f64 / (1024.0 * 1024.0),
                limit / (1024 * 1024)
            ),
            AttachmentError::UnknownType { filename } => {
                write!(f, "{filename}: unsupported file type")
            }
            AttachmentError::MissingFileInfo => write!(f, "missing file info"),
        }
    }
}

impl std::error::Error for AttachmentError {}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Infer the attachment kind from the file extension.
pub fn detect_kind(filename: &str) -> Option<FileKind> {
    let ext = extension(filename)?;
    if ext == "pdf" {
        Some(FileKind::Pdf)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(FileKind::Image)
    } else {
        None
    }
}

pub fn size_limit(kind: FileKind) -> u64 {
    match kind {
        FileKind::Pdf => MAX_PDF_BYTES,
        FileKind::Image => MAX_IMAGE_BYTES,
    }
}

/// Validate type and size before an upload is attempted.
pub fn check_upload(filename: &str, size: u64, kind: FileKind) -> Result<(), AttachmentError> {
    match detect_kind(filename) {
        Some(detected) if detected == kind => {}
        Some(_) | None => {
            return Err(AttachmentError::WrongType {
                filename: filename.to_string(),
                kind,
            });
        }
    }

    let limit = size_limit(kind);
    if size > limit {
        return Err(AttachmentError::TooLarge {
            filename: filename.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Removal needs both identity fields; a descriptor without them points at
/// nothing the server can act on.
pub fn removal_identity(descriptor: &FileDescriptor) -> Result<(), AttachmentError> {
    if descriptor.has_identity() {
        Ok(())
    } else {
        Err(AttachmentError::MissingFileInfo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_kind_from_extension() {
        assert_eq!(detect_kind("report.pdf"), Some(FileKind::Pdf));
        assert_eq!(detect_kind("site.PNG"), Some(FileKind::Image));
        assert_eq!(detect_kind("notes.docx"), None);
        assert_eq!(detect_kind("no_extension"), None);
    }

    #[test]
    fn rejects_wrong_type_before_size() {
        let err = check_upload("report.docx", 100, FileKind::Pdf).unwrap_err();
        assert!(matches!(err, AttachmentError::WrongType { .. }));

        let err = check_upload("scan.pdf", 100, FileKind::Image).unwrap_err();
        assert!(matches!(err, AttachmentError::WrongType { .. }));
    }

    #[test]
    fn enforces_per_kind_size_ceilings() {
        assert!(check_upload("report.pdf", MAX_PDF_BYTES, FileKind::Pdf).is_ok());
        assert!(check_upload("report.pdf", MAX_PDF_BYTES + 1, FileKind::Pdf).is_err());
        assert!(check_upload("photo.jpg", MAX_IMAGE_BYTES, FileKind::Image).is_ok());
        assert!(check_upload("photo.jpg", MAX_IMAGE_BYTES + 1, FileKind::Image).is_err());
    }

    #[test]
    fn removal_requires_both_identity_fields() {
        let mut fd = FileDescriptor {
            filename: "report.pdf".into(),
            path: "active_report/demo/pdfs/report.pdf".into(),
            kind: FileKind::Pdf,
            uploaded_at: None,
        };
        assert!(removal_identity(&fd).is_ok());

        fd.path.clear();
        assert_eq!(
            removal_identity(&fd).unwrap_err(),
            AttachmentError::MissingFileInfo
        );
    }
}
