//! File management module for CareData.
//!
//! Uploaded files live on disk under UUID names (see [`FileStorage`]); their
//! metadata lives in the `uploaded_files` table.

mod metadata;
mod storage;

pub use metadata::{FileRepository, NewUploadedFile, UploadedFile};
pub use storage::FileStorage;

/// Maximum length for a display filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 100;

/// Maximum length for a file description (in characters).
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Reduce a client-supplied filename to its final path component.
///
/// Browsers on some platforms send full paths; control characters are dropped
/// and the result is capped at [`MAX_FILENAME_LENGTH`] characters.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILENAME_LENGTH)
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("C:\\Users\\me\\scan.png"), "scan.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("bad\nname.txt"), "badname.txt");
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename(&"a".repeat(150)).len(), MAX_FILENAME_LENGTH);
    }
}
