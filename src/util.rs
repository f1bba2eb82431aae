//! File-name helpers shared by the case model and the CLI display layer.

use std::path::Path;

/// File extensions accepted as case source documents.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx"];

/// Truncate a display name with ellipsis.
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        name.to_string()
    } else {
        let head: String = name.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// The final path component, or an empty string for paths without one.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Display name for a document: file name without its extension.
///
/// Falls back to the full file name when there is no extension.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name(path))
}

/// Whether a path has one of the supported document extensions.
pub fn is_supported_document(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
