use std::path::{Path, PathBuf};

/// Extension used for persisted raw document bytes.
pub const RAW_FILE_EXTENSION: &str = "pdf";

/// Number of context characters returned alongside an answer.
pub const CONTEXT_SNIPPET_CHARS: usize = 200;
pub const CONTEXT_SNIPPET_ELLIPSIS: &str = "...";

/// Separator appended after every extracted page.
pub const PAGE_SEPARATOR: char = '\n';

pub fn make_storage_file_name(document_id: &str) -> String {
    format!("{document_id}.{RAW_FILE_EXTENSION}")
}

pub fn make_storage_path(storage_dir: &Path, document_id: &str) -> PathBuf {
    storage_dir.join(make_storage_file_name(document_id))
}
