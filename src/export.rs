use crate::error::RepoError;
use crate::formatter::FileContent;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;

/// Deflate archive of the selected files. Member names drop the leading `/`.
pub fn build_archive(files: &[FileContent]) -> Result<Vec<u8>, RepoError> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for file in files {
        let name = file.path.trim_start_matches('/');
        zip.start_file(name, options)?;
        zip.write_all(file.text.as_bytes())?;
    }

    let cursor = zip.finish()?;
    tracing::debug!(files = files.len(), "built zip archive");
    Ok(cursor.into_inner())
}

pub fn save_bytes(path: &Path, bytes: &[u8]) -> Result<(), RepoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

pub fn save_text(path: &Path, text: &str) -> Result<(), RepoError> {
    save_bytes(path, text.as_bytes())
}
