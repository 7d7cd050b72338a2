//! Crash-safe file replacement (tmp + rename).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replace `path` with `bytes` without ever exposing a partially written file.
///
/// The content goes to a temporary sibling first, is flushed to disk, and is
/// then renamed over the target. A crash leaves either the old or the new file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path);
    let result = write_tmp(&tmp_path, bytes).and_then(|_| fs::rename(&tmp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Copy `src` over `dst` with the same guarantees as [`write_atomic`].
pub fn copy_atomic(src: &Path, dst: &Path) -> std::io::Result<()> {
    let bytes = fs::read(src)?;
    write_atomic(dst, &bytes)
}

fn write_tmp(tmp_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()))
}
