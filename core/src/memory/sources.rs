use std::path::Path;
use std::path::PathBuf;

use tracing::warn;
use walkdir::WalkDir;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

fn has_text_ext(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| TEXT_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Collect `.txt`/`.md` files under `root` in a deterministic order.
///
/// A file root is returned on its own when it has a text extension. A
/// directory is walked recursively with entries sorted by file name. A
/// missing root yields nothing.
pub fn discover_sources(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return if has_text_ext(root) { vec![root.to_path_buf()] } else { Vec::new() };
    }
    if !root.is_dir() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && has_text_ext(path) {
            out.push(path.to_path_buf());
        }
    }
    out
}

/// Read a source file, replacing invalid UTF-8 sequences with U+FFFD.
///
/// Chunking runs on the decoded text, so every replaced sequence counts as
/// three bytes towards the chunk window rather than its raw length.
pub fn read_source_text(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
