//! input path and file-size guards applied before any adapter touches a
//! file on disk.

use crate::constants::MAX_FILE_SIZE_BYTES;
use crate::error::{RcaError, Result};
use std::path::{Path, PathBuf};

/// rejects paths that don't exist, aren't regular files, or escape the
/// optional `allowed_root` via `..` traversal once canonicalized.
pub fn validate_input_path(path: impl AsRef<Path>, allowed_root: Option<&Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let canonical = path
        .canonicalize()
        .map_err(|e| RcaError::PathValidation(format!("{}: {e}", path.display())))?;

    if !canonical.is_file() {
        return Err(RcaError::PathValidation(format!(
            "{} is not a regular file",
            canonical.display()
        )));
    }

    if let Some(root) = allowed_root {
        let root = root
            .canonicalize()
            .map_err(|e| RcaError::PathValidation(format!("{}: {e}", root.display())))?;
        if !canonical.starts_with(&root) {
            return Err(RcaError::PathValidation(format!(
                "{} escapes allowed root {}",
                canonical.display(),
                root.display()
            )));
        }
    }

    Ok(canonical)
}

pub fn get_file_size(path: impl AsRef<Path>) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

/// errors when a file exceeds `max` (defaults to `MAX_FILE_SIZE_BYTES`).
pub fn validate_file_size(path: impl AsRef<Path>, max: Option<u64>) -> Result<()> {
    let path = path.as_ref();
    let size = get_file_size(path)?;
    let max = max.unwrap_or(MAX_FILE_SIZE_BYTES);
    if size > max {
        return Err(RcaError::FileTooLarge {
            path: path.display().to_string(),
            size,
            max,
        });
    }
    Ok(())
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[unit])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
    }

    #[test]
    fn validate_file_size_rejects_oversized() {
        let mut f = tempfile_like();
        f.1.write_all(&vec![0u8; 10]).unwrap();
        assert!(validate_file_size(&f.0, Some(5)).is_err());
        assert!(validate_file_size(&f.0, Some(20)).is_ok());
        std::fs::remove_file(&f.0).unwrap();
    }

    fn tempfile_like() -> (PathBuf, std::fs::File) {
        let path = std::env::temp_dir().join(format!("rca-core-test-{}.tmp", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        (path, file)
    }
}
