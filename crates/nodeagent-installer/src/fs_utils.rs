use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;

pub fn remove_dir_all_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Byte-for-byte copy; the destination is replaced if it exists.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let payload =
        fs::read(src).with_context(|| format!("failed to read {}", src.display()))?;
    fs::write(dst, payload).with_context(|| format!("failed to write {}", dst.display()))?;
    Ok(())
}
