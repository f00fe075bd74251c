//! Crash-safe rewrite of small state files.
use std::{fs, io::Write, path::Path};

/// Replace `path` with `bytes` so readers never observe a half-written file.
///
/// The data goes to a sibling `*.new` file first, is fsynced, then renamed
/// over the target. Missing parent directories are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}
