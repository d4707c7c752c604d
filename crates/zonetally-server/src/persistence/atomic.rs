//! Crash-safe file replacement.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` atomically.
///
/// The data goes to `<path>.tmp` in the same directory, is fsynced, then
/// renamed over `path`. A reader of `path` sees either the previous file or
/// the new one, never a partial write. On unix the parent directory is
/// fsynced afterwards so the rename itself survives power loss.
///
/// An `Err` means `path` was not replaced. Once the rename succeeds the write
/// counts as done: a failed directory fsync is logged, not returned.
///
/// Callers must not run two writes to the same `path` concurrently.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = tmp_path(path);

    let res = write_synced(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = res {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    finish_replace(path, fsync_parent(path))
}

fn finish_replace(path: &Path, dir_sync: io::Result<()>) -> io::Result<()> {
    if let Err(e) = dir_sync {
        tracing::warn!(path = %path.display(), error = %e, "file replaced but directory fsync failed");
    }
    Ok(())
}

/// Temp file used by [`write_atomic`] for `path`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

fn write_synced(tmp: &Path, bytes: &[u8]) -> io::Result<()> {
    // Truncates a temp file left behind by a crashed save.
    let mut file = File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(target_family = "unix")]
fn fsync_parent(path: &Path) -> io::Result<()> {
    File::open(parent_dir(path))?.sync_all()
}

#[cfg(not(target_family = "unix"))]
fn fsync_parent(_path: &Path) -> io::Result<()> {
    // No directory fsync on this platform.
    Ok(())
}
