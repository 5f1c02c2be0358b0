//! Atomic file materialization: write to `<path>.tmp`, fsync, verify, rename.
//!
//! Mirrors the temp-file-plus-rename protocol in `transactional_chunk_writer.rs` from the wider
//! pipeline corpus: nothing observable happens at `target_path` until the final rename, so a
//! crash or cancellation before that point leaves at most a `.tmp` sibling behind.

use crate::error::{HdfWriteError, Result};
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writes `bytes` to `target_path` atomically: the file is either fully present with the given
/// contents, or (on any failure) not present at all and no `.tmp` sibling remains.
pub fn write_file_atomic(target_path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| HdfWriteError::FileWriteError { path: parent.to_path_buf(), source })?;
    }

    let tmp_path = tmp_path_for(target_path);
    match write_and_verify(&tmp_path, bytes, target_path) {
        Ok(()) => {
            std::fs::rename(&tmp_path, target_path).map_err(|source| {
                HdfWriteError::FileWriteError { path: target_path.to_path_buf(), source }
            })?;
            debug!(path = %target_path.display(), len = bytes.len(), "committed file");
            Ok(())
        }
        Err(err) => {
            if let Err(cleanup_err) = std::fs::remove_file(&tmp_path) {
                if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %tmp_path.display(), error = %cleanup_err, "failed to clean up temp file after write failure");
                }
            }
            Err(err)
        }
    }
}

fn write_and_verify(tmp_path: &Path, bytes: &[u8], target_path: &Path) -> Result<()> {
    let mut file = File::create(tmp_path).map_err(|source| {
        classify_io_error(source, target_path, bytes.len() as u64)
    })?;
    file.write_all(bytes)
        .map_err(|source| classify_io_error(source, target_path, bytes.len() as u64))?;
    file.sync_all()
        .map_err(|source| HdfWriteError::FileWriteError { path: target_path.to_path_buf(), source })?;
    drop(file);

    if let Some(parent) = target_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    let actual_len = std::fs::metadata(tmp_path)
        .map(|m| m.len())
        .map_err(|source| HdfWriteError::FileWriteError { path: target_path.to_path_buf(), source })?;
    if actual_len != bytes.len() as u64 {
        return Err(HdfWriteError::VerificationError {
            path: target_path.to_path_buf(),
            expected_len: bytes.len() as u64,
            actual_len,
        });
    }
    Ok(())
}

fn classify_io_error(source: std::io::Error, path: &Path, required_bytes: u64) -> HdfWriteError {
    if source.raw_os_error() == Some(28) {
        // ENOSPC; the OS doesn't tell us how much space was actually available.
        HdfWriteError::InsufficientSpaceError {
            path: path.to_path_buf(),
            required_bytes,
            available_bytes: 0,
        }
    } else {
        HdfWriteError::FileWriteError { path: path.to_path_buf(), source }
    }
}

fn tmp_path_for(target_path: &Path) -> PathBuf {
    let mut name: OsString = target_path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Removes a stale `<target_path>.tmp` left behind by an interrupted write. A no-op if absent.
pub fn cleanup_temp_files(target_path: impl AsRef<Path>) -> Result<()> {
    let tmp_path = tmp_path_for(target_path.as_ref());
    match std::fs::remove_file(&tmp_path) {
        Ok(()) => Ok(()),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(HdfWriteError::FileWriteError { path: tmp_path, source }),
    }
}
