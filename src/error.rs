//! The error taxonomy returned by every fallible operation in this crate.
//!
//! Every variant carries the structured fields a caller needs to triage the failure, plus
//! (where meaningful) the target path. [`HdfWriteError`] never swallows an underlying OS or
//! codec error; it wraps it.

use std::path::PathBuf;
use thiserror::Error;

const RECOVERY_SUGGESTIONS: &str = "\n\nRecovery Suggestions:\n  - Check that the target directory has enough free disk space.\n  - Check that the process has write permission to the target path and its parent directory.\n  - Re-run the write; this operation performs no partial writes and is safe to retry.";

/// Errors produced while writing an HDF5 file.
///
/// `Display` for every variant ends with a fixed "Recovery Suggestions" footer, per the
/// user-visible error contract: every message should leave the caller with a concrete next
/// step rather than a bare diagnostic.
#[derive(Error, Debug)]
pub enum HdfWriteError {
    /// An argument was out of range or otherwise malformed: an illegal compression level, a
    /// non-positive chunk dimension, `align_to(0)`, or an out-of-range `write_at` offset.
    #[error("invalid argument: {message}{}", RECOVERY_SUGGESTIONS)]
    InvalidArgument {
        /// Description of which argument was invalid and why.
        message: String,
    },

    /// The caller requested a feature this writer does not implement.
    #[error("unsupported feature: {message}{}", RECOVERY_SUGGESTIONS)]
    UnsupportedFeature {
        /// Description of the unsupported request.
        message: String,
    },

    /// The chunk count for a dataset exceeds the single-node B-tree capacity.
    #[error(
        "too many chunks: dataset {path:?} needs {chunk_count} chunks but the chunk index node \
         can hold at most {capacity}{}",
        RECOVERY_SUGGESTIONS
    )]
    TooManyChunks {
        /// Dataset path that overflowed the index.
        path: PathBuf,
        /// Number of chunks the dataset required.
        chunk_count: usize,
        /// Maximum number of chunks the single B-tree node can hold.
        capacity: usize,
    },

    /// The OS refused to create, write, or rename the temporary file.
    #[error("failed to write file {path:?}: {source}{}", RECOVERY_SUGGESTIONS)]
    FileWriteError {
        /// The target file path.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A pre-flight or post-write disk space check failed.
    #[error(
        "insufficient disk space for {path:?}: need {required_bytes} bytes, {available_bytes} \
         available{}",
        RECOVERY_SUGGESTIONS
    )]
    InsufficientSpaceError {
        /// Target file path.
        path: PathBuf,
        /// Bytes required to complete the write.
        required_bytes: u64,
        /// Bytes actually available on the target filesystem.
        available_bytes: u64,
    },

    /// The written temp file's length differs from the buffer that was supposed to be written.
    #[error(
        "verification failed for {path:?}: expected {expected_len} bytes, found {actual_len}{}",
        RECOVERY_SUGGESTIONS
    )]
    VerificationError {
        /// Target file path.
        path: PathBuf,
        /// Expected length of the written file.
        expected_len: u64,
        /// Observed length of the written file.
        actual_len: u64,
    },

    /// The caller signalled an abort before the atomic rename completed.
    #[error("write to {path:?} was interrupted before it was committed{}", RECOVERY_SUGGESTIONS)]
    WriteInterruptedError {
        /// Target file path.
        path: PathBuf,
    },
}

impl HdfWriteError {
    /// A short, stable category tag, useful for metrics and log filtering.
    pub fn category(&self) -> &'static str {
        match self {
            HdfWriteError::InvalidArgument { .. } => "invalid_argument",
            HdfWriteError::UnsupportedFeature { .. } => "unsupported_feature",
            HdfWriteError::TooManyChunks { .. } => "too_many_chunks",
            HdfWriteError::FileWriteError { .. } => "file_write_error",
            HdfWriteError::InsufficientSpaceError { .. } => "insufficient_space",
            HdfWriteError::VerificationError { .. } => "verification_error",
            HdfWriteError::WriteInterruptedError { .. } => "write_interrupted",
        }
    }

    /// Whether a caller might reasonably succeed by simply retrying the same write.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HdfWriteError::InsufficientSpaceError { .. }
                | HdfWriteError::FileWriteError { .. }
                | HdfWriteError::WriteInterruptedError { .. }
        )
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        HdfWriteError::InvalidArgument { message: message.into() }
    }

    pub(crate) fn unsupported_feature(message: impl Into<String>) -> Self {
        HdfWriteError::UnsupportedFeature { message: message.into() }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HdfWriteError>;
