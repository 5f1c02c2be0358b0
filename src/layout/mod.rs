//! Layout writers: the two strategies for placing a dataset's raw bytes.
//!
//! Both writers share the same contract: append bytes through the shared [`ByteWriter`] and
//! return whatever the data-layout message needs to point back at them.

mod chunked;
mod contiguous;

pub use chunked::{write_chunked, ChunkedResult};
pub use contiguous::write_contiguous;
