//! B-tree v1 chunk index: the on-disk structure mapping chunk coordinates to
//! `(address, stored size, filter mask)`.
//!
//! Only the single-node (leaf-is-root) case is implemented; multi-level splitting is out of
//! scope, so datasets whose chunk count exceeds the conservative node capacity fail with
//! [`HdfWriteError::TooManyChunks`].

use crate::byte_writer::ByteWriter;
use crate::error::{HdfWriteError, Result};
use std::path::Path;
use tracing::trace;

/// Sentinel meaning "no address" in HDF5's v1 B-tree sibling pointers.
pub const UNDEFINED_ADDR: u64 = u64::MAX;

/// A conservative cap on the number of chunk records a single B-tree node may hold, since this
/// writer never splits nodes.
pub const MAX_CHUNKS_PER_NODE: usize = 2048;

/// One chunk's entry in the chunk index: everything [`crate::btree::write_chunk_btree`] needs to
/// emit a B-tree record for it.
#[derive(Clone, Debug)]
pub struct WrittenChunkInfo {
    /// Chunk-grid coordinates (not byte-scaled).
    pub grid_coords: Vec<usize>,
    /// Absolute file offset of the chunk's stored bytes.
    pub address: u64,
    /// Stored (post-filter) byte length.
    pub size: u32,
    /// Raw (pre-filter) byte length.
    pub uncompressed_size: u32,
    /// Filter bypass mask for this chunk.
    pub filter_mask: u32,
}

/// Emits the chunk B-tree rooted at the writer's current (8-aligned) position and returns its
/// address.
///
/// `chunk_dims` and `dataset_shape` have the same length (`ndim`); `chunks` is expected to
/// already be in row-major chunk-grid order, which — because `scaled_coords[d] = grid_index[d] *
/// chunk_dims[d]` is monotonic in grid order — is also lexicographic coordinate order.
pub fn write_chunk_btree(
    w: &mut ByteWriter,
    dataset_path: &Path,
    dataset_shape: &[usize],
    chunk_dims: &[usize],
    chunks: &[WrittenChunkInfo],
) -> Result<u64> {
    if chunks.len() > MAX_CHUNKS_PER_NODE {
        return Err(HdfWriteError::TooManyChunks {
            path: dataset_path.to_path_buf(),
            chunk_count: chunks.len(),
            capacity: MAX_CHUNKS_PER_NODE,
        });
    }

    let ndim = chunk_dims.len();
    w.align_to(8)?;
    let root_addr = w.position();

    trace!(root_addr, num_entries = chunks.len(), "writing chunk b-tree node");

    w.write_bytes(b"TREE");
    w.write_u8(1); // node_type = chunk
    w.write_u8(0); // node_level = 0 (leaf)
    w.write_u16(chunks.len() as u16);
    w.write_u64(UNDEFINED_ADDR); // left sibling
    w.write_u64(UNDEFINED_ADDR); // right sibling

    for chunk in chunks {
        write_key(w, chunk.size, chunk.filter_mask, &scaled_coords(&chunk.grid_coords, chunk_dims));
        w.write_u64(chunk.address);
    }

    // Trailing sentinel key: size=0, mask=0, coords=dataset_shape.
    let sentinel_coords: Vec<u64> = dataset_shape.iter().map(|&d| d as u64).collect();
    write_key(w, 0, 0, &sentinel_coords);

    debug_assert_eq!(ndim, dataset_shape.len());
    Ok(root_addr)
}

fn scaled_coords(grid_coords: &[usize], chunk_dims: &[usize]) -> Vec<u64> {
    grid_coords.iter().zip(chunk_dims).map(|(&g, &c)| (g * c) as u64).collect()
}

fn write_key(w: &mut ByteWriter, chunk_size: u32, filter_mask: u32, coords: &[u64]) {
    w.write_u32(chunk_size);
    w.write_u32(filter_mask);
    for &c in coords {
        w.write_u64(c);
    }
    w.write_u64(0); // trailing dtype-element coordinate, always 0
}
