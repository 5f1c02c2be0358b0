//! Chunked layout writer and the auto-chunk rule.

use crate::array::ArrayView;
use crate::btree::{write_chunk_btree, WrittenChunkInfo};
use crate::byte_writer::ByteWriter;
use crate::dtype::Scalar;
use crate::error::{HdfWriteError, Result};
use crate::filters::FilterPipeline;
use std::path::Path;
use tracing::{debug, trace};

const TARGET_CHUNK_BYTES: usize = 1 << 20; // 1 MiB

/// What the data-layout message's chunked variant needs after chunking completes.
pub struct ChunkedResult {
    /// Address of the chunk B-tree's root node.
    pub btree_addr: u64,
    /// The chunk dimensions actually used (echoes the caller's choice, or the auto-picked one).
    pub chunk_dims: Vec<usize>,
    /// Number of chunks written (product of the chunk-grid extents).
    pub num_chunks: usize,
}

/// Iterates the chunk grid, filters and appends each chunk, and builds the chunk B-tree.
///
/// `chunk_dims` of `None` triggers the auto-chunk rule. When given explicitly, every
/// dimension must be in `1..=dataset_dims[d]`.
pub fn write_chunked(
    w: &mut ByteWriter,
    dataset_path: &Path,
    array: &dyn ArrayView,
    chunk_dims: Option<Vec<usize>>,
    pipeline: &FilterPipeline,
) -> Result<ChunkedResult> {
    let shape = array.shape().to_vec();
    let element_size = array.dtype().element_size();

    let chunk_dims = match chunk_dims {
        Some(dims) => {
            validate_explicit_chunk_dims(&dims, &shape)?;
            dims
        }
        None => auto_chunk_dims(&shape, element_size),
    };

    let grid_dims: Vec<usize> =
        shape.iter().zip(&chunk_dims).map(|(&s, &c)| s.div_ceil(c)).collect();
    let fill = Scalar::fill_value(array.dtype());

    debug!(?shape, ?chunk_dims, ?grid_dims, "writing chunked layout");

    let num_chunks: usize = grid_dims.iter().product();
    let mut written_chunks = Vec::with_capacity(num_chunks);
    for grid_idx in grid_positions(&grid_dims) {
        let start: Vec<usize> =
            grid_idx.iter().zip(&chunk_dims).map(|(&g, &c)| g * c).collect();
        let raw = gather_chunk_bytes(array, &shape, &chunk_dims, &start, fill);

        let (stored, filter_mask) = pipeline.apply(&raw)?;
        w.align_to(8)?;
        let address = w.position();
        w.write_bytes(&stored);

        trace!(?grid_idx, address, stored_len = stored.len(), raw_len = raw.len(), "wrote chunk");

        written_chunks.push(WrittenChunkInfo {
            grid_coords: grid_idx,
            address,
            size: stored.len() as u32,
            uncompressed_size: raw.len() as u32,
            filter_mask,
        });
    }

    w.align_to(8)?;
    let btree_addr = write_chunk_btree(w, dataset_path, &shape, &chunk_dims, &written_chunks)?;

    Ok(ChunkedResult { btree_addr, chunk_dims, num_chunks: written_chunks.len() })
}

fn validate_explicit_chunk_dims(chunk_dims: &[usize], shape: &[usize]) -> Result<()> {
    if chunk_dims.len() != shape.len() {
        return Err(HdfWriteError::invalid_argument(format!(
            "chunk_dims has {} dims but the dataset has {}",
            chunk_dims.len(),
            shape.len()
        )));
    }
    for (d, (&c, &s)) in chunk_dims.iter().zip(shape).enumerate() {
        if c == 0 || c > s {
            return Err(HdfWriteError::invalid_argument(format!(
                "chunk_dims[{d}]={c} must be in 1..={s}"
            )));
        }
    }
    Ok(())
}

fn gather_chunk_bytes(
    array: &dyn ArrayView,
    shape: &[usize],
    chunk_dims: &[usize],
    start: &[usize],
    fill: Scalar,
) -> Vec<u8> {
    let element_size = array.dtype().element_size();
    let mut raw = Vec::with_capacity(chunk_dims.iter().product::<usize>() * element_size);
    for local in grid_positions(chunk_dims) {
        let mut in_bounds = true;
        let mut coords = Vec::with_capacity(local.len());
        for d in 0..local.len() {
            let c = start[d] + local[d];
            if c >= shape[d] {
                in_bounds = false;
            }
            coords.push(c);
        }
        let scalar = if in_bounds { array.element_at(flat_index(&coords, shape)) } else { fill };
        scalar.encode_le(&mut raw);
    }
    raw
}

fn flat_index(coords: &[usize], shape: &[usize]) -> usize {
    let mut idx = 0;
    for (&c, &s) in coords.iter().zip(shape) {
        idx = idx * s + c;
    }
    idx
}

/// Enumerates every position in an n-D grid in row-major order (last axis fastest).
fn grid_positions(dims: &[usize]) -> Vec<Vec<usize>> {
    if dims.is_empty() || dims.iter().any(|&d| d == 0) {
        return Vec::new();
    }
    let total: usize = dims.iter().product();
    let mut result = Vec::with_capacity(total);
    let mut current = vec![0usize; dims.len()];
    for _ in 0..total {
        result.push(current.clone());
        for d in (0..dims.len()).rev() {
            current[d] += 1;
            if current[d] < dims[d] {
                break;
            }
            current[d] = 0;
        }
    }
    result
}

/// Picks `chunk_dims` so the chunk's byte size lands in `[target/2, target*2]`.
fn auto_chunk_dims(shape: &[usize], element_size: usize) -> Vec<usize> {
    let mut dims = shape.to_vec();
    let byte_size = |dims: &[usize]| -> usize { dims.iter().product::<usize>() * element_size };

    loop {
        if byte_size(&dims) <= TARGET_CHUNK_BYTES * 2 {
            break;
        }
        let Some((idx, &max_val)) =
            dims.iter().enumerate().max_by_key(|&(_, &d)| d)
        else {
            break;
        };
        let halved = max_val.div_ceil(2).max(1);
        if halved == max_val {
            break;
        }
        dims[idx] = halved;
    }

    loop {
        if byte_size(&dims) >= TARGET_CHUNK_BYTES / 2 {
            break;
        }
        let Some(idx) = smallest_growable_dim(&dims, shape) else { break };
        let doubled = (dims[idx] * 2).min(shape[idx]);
        if doubled == dims[idx] {
            break;
        }
        dims[idx] = doubled;
    }

    for d in &mut dims {
        *d = (*d).max(1);
    }
    dims
}

fn smallest_growable_dim(dims: &[usize], shape: &[usize]) -> Option<usize> {
    let min_val = dims
        .iter()
        .zip(shape)
        .filter(|&(&d, &s)| d < s)
        .map(|(&d, _)| d)
        .min()?;
    dims.iter().zip(shape).position(|(&d, &s)| d == min_val && d < s)
}
