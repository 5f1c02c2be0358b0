//! Writes multi-dimensional numeric arrays to the HDF5 v1 binary container format.
//!
//! HDF5 layers a superblock over a content-addressed graph of object headers (groups, datasets)
//! linked by absolute file offsets, indexes chunked datasets with an on-disk B-tree, and supports
//! pluggable filter pipelines per chunk. This crate writes that format, not reads it: a single
//! call serializes one or more named arrays to a file that any conforming HDF5 reader (e.g.
//! h5py) can open.
//!
//! The entry points are [`write_array`], [`write_multiple`], and [`write_data_cube`]. Everything
//! else — [`ByteWriter`](byte_writer::ByteWriter), the filter pipeline, the chunk B-tree, the
//! object-header message builders, the dataset serializer, and the file assembler — is exposed
//! for composition and testing but is not meant to be driven directly by most callers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod array;
mod assembler;
mod attrs;
mod btree;
mod byte_writer;
mod dataset;
mod dtype;
mod error;
mod file_writer;
mod filters;
mod layout;
mod messages;
mod options;

pub use array::{ArrayView, DataCube, NdArray};
pub use attrs::{AttrValue, Attributes};
pub use byte_writer::{ByteWriter, Endian};
pub use dtype::{DType, Scalar};
pub use error::{HdfWriteError, Result};
pub use file_writer::cleanup_temp_files;
pub use filters::{FilterPipeline, GzipFilter, LzfFilter};
pub use options::{Compression, Layout, WriteOptions};

use assembler::DatasetSpec;
use std::path::Path;
use tracing::info_span;

/// Writes a single array to `path` as one dataset, per `options`.
///
/// On success, `path` contains a complete HDF5 file and no `path.tmp` sibling remains. On
/// failure, `path` is left exactly as it was before the call (see [`HdfWriteError`]).
pub fn write_array(
    path: impl AsRef<Path>,
    array: &dyn ArrayView,
    options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let _span = info_span!("write_array", path = %path.display(), dataset = %options.dataset).entered();
    let spec = DatasetSpec {
        path: options.dataset.clone(),
        array,
        layout: options.layout,
        chunk_dims: options.chunk_dims.clone(),
        compression: options.compression,
        attrs: options.attrs.clone(),
    };
    let bytes = assembler::assemble(std::slice::from_ref(&spec))?;
    file_writer::write_file_atomic(path, &bytes)
}

/// Writes several named arrays to a single file at `path`.
///
/// Every dataset shares `default_options`' layout, chunk dimensions, compression, and attribute
/// set; `default_options.dataset` is ignored in favor of each entry's own path.
pub fn write_multiple(
    path: impl AsRef<Path>,
    datasets: &[(String, &dyn ArrayView)],
    default_options: &WriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let _span = info_span!("write_multiple", path = %path.display(), count = datasets.len()).entered();
    let specs: Vec<DatasetSpec> = datasets
        .iter()
        .map(|(dataset_path, array)| DatasetSpec {
            path: dataset_path.clone(),
            array: *array,
            layout: default_options.layout,
            chunk_dims: default_options.chunk_dims.clone(),
            compression: default_options.compression,
            attrs: default_options.attrs.clone(),
        })
        .collect();
    let bytes = assembler::assemble(&specs)?;
    file_writer::write_file_atomic(path, &bytes)
}

/// Convenience wrapper for writing a [`DataCube`] as a 3-D array.
pub fn write_data_cube(path: impl AsRef<Path>, cube: &DataCube, options: &WriteOptions) -> Result<()> {
    write_array(path, cube.as_array_view(), options)
}
