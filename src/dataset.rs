//! Dataset serializer: assembles one dataset's object header, delegating to the layout writers
//! for raw data placement and back-patching the layout message once the address is known.

use crate::array::ArrayView;
use crate::attrs::Attributes;
use crate::byte_writer::ByteWriter;
use crate::error::Result;
use crate::filters::FilterPipeline;
use crate::layout::{write_chunked, write_contiguous};
use crate::messages::{self, LayoutMessagePatch};
use crate::options::{Compression, Layout};
use std::path::Path;
use tracing::{debug, debug_span};

const CONTIGUOUS_THRESHOLD_BYTES: usize = 64 * 1024;

/// Serializes `array` as the dataset at `dataset_path`, honoring `layout`, `chunk_dims`,
/// `compression`, and `attrs`. Returns the dataset's object-header address.
pub fn write_dataset(
    w: &mut ByteWriter,
    dataset_path: &Path,
    array: &dyn ArrayView,
    layout: Layout,
    chunk_dims: Option<Vec<usize>>,
    compression: Compression,
    attrs: &Attributes,
) -> Result<u64> {
    let _span = debug_span!("write_dataset", path = %dataset_path.display()).entered();

    let element_size = array.dtype().element_size();
    let total_bytes = array.len() * element_size;
    let pipeline = build_pipeline(compression)?;

    let use_chunked = match layout {
        Layout::Chunked => true,
        Layout::Contiguous => false,
        Layout::Auto => !pipeline.is_empty() || total_bytes >= CONTIGUOUS_THRESHOLD_BYTES,
    };

    debug!(use_chunked, total_bytes, "layout decision");

    // Step 3: object-header v1 prefix, with num_messages and header_size back-patched once known.
    let object_header_addr = w.position();
    let header_patch = messages::write_object_header_prefix(w)?;

    let mut num_messages: u16 = 0;

    messages::write_dataspace_message(w, array.shape());
    num_messages += 1;
    messages::write_datatype_message(w, array.dtype());
    num_messages += 1;
    messages::write_fill_value_message(w, element_size);
    num_messages += 1;
    if use_chunked && !pipeline.is_empty() {
        messages::write_filter_pipeline_message(w, &pipeline)?;
        num_messages += 1;
    }
    for (name, value) in attrs.iter() {
        messages::write_attribute_message(w, name, value)?;
        num_messages += 1;
    }

    let layout_patch = if use_chunked {
        messages::write_chunked_layout_message(w, array.shape().len())
    } else {
        messages::write_contiguous_layout_message(w)
    };
    num_messages += 1;

    if use_chunked {
        let result = write_chunked(w, dataset_path, array, chunk_dims, &pipeline)?;
        let LayoutMessagePatch::Chunked { btree_addr_offset, chunk_dims_offset } = layout_patch
        else {
            unreachable!("chunked layout always produces a Chunked patch")
        };
        w.patch_u64(btree_addr_offset, result.btree_addr)?;
        for (i, &dim) in result.chunk_dims.iter().enumerate() {
            w.patch_u32(chunk_dims_offset + 4 * i as u64, dim as u32)?;
        }
        w.patch_u32(
            chunk_dims_offset + 4 * result.chunk_dims.len() as u64,
            element_size as u32,
        )?;
    } else {
        let data_address = write_contiguous(w, array);
        let LayoutMessagePatch::Contiguous { address_offset } = layout_patch else {
            unreachable!("contiguous layout always produces a Contiguous patch")
        };
        w.patch_u64(address_offset, data_address)?;
        w.patch_u64(address_offset + 8, total_bytes as u64)?;
    }

    messages::finish_object_header(w, &header_patch, num_messages)?;

    Ok(object_header_addr)
}

fn build_pipeline(compression: Compression) -> Result<FilterPipeline> {
    match compression {
        Compression::None => Ok(FilterPipeline::empty()),
        Compression::Gzip(level) => {
            Ok(FilterPipeline::single(Box::new(crate::filters::GzipFilter::new(level)?)))
        }
        Compression::Lzf => Ok(FilterPipeline::single(Box::new(crate::filters::LzfFilter))),
    }
}
