//! File assembler: superblock, root group, and the per-dataset write schedule.
//!
//! This is the only component that knows the full set of datasets up front, which is what lets
//! it build the root group's local heap, B-tree, and symbol table node *before* any dataset is
//! serialized — every address those structures need already exists by the time it's referenced,
//! so the only back-patches left are each SNOD entry's object-header address and the
//! superblock's end-of-file address.

use crate::array::ArrayView;
use crate::attrs::Attributes;
use crate::btree::UNDEFINED_ADDR;
use crate::byte_writer::{ByteWriter, Endian};
use crate::dataset;
use crate::error::{HdfWriteError, Result};
use crate::messages::{self, MSG_SYMBOL_TABLE};
use crate::options::{Compression, Layout};
use std::path::Path;
use tracing::{debug, debug_span};

/// One dataset to be written as part of a single file.
pub struct DatasetSpec<'a> {
    /// Dataset path, beginning with `/` (single level; nested groups are not supported).
    pub path: String,
    /// Source of shape, dtype, and element data.
    pub array: &'a dyn ArrayView,
    /// Layout selection strategy.
    pub layout: Layout,
    /// Explicit chunk dimensions, if any.
    pub chunk_dims: Option<Vec<usize>>,
    /// Compression filter.
    pub compression: Compression,
    /// Attached attributes.
    pub attrs: Attributes,
}

struct SuperblockPatch {
    eof_addr_offset: u64,
    root_header_addr_offset: u64,
    scratch_offset: u64,
}

/// Builds the complete in-memory file for `datasets` and returns its bytes.
pub fn assemble(datasets: &[DatasetSpec]) -> Result<Vec<u8>> {
    let _span = debug_span!("assemble", num_datasets = datasets.len()).entered();

    let leaf_names = validate_and_extract_leaf_names(datasets)?;

    // Dataset names are written to the root group in sorted order so the group B-tree's
    // lexicographic key ordering (mirroring the chunk B-tree's) is reproducible.
    let mut order: Vec<usize> = (0..datasets.len()).collect();
    order.sort_by(|&a, &b| leaf_names[a].cmp(&leaf_names[b]));

    let mut w = ByteWriter::new(Endian::Little);
    let sb_patch = write_superblock(&mut w);

    let sorted_names: Vec<String> = order.iter().map(|&i| leaf_names[i].clone()).collect();
    let (heap_addr, heap_offsets) = write_local_heap(&mut w, &sorted_names)?;
    let (snod_addr, obj_header_patch_offsets) =
        write_group_snod(&mut w, &sorted_names, &heap_offsets)?;
    let group_btree_addr = write_group_btree(&mut w, &heap_offsets, snod_addr)?;
    let root_header_addr = write_root_group_header(&mut w, group_btree_addr, heap_addr)?;

    w.patch_u64(sb_patch.root_header_addr_offset, root_header_addr)?;
    w.patch_u64(sb_patch.scratch_offset, group_btree_addr)?;
    w.patch_u64(sb_patch.scratch_offset + 8, heap_addr)?;

    for (slot, &original_index) in order.iter().enumerate() {
        let spec = &datasets[original_index];
        debug!(path = %spec.path, "writing dataset");
        let dataset_header_addr = dataset::write_dataset(
            &mut w,
            Path::new(&spec.path),
            spec.array,
            spec.layout,
            spec.chunk_dims.clone(),
            spec.compression,
            &spec.attrs,
        )?;
        w.patch_u64(obj_header_patch_offsets[slot], dataset_header_addr)?;
    }

    let eof = w.position();
    w.patch_u64(sb_patch.eof_addr_offset, eof)?;

    Ok(w.into_bytes())
}

fn validate_and_extract_leaf_names(datasets: &[DatasetSpec]) -> Result<Vec<String>> {
    let mut leaf_names = Vec::with_capacity(datasets.len());
    let mut seen = std::collections::HashSet::new();
    for spec in datasets {
        let Some(rest) = spec.path.strip_prefix('/') else {
            return Err(HdfWriteError::unsupported_feature(format!(
                "dataset path {:?} must start with '/'",
                spec.path
            )));
        };
        if rest.is_empty() || rest.contains('/') {
            return Err(HdfWriteError::unsupported_feature(format!(
                "dataset path {:?} has nested groups, which are not supported",
                spec.path
            )));
        }
        if !seen.insert(rest.to_string()) {
            return Err(HdfWriteError::unsupported_feature(format!(
                "dataset path {:?} is written more than once",
                spec.path
            )));
        }
        leaf_names.push(rest.to_string());
    }
    Ok(leaf_names)
}

fn write_superblock(w: &mut ByteWriter) -> SuperblockPatch {
    w.write_bytes(b"\x89HDF\r\n\x1a\n");
    w.write_u8(0); // superblock version
    w.write_u8(0); // free-space storage version
    w.write_u8(0); // root group symbol-table version
    w.write_u8(0); // reserved
    w.write_u8(0); // shared header message format version
    w.write_u8(8); // size of offsets
    w.write_u8(8); // size of lengths
    w.write_u8(0); // reserved
    w.write_u16(4); // group leaf node k
    w.write_u16(16); // group internal node k
    w.write_u32(0); // file consistency flags
    w.write_u64(0); // base address
    w.write_u64(UNDEFINED_ADDR); // free-space address
    let eof_addr_offset = w.position();
    w.write_u64(0); // end-of-file address, patched once the buffer is complete
    w.write_u64(UNDEFINED_ADDR); // driver information block address

    // Root group symbol-table entry.
    w.write_u64(0); // link name offset: root has no name of its own
    let root_header_addr_offset = w.position();
    w.write_u64(0); // object header address, patched below
    w.write_u32(1); // cache type 1: scratch-pad holds (btree_addr, heap_addr)
    w.write_u32(0); // reserved
    let scratch_offset = w.position();
    w.write_u64(0); // scratch: group b-tree address
    w.write_u64(0); // scratch: local heap address

    SuperblockPatch { eof_addr_offset, root_header_addr_offset, scratch_offset }
}

fn write_local_heap(w: &mut ByteWriter, names: &[String]) -> Result<(u64, Vec<u64>)> {
    let mut data = Vec::new();
    data.extend_from_slice(&[0u8; 8]); // reserved null-string slot at offset 0
    let mut offsets = Vec::with_capacity(names.len());
    for name in names {
        offsets.push(data.len() as u64);
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        while data.len() % 8 != 0 {
            data.push(0);
        }
    }

    w.align_to(8)?;
    let heap_addr = w.position();
    w.write_bytes(b"HEAP");
    w.write_u8(0); // version
    w.write_zeros(3);
    w.write_u64(data.len() as u64); // data segment size
    w.write_u64(UNDEFINED_ADDR); // no free list
    let data_addr_offset = w.position();
    w.write_u64(0); // data segment address, patched below
    w.align_to(8)?;
    let data_addr = w.position();
    w.write_bytes(&data);
    w.patch_u64(data_addr_offset, data_addr)?;

    Ok((heap_addr, offsets))
}

fn write_group_snod(
    w: &mut ByteWriter,
    names: &[String],
    heap_offsets: &[u64],
) -> Result<(u64, Vec<u64>)> {
    w.align_to(8)?;
    let snod_addr = w.position();
    w.write_bytes(b"SNOD");
    w.write_u8(1); // version
    w.write_u8(0); // reserved
    w.write_u16(names.len() as u16);

    let mut obj_header_patch_offsets = Vec::with_capacity(names.len());
    for &heap_offset in heap_offsets {
        w.write_u64(heap_offset);
        let oh_offset = w.position();
        w.write_u64(0); // object header address, patched once the dataset is written
        obj_header_patch_offsets.push(oh_offset);
        w.write_u32(0); // cache type 0: no cached info for a dataset entry
        w.write_u32(0); // reserved
        w.write_zeros(16); // scratch-pad, unused for cache type 0
    }

    Ok((snod_addr, obj_header_patch_offsets))
}

fn write_group_btree(w: &mut ByteWriter, heap_offsets: &[u64], snod_addr: u64) -> Result<u64> {
    w.align_to(8)?;
    let addr = w.position();
    w.write_bytes(b"TREE");
    w.write_u8(0); // node type: group
    w.write_u8(0); // node level: leaf
    w.write_u16(if heap_offsets.is_empty() { 0 } else { 1 });
    w.write_u64(UNDEFINED_ADDR); // left sibling
    w.write_u64(UNDEFINED_ADDR); // right sibling

    match (heap_offsets.iter().min(), heap_offsets.iter().max()) {
        (Some(&min_offset), Some(&max_offset)) => {
            w.write_u64(min_offset);
            w.write_u64(snod_addr);
            w.write_u64(max_offset);
        }
        _ => w.write_u64(0), // single bracketing key for an empty group
    }

    Ok(addr)
}

fn write_root_group_header(w: &mut ByteWriter, btree_addr: u64, heap_addr: u64) -> Result<u64> {
    let header_addr = w.position();
    let header_patch = messages::write_object_header_prefix(w)?;

    let mut symtab_body = ByteWriter::new(w.endian());
    symtab_body.write_u64(btree_addr);
    symtab_body.write_u64(heap_addr);
    messages::write_message(w, MSG_SYMBOL_TABLE, &symtab_body.into_bytes());

    messages::finish_object_header(w, &header_patch, 1)?;

    Ok(header_addr)
}
