//! A minimal, test-only HDF5 reader.
//!
//! Implements just enough of the v1 format — superblock, object-header v1 message iteration,
//! contiguous/chunked layout, B-tree v1 leaf traversal, gzip/LZF decode — to check the testable
//! properties in the dataset serializer's design notes. This is scaffolding for these tests, not
//! a step toward an HDF5 reader in the library itself: it assumes every structure this crate's
//! own writer produces (single-leaf B-trees, one SNOD, 8-aligned object headers) and does not
//! handle the general case a real HDF5 file could contain.

use hdf5_writer::{AttrValue, DType};
use std::convert::TryInto;

const UNDEFINED_ADDR: u64 = u64::MAX;

pub struct FileReader {
    bytes: Vec<u8>,
    root_btree_addr: u64,
    root_heap_addr: u64,
}

pub struct ChunkRecord {
    pub stored_size: u32,
    pub uncompressed_size: u32,
    pub filter_mask: u32,
}

struct DatasetHeader {
    shape: Vec<usize>,
    dtype: DType,
    attrs: Vec<(String, AttrValue)>,
    layout: Layout,
}

enum Layout {
    Contiguous { address: u64, size: u64 },
    Chunked { btree_addr: u64, chunk_dims: Vec<usize> },
}

fn u16_at(b: &[u8], off: usize) -> u16 {
    u16::from_le_bytes(b[off..off + 2].try_into().unwrap())
}
fn u32_at(b: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(b[off..off + 4].try_into().unwrap())
}
fn u64_at(b: &[u8], off: usize) -> u64 {
    u64::from_le_bytes(b[off..off + 8].try_into().unwrap())
}

impl FileReader {
    /// Parses the superblock and root group, leaving per-dataset parsing lazy.
    pub fn open(bytes: Vec<u8>) -> Self {
        assert_eq!(&bytes[0..8], b"\x89HDF\r\n\x1a\n", "bad signature");
        assert_eq!(bytes[13], 8, "size of offsets must be 8");
        assert_eq!(bytes[14], 8, "size of lengths must be 8");

        let root_header_addr = u64_at(&bytes, 64);
        let (root_btree_addr, root_heap_addr) = {
            let messages = iter_messages(&bytes, root_header_addr as usize);
            let symtab = messages
                .into_iter()
                .find(|m| m.type_id == 0x0011)
                .expect("root group has no symbol table message");
            (u64_at(&bytes, symtab.body_start), u64_at(&bytes, symtab.body_start + 8))
        };

        FileReader { bytes, root_btree_addr, root_heap_addr }
    }

    /// Lists every top-level dataset name, in the order the group B-tree's single SNOD holds
    /// them (this writer stores them lexicographically sorted, see DESIGN.md).
    pub fn list_top_level_datasets(&self) -> Vec<String> {
        let snod_addr = self.group_snod_addr();
        let b = &self.bytes;
        assert_eq!(&b[snod_addr..snod_addr + 4], b"SNOD");
        let count = u16_at(b, snod_addr + 6) as usize;
        let mut names = Vec::with_capacity(count);
        let mut off = snod_addr + 8;
        for _ in 0..count {
            let heap_offset = u64_at(b, off) as usize;
            names.push(self.read_heap_string(heap_offset));
            off += 40;
        }
        names
    }

    fn group_snod_addr(&self) -> usize {
        let b = &self.bytes;
        let addr = self.root_btree_addr as usize;
        assert_eq!(&b[addr..addr + 4], b"TREE");
        assert_eq!(b[addr + 4], 0, "expected a group (node_type 0) b-tree");
        let num_entries = u16_at(b, addr + 6) as usize;
        if num_entries == 0 {
            panic!("empty group has no datasets");
        }
        // header(24) + key0(8) + child0(8) + key1(8)
        u64_at(b, addr + 24 + 8) as usize
    }

    fn read_heap_string(&self, heap_offset: usize) -> String {
        let b = &self.bytes;
        let heap_addr = self.root_heap_addr as usize;
        assert_eq!(&b[heap_addr..heap_addr + 4], b"HEAP");
        let data_addr = u64_at(b, heap_addr + 24) as usize;
        let start = data_addr + heap_offset;
        let end = b[start..].iter().position(|&c| c == 0).map(|p| start + p).unwrap();
        String::from_utf8(b[start..end].to_vec()).unwrap()
    }

    fn header_addr_for(&self, dataset: &str) -> u64 {
        let snod_addr = self.group_snod_addr();
        let b = &self.bytes;
        let count = u16_at(b, snod_addr + 6) as usize;
        let mut off = snod_addr + 8;
        for _ in 0..count {
            let heap_offset = u64_at(b, off) as usize;
            if self.read_heap_string(heap_offset) == dataset {
                return u64_at(b, off + 8);
            }
            off += 40;
        }
        panic!("no such dataset: {dataset}");
    }

    fn dataset_header(&self, dataset: &str) -> DatasetHeader {
        let header_addr = self.header_addr_for(dataset);
        let messages = iter_messages(&self.bytes, header_addr as usize);

        let mut shape = Vec::new();
        let mut dtype = DType::Float64;
        let mut attrs = Vec::new();
        let mut layout = None;

        for m in &messages {
            match m.type_id {
                0x0001 => shape = decode_dataspace(&self.bytes, m.body_start),
                0x0003 => dtype = decode_datatype(&self.bytes, m.body_start).0,
                0x0008 => layout = Some(decode_layout(&self.bytes, m.body_start, shape.len())),
                0x000C => attrs.push(decode_attribute(&self.bytes, m.body_start)),
                _ => {}
            }
        }

        DatasetHeader { shape, dtype, attrs, layout: layout.expect("dataset has no layout message") }
    }

    pub fn shape(&self, dataset: &str) -> Vec<usize> {
        self.dataset_header(dataset).shape
    }

    pub fn dtype(&self, dataset: &str) -> DType {
        self.dataset_header(dataset).dtype
    }

    pub fn attributes(&self, dataset: &str) -> Vec<(String, AttrValue)> {
        self.dataset_header(dataset).attrs
    }

    /// Reads every chunk record from the dataset's B-tree leaf, in on-disk order.
    pub fn chunk_records(&self, dataset: &str) -> Vec<ChunkRecord> {
        let header = self.dataset_header(dataset);
        let Layout::Chunked { btree_addr, chunk_dims } = header.layout else {
            panic!("{dataset} is not chunked");
        };
        let ndim = chunk_dims.len();
        let b = &self.bytes;
        let addr = btree_addr as usize;
        assert_eq!(&b[addr..addr + 4], b"TREE");
        assert_eq!(b[addr + 4], 1, "expected a chunk (node_type 1) b-tree");
        let num_entries = u16_at(b, addr + 6) as usize;

        let key_size = 8 + (ndim + 1) * 8; // chunk_size + filter_mask + (ndim+1) coords
        let record_size = key_size + 8; // + child address
        let mut out = Vec::with_capacity(num_entries);
        let mut off = addr + 24;
        for _ in 0..num_entries {
            let stored_size = u32_at(b, off);
            let filter_mask = u32_at(b, off + 4);
            out.push(ChunkRecord {
                stored_size,
                uncompressed_size: (chunk_dims.iter().product::<usize>()
                    * header.dtype.element_size()) as u32,
                filter_mask,
            });
            off += record_size;
        }
        out
    }

    /// Reads the whole dataset back as a flat, row-major little-endian byte buffer matching the
    /// dataset's declared shape (fill-value padding from chunked storage is trimmed away).
    pub fn read_raw_elements(&self, dataset: &str) -> Vec<u8> {
        let header = self.dataset_header(dataset);
        let element_size = header.dtype.element_size();
        match header.layout {
            Layout::Contiguous { address, size } => {
                self.bytes[address as usize..(address + size) as usize].to_vec()
            }
            Layout::Chunked { btree_addr, ref chunk_dims } => {
                self.read_chunked(btree_addr, &header.shape, chunk_dims, element_size)
            }
        }
    }

    fn read_chunked(
        &self,
        btree_addr: u64,
        shape: &[usize],
        chunk_dims: &[usize],
        element_size: usize,
    ) -> Vec<u8> {
        let b = &self.bytes;
        let ndim = chunk_dims.len();
        let addr = btree_addr as usize;
        let num_entries = u16_at(b, addr + 6) as usize;
        let key_size = 8 + (ndim + 1) * 8;
        let record_size = key_size + 8;

        let total: usize = shape.iter().product();
        let mut out = vec![0u8; total * element_size];

        let mut off = addr + 24;
        for _ in 0..num_entries {
            let stored_size = u32_at(b, off) as usize;
            let filter_mask = u32_at(b, off + 4);
            let mut coords = Vec::with_capacity(ndim);
            for d in 0..ndim {
                coords.push(u64_at(b, off + 8 + 8 * d) as usize);
            }
            let address = u64_at(b, off + key_size) as usize;
            let stored = &b[address..address + stored_size];
            let uncompressed_len = chunk_dims.iter().product::<usize>() * element_size;
            let raw = decode_chunk(stored, filter_mask, uncompressed_len);

            copy_chunk_into(&raw, &coords, chunk_dims, shape, element_size, &mut out);

            off += record_size;
        }
        out
    }
}

fn copy_chunk_into(
    raw: &[u8],
    start: &[usize],
    chunk_dims: &[usize],
    shape: &[usize],
    element_size: usize,
    out: &mut [u8],
) {
    let ndim = chunk_dims.len();
    let local_total: usize = chunk_dims.iter().product();
    let mut local = vec![0usize; ndim];
    for flat in 0..local_total {
        let mut rem = flat;
        for d in (0..ndim).rev() {
            local[d] = rem % chunk_dims[d];
            rem /= chunk_dims[d];
        }
        let mut in_bounds = true;
        let mut global_flat = 0usize;
        for d in 0..ndim {
            let c = start[d] + local[d];
            if c >= shape[d] {
                in_bounds = false;
            }
            global_flat = global_flat * shape[d] + c;
        }
        if in_bounds {
            let src = flat * element_size;
            let dst = global_flat * element_size;
            out[dst..dst + element_size].copy_from_slice(&raw[src..src + element_size]);
        }
    }
}

fn decode_chunk(stored: &[u8], filter_mask: u32, uncompressed_len: usize) -> Vec<u8> {
    if filter_mask & 1 != 0 {
        return stored.to_vec();
    }
    // Single-filter pipelines only, matching this crate's write path; decode by trying zlib
    // first, falling back to LZF, since the filter id isn't threaded through the b-tree key.
    if let Ok(decoded) = decode_zlib(stored) {
        return decoded;
    }
    lzf::decompress(stored, uncompressed_len).expect("chunk decode failed for both codecs")
}

fn decode_zlib(stored: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;
    let mut decoder = ZlibDecoder::new(stored);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

struct Message {
    type_id: u16,
    body_start: usize,
}

fn iter_messages(bytes: &[u8], header_addr: usize) -> Vec<Message> {
    let num_messages = u16_at(bytes, header_addr + 2);
    let header_size = u32_at(bytes, header_addr + 8) as usize;
    let body_start = header_addr + 16;
    let mut out = Vec::with_capacity(num_messages as usize);
    let mut off = body_start;
    let end = body_start + header_size;
    while off < end {
        let type_id = u16_at(bytes, off);
        let size = u16_at(bytes, off + 2) as usize;
        out.push(Message { type_id, body_start: off + 8 });
        off += 8 + size;
    }
    assert_eq!(out.len(), num_messages as usize, "message count mismatch");
    out
}

fn decode_dataspace(bytes: &[u8], body_start: usize) -> Vec<usize> {
    let rank = bytes[body_start + 1] as usize;
    let mut dims = Vec::with_capacity(rank);
    for i in 0..rank {
        dims.push(u64_at(bytes, body_start + 8 + 8 * i) as usize);
    }
    dims
}

fn decode_datatype(bytes: &[u8], body_start: usize) -> (DType, usize) {
    let class = bytes[body_start] & 0x0F;
    let size = u32_at(bytes, body_start + 4) as usize;
    let dtype = match (class, size) {
        (1, 8) => DType::Float64,
        (1, 4) => DType::Float32,
        (0, 8) => DType::Int64,
        (0, 4) => DType::Int32,
        (3, _) => DType::Float64, // strings have no DType counterpart; caller ignores this case
        _ => panic!("unrecognized datatype class {class} size {size}"),
    };
    (dtype, size)
}

fn decode_layout(bytes: &[u8], body_start: usize, ndim: usize) -> Layout {
    let class = bytes[body_start + 1];
    match class {
        1 => Layout::Contiguous {
            address: u64_at(bytes, body_start + 2),
            size: u64_at(bytes, body_start + 10),
        },
        2 => {
            let btree_addr = u64_at(bytes, body_start + 3);
            let dims_start = body_start + 11;
            let chunk_dims: Vec<usize> =
                (0..ndim).map(|i| u32_at(bytes, dims_start + 4 * i) as usize).collect();
            Layout::Chunked { btree_addr, chunk_dims }
        }
        other => panic!("unsupported layout class {other}"),
    }
}

fn decode_attribute(bytes: &[u8], body_start: usize) -> (String, AttrValue) {
    let name_size = u16_at(bytes, body_start + 2) as usize;
    let dt_size = u16_at(bytes, body_start + 4) as usize;
    let ds_size = u16_at(bytes, body_start + 6) as usize;

    let name_start = body_start + 8;
    let name_end = bytes[name_start..].iter().position(|&c| c == 0).map(|p| name_start + p).unwrap();
    let name = String::from_utf8(bytes[name_start..name_end].to_vec()).unwrap();

    let dt_start = name_start + name_size;
    let class = bytes[dt_start] & 0x0F;
    let value_start = dt_start + dt_size + ds_size;

    let value = if class == 3 {
        let byte_len = u32_at(bytes, dt_start + 4) as usize;
        let s = String::from_utf8(bytes[value_start..value_start + byte_len].to_vec()).unwrap();
        AttrValue::Str(s)
    } else {
        let (dtype, size) = decode_datatype(bytes, dt_start);
        match (dtype, size) {
            (DType::Float64, 8) => {
                AttrValue::F64(f64::from_le_bytes(bytes[value_start..value_start + 8].try_into().unwrap()))
            }
            (DType::Int64, 8) => {
                AttrValue::I64(i64::from_le_bytes(bytes[value_start..value_start + 8].try_into().unwrap()))
            }
            _ => panic!("unsupported attribute numeric dtype"),
        }
    };

    (name, value)
}
