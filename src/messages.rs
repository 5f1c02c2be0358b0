//! Object-header message builders.
//!
//! Every builder wraps its payload in the common `(type_id, size, flags, reserved)` message
//! header via [`write_message`], which pads the payload to a multiple of 8 and reports its
//! size accordingly. Layout messages additionally report where their address fields live so
//! [`crate::dataset`] can back-patch them once the raw data or B-tree has been written.

use crate::attrs::AttrValue;
use crate::byte_writer::ByteWriter;
use crate::dtype::DType;
use crate::error::Result;
use crate::filters::FilterPipeline;

/// Dataspace message type id.
pub const MSG_DATASPACE: u16 = 0x0001;
/// Datatype message type id.
pub const MSG_DATATYPE: u16 = 0x0003;
/// Fill-value message type id.
pub const MSG_FILL_VALUE: u16 = 0x0005;
/// Data-layout message type id.
pub const MSG_DATA_LAYOUT: u16 = 0x0008;
/// Filter-pipeline message type id.
pub const MSG_FILTER_PIPELINE: u16 = 0x000B;
/// Attribute message type id.
pub const MSG_ATTRIBUTE: u16 = 0x000C;
/// Symbol-table message type id (root/group object headers).
pub const MSG_SYMBOL_TABLE: u16 = 0x0011;

fn round_up_8(n: usize) -> usize {
    n.div_ceil(8) * 8
}

/// Writes `(type_id, size, flags=0, reserved[3])` followed by `body` padded to a multiple of 8.
///
/// Returns the absolute offset where `body` begins, i.e. right after the 8-byte header — callers
/// that need to back-patch a field inside `body` add the field's local offset to this value.
pub(crate) fn write_message(w: &mut ByteWriter, type_id: u16, body: &[u8]) -> u64 {
    let padded_len = round_up_8(body.len());
    w.write_u16(type_id);
    w.write_u16(padded_len as u16);
    w.write_u8(0);
    w.write_zeros(3);
    let body_start = w.position();
    w.write_bytes(body);
    w.write_zeros(padded_len - body.len());
    body_start
}

fn dataspace_body(endian: crate::byte_writer::Endian, shape: &[usize]) -> Vec<u8> {
    let mut body = ByteWriter::new(endian);
    body.write_u8(1); // version
    body.write_u8(shape.len() as u8); // rank
    body.write_u8(0); // flags: max_dims_present = 0
    body.write_zeros(4); // reserved
    for &d in shape {
        body.write_u64(d as u64);
    }
    body.into_bytes()
}

/// Emits a dataspace message (0x0001, v1). Rank 0 (`shape` empty) is the scalar dataspace.
pub fn write_dataspace_message(w: &mut ByteWriter, shape: &[usize]) {
    let body = dataspace_body(w.endian(), shape);
    write_message(w, MSG_DATASPACE, &body);
}

fn numeric_datatype_body(endian: crate::byte_writer::Endian, dtype: DType) -> Vec<u8> {
    let mut body = ByteWriter::new(endian);
    let element_size = dtype.element_size();
    let precision = (element_size * 8) as u16;

    if dtype.is_float() {
        body.write_u8(0x11); // version 1, class 1 (floating-point)
        body.write_u8(0x40); // mantissa normalization = implied leading bit
        body.write_u8((precision - 1) as u8); // sign bit location
        body.write_u8(0); // reserved
        body.write_u32(element_size as u32);
        body.write_u16(0); // bit offset
        body.write_u16(precision);
        let (exp_location, exp_size, mant_size, exp_bias) = match dtype {
            DType::Float64 => (52u8, 11u8, 52u8, 1023u32),
            DType::Float32 => (23u8, 8u8, 23u8, 127u32),
            _ => unreachable!("non-float dtype in float branch"),
        };
        body.write_u8(exp_location);
        body.write_u8(exp_size);
        body.write_u8(0); // mantissa location
        body.write_u8(mant_size);
        body.write_u32(exp_bias);
    } else {
        body.write_u8(0x10); // version 1, class 0 (fixed-point)
        body.write_u8(0x08); // signed
        body.write_zeros(2);
        body.write_u32(element_size as u32);
        body.write_u16(0); // bit offset
        body.write_u16(precision);
    }

    body.into_bytes()
}

fn string_datatype_body(endian: crate::byte_writer::Endian, byte_len: usize) -> Vec<u8> {
    let mut body = ByteWriter::new(endian);
    body.write_u8(0x13); // version 1, class 3 (string)
    body.write_u8(0x11); // padding type = null pad, character set = UTF-8
    body.write_zeros(2);
    body.write_u32(byte_len as u32);
    body.into_bytes()
}

/// Emits a datatype message (0x0003, v1) for one of the four numeric dtypes.
pub fn write_datatype_message(w: &mut ByteWriter, dtype: DType) {
    let body = numeric_datatype_body(w.endian(), dtype);
    write_message(w, MSG_DATATYPE, &body);
}

/// Emits a fill-value message (0x0005, v3): the fill value is always zero-valued.
pub fn write_fill_value_message(w: &mut ByteWriter, element_size: usize) {
    let mut body = ByteWriter::new(w.endian());
    body.write_u8(3); // version
    body.write_u8(0x09); // flags: fill value defined + write on allocation
    body.write_u32(element_size as u32);
    body.write_zeros(element_size);
    write_message(w, MSG_FILL_VALUE, &body.into_bytes());
}

/// Emits a filter-pipeline message (0x000B, v2).
pub fn write_filter_pipeline_message(w: &mut ByteWriter, pipeline: &FilterPipeline) -> Result<()> {
    let mut body = ByteWriter::new(w.endian());
    pipeline.write_message_body(&mut body)?;
    write_message(w, MSG_FILTER_PIPELINE, &body.into_bytes());
    Ok(())
}

/// Where the address field(s) of a just-written data-layout message live, so the dataset
/// serializer can back-patch them once the raw data or chunk B-tree has a final address.
pub enum LayoutMessagePatch {
    /// Contiguous layout: one `u64` address field, immediately followed by the size field.
    Contiguous {
        /// Absolute offset of the `u64 address` field.
        address_offset: u64,
    },
    /// Chunked layout: a `u64` B-tree address followed by `ndim+1` `u32` chunk-dims-in-bytes.
    Chunked {
        /// Absolute offset of the `u64 btree_address` field.
        btree_addr_offset: u64,
        /// Absolute offset of the first `u32` chunk-dims entry.
        chunk_dims_offset: u64,
    },
}

/// Emits a contiguous data-layout message (0x0008, v3, layout class 1) with its address and size
/// fields zeroed; returns the back-patch location.
pub fn write_contiguous_layout_message(w: &mut ByteWriter) -> LayoutMessagePatch {
    let mut body = ByteWriter::new(w.endian());
    body.write_u8(3); // version
    body.write_u8(1); // layout class: contiguous
    let address_field_local_offset = body.position();
    body.write_u64(0); // address placeholder
    body.write_u64(0); // size placeholder
    let body_start = write_message(w, MSG_DATA_LAYOUT, &body.into_bytes());
    LayoutMessagePatch::Contiguous { address_offset: body_start + address_field_local_offset }
}

/// Emits a chunked data-layout message (0x0008, v3, layout class 2) with its B-tree address and
/// chunk-dims fields zeroed; returns the back-patch locations.
pub fn write_chunked_layout_message(w: &mut ByteWriter, ndim: usize) -> LayoutMessagePatch {
    let mut body = ByteWriter::new(w.endian());
    body.write_u8(3); // version
    body.write_u8(2); // layout class: chunked
    body.write_u8((ndim + 1) as u8); // dimensionality
    let btree_field_local_offset = body.position();
    body.write_u64(0); // btree address placeholder
    let chunk_dims_local_offset = body.position();
    for _ in 0..=ndim {
        body.write_u32(0); // chunk-dims placeholder, last entry is element_size
    }
    let body_start = write_message(w, MSG_DATA_LAYOUT, &body.into_bytes());
    LayoutMessagePatch::Chunked {
        btree_addr_offset: body_start + btree_field_local_offset,
        chunk_dims_offset: body_start + chunk_dims_local_offset,
    }
}

/// Where the back-patch fields of an object-header v1 prefix live.
pub struct ObjectHeaderPatch {
    num_messages_offset: u64,
    header_size_offset: u64,
    /// Absolute offset where the first message begins; used to compute `header_size`.
    pub body_start: u64,
}

/// Emits an object-header v1 prefix (`version=1, reserved, num_messages, reference_count=1,
/// header_size`, padded to 8) with `num_messages`/`header_size` zeroed, and returns where to
/// patch them once every message has been written.
pub fn write_object_header_prefix(w: &mut ByteWriter) -> Result<ObjectHeaderPatch> {
    w.write_u8(1); // version
    w.write_u8(0); // reserved
    let num_messages_offset = w.position();
    w.write_u16(0);
    w.write_u32(1); // reference count
    let header_size_offset = w.position();
    w.write_u32(0);
    w.align_to(8)?;
    let body_start = w.position();
    Ok(ObjectHeaderPatch { num_messages_offset, header_size_offset, body_start })
}

/// Back-patches the `num_messages` and `header_size` fields recorded by
/// [`write_object_header_prefix`], once every message has been written.
pub fn finish_object_header(
    w: &mut ByteWriter,
    patch: &ObjectHeaderPatch,
    num_messages: u16,
) -> Result<()> {
    let header_size = w.position() - patch.body_start;
    w.patch_u16(patch.num_messages_offset, num_messages)?;
    w.patch_u32(patch.header_size_offset, header_size as u32)?;
    Ok(())
}

/// Emits an attribute message (0x000C, v1) for a single scalar-valued attribute.
pub fn write_attribute_message(w: &mut ByteWriter, name: &str, value: &AttrValue) -> Result<()> {
    let (datatype_bytes, value_bytes): (Vec<u8>, Vec<u8>) = match value {
        AttrValue::Str(s) => (string_datatype_body(w.endian(), s.len()), s.as_bytes().to_vec()),
        AttrValue::F64(v) => {
            (numeric_datatype_body(w.endian(), DType::Float64), v.to_le_bytes().to_vec())
        }
        AttrValue::I64(v) => {
            (numeric_datatype_body(w.endian(), DType::Int64), v.to_le_bytes().to_vec())
        }
    };
    let dataspace_bytes = dataspace_body(w.endian(), &[]); // attributes are scalar

    let name_field_len = name.len() + 1; // NUL-terminated

    let mut body = ByteWriter::new(w.endian());
    body.write_u8(1); // version
    body.write_u8(0); // reserved
    body.write_u16(round_up_8(name_field_len) as u16);
    body.write_u16(round_up_8(datatype_bytes.len()) as u16);
    body.write_u16(round_up_8(dataspace_bytes.len()) as u16);
    body.write_string(name, true);
    body.align_to(8)?;
    body.write_bytes(&datatype_bytes);
    body.align_to(8)?;
    body.write_bytes(&dataspace_bytes);
    body.align_to(8)?;
    body.write_bytes(&value_bytes);

    write_message(w, MSG_ATTRIBUTE, &body.into_bytes());
    Ok(())
}
