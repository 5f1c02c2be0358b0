//! Contiguous layout writer.

use crate::array::ArrayView;
use crate::byte_writer::ByteWriter;
use tracing::trace;

/// Serializes the whole array as one flat, dtype-encoded block and returns its start address.
pub fn write_contiguous(w: &mut ByteWriter, array: &dyn ArrayView) -> u64 {
    let data_address = w.position();
    let element_size = array.dtype().element_size();
    trace!(data_address, len = array.len(), element_size, "writing contiguous layout");

    let mut encoded = Vec::with_capacity(array.len() * element_size);
    for i in 0..array.len() {
        array.element_at(i).encode_le(&mut encoded);
    }
    w.write_bytes(&encoded);

    data_address
}
