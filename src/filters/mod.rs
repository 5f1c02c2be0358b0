//! The filter pipeline: ordered byte-to-byte codecs applied per chunk, with the
//! "skip if not beneficial" fallback that the chunked layout writer relies on.

mod gzip;
mod lzf;

pub use gzip::GzipFilter;
pub use lzf::LzfFilter;

use crate::byte_writer::ByteWriter;
use crate::error::Result;
use tracing::{debug, trace};

/// The HDF5-assigned filter identifier.
pub const FILTER_ID_GZIP: u16 = 1;
/// The HDF5-assigned filter identifier for the third-party LZF filter.
pub const FILTER_ID_LZF: u16 = 32000;

/// A single byte-to-byte codec in a filter pipeline.
pub trait Filter {
    /// The HDF5-assigned 16-bit filter id.
    fn id(&self) -> u16;

    /// A human-readable name; only emitted in the wire format for ids >= 256.
    fn name(&self) -> &str;

    /// Per-filter parameters, serialized as the message's `client_data` words.
    fn client_data(&self) -> Vec<u32>;

    /// Encodes `input`, producing the filtered bytes.
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// An ordered list of filters applied, as a unit, to every chunk of a dataset.
#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// An empty pipeline (no compression).
    pub fn empty() -> Self {
        Self { filters: Vec::new() }
    }

    /// A pipeline containing a single filter.
    pub fn single(filter: Box<dyn Filter>) -> Self {
        Self { filters: vec![filter] }
    }

    /// Whether this pipeline has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Number of filters in the pipeline.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Applies every filter in order to `raw`, then applies the skip-if-not-beneficial rule:
    /// if the filtered output is not at least 10% smaller than the input, the raw bytes
    /// are kept instead and every filter bit is set in the returned mask.
    ///
    /// Returns `(stored_bytes, filter_mask)`.
    pub fn apply(&self, raw: &[u8]) -> Result<(Vec<u8>, u32)> {
        if self.filters.is_empty() {
            return Ok((raw.to_vec(), 0));
        }

        let uncompressed_len = raw.len();
        let mut encoded = raw.to_vec();
        for filter in &self.filters {
            encoded = filter.encode(&encoded)?;
        }

        let threshold = (uncompressed_len as f64 * 0.9).round() as usize;
        if encoded.len() >= threshold {
            trace!(
                uncompressed_len,
                encoded_len = encoded.len(),
                threshold,
                "filter pipeline not beneficial, storing raw chunk"
            );
            let mask = all_filters_mask(self.filters.len());
            Ok((raw.to_vec(), mask))
        } else {
            debug!(uncompressed_len, encoded_len = encoded.len(), "filter pipeline applied");
            Ok((encoded, 0))
        }
    }

    /// Emits the version-2 filter-pipeline message payload.
    ///
    /// The caller is responsible for the surrounding `(type_id, size, flags, reserved)` message
    /// header (see [`crate::messages`]); this only writes the `version .. pad-to-8` body.
    pub fn write_message_body(&self, w: &mut ByteWriter) -> Result<()> {
        w.write_u8(2); // version
        w.write_u8(self.filters.len() as u8);
        w.write_u16(0); // reserved

        for filter in &self.filters {
            let id = filter.id();
            let name_len: u16 = if id < 256 { 0 } else { aligned_name_len(filter.name()) as u16 };
            w.write_u16(id);
            w.write_u16(name_len);
            w.write_u16(0); // flags
            let client_data = filter.client_data();
            w.write_u16(client_data.len() as u16);
            if name_len > 0 {
                w.write_string(filter.name(), true);
                w.align_to(8)?;
            }
            for word in &client_data {
                w.write_u32(*word);
            }
            w.align_to(8)?;
        }

        Ok(())
    }
}

fn aligned_name_len(name: &str) -> usize {
    let raw = name.len() + 1; // NUL terminator
    raw.div_ceil(8) * 8
}

fn all_filters_mask(num_filters: usize) -> u32 {
    if num_filters >= 32 {
        u32::MAX
    } else {
        (1u32 << num_filters) - 1
    }
}
