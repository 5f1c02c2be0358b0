//! The LZF filter (HDF5 third-party filter id 32000), backed by the `lzf` crate.

use super::Filter;
use crate::error::Result;

/// The LZF block codec used by HDF5's third-party filter 32000. Takes no parameters.
pub struct LzfFilter;

impl Filter for LzfFilter {
    fn id(&self) -> u16 {
        super::FILTER_ID_LZF
    }

    fn name(&self) -> &str {
        "lzf"
    }

    fn client_data(&self) -> Vec<u32> {
        Vec::new()
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        // Empty input encodes to empty output; the underlying codec does not accept zero-length
        // buffers, so this special case is handled here.
        if input.is_empty() {
            return Ok(Vec::new());
        }
        // liblzf's compress returns an error when the input doesn't shrink enough to fit its
        // output buffer; that's not a usage error, it's the codec declining to compress this
        // particular input. Fall back to the raw bytes and let the pipeline's own
        // skip-if-not-beneficial check (which compares lengths) decide what to store.
        match lzf::compress(input) {
            Ok(compressed) => Ok(compressed),
            Err(_) => Ok(input.to_vec()),
        }
    }
}
