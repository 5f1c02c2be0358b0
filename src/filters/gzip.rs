//! The gzip filter (HDF5 filter id 1), backed by `flate2`'s zlib encoder.

use super::Filter;
use crate::error::{HdfWriteError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

/// DEFLATE-with-zlib-wrapper compression, at a configurable level.
pub struct GzipFilter {
    level: u8,
}

impl GzipFilter {
    /// Creates a gzip filter at `level`.
    ///
    /// `level` must be in `1..=9`; any other value is `InvalidArgument`.
    pub fn new(level: u8) -> Result<Self> {
        if !(1..=9).contains(&level) {
            return Err(HdfWriteError::invalid_argument(format!(
                "gzip level must be in 1..=9, got {level}"
            )));
        }
        Ok(Self { level })
    }
}

impl Filter for GzipFilter {
    fn id(&self) -> u16 {
        super::FILTER_ID_GZIP
    }

    fn name(&self) -> &str {
        "deflate"
    }

    fn client_data(&self) -> Vec<u32> {
        vec![self.level as u32]
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level as u32));
        encoder.write_all(input).map_err(|e| {
            HdfWriteError::invalid_argument(format!("gzip encode failed: {e}"))
        })?;
        encoder
            .finish()
            .map_err(|e| HdfWriteError::invalid_argument(format!("gzip encode failed: {e}")))
    }
}
