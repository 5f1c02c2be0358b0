//! The per-call configuration surface.
//!
//! There are no hidden globals: every knob a write call can use lives on [`WriteOptions`],
//! constructed fresh per call in the style of `msf::open::CreateOptions`.

use crate::attrs::Attributes;

/// How a dataset's raw data is laid out on disk.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Layout {
    /// Choose contiguous or chunked automatically: chunked when compression is requested or the
    /// array is large, contiguous otherwise.
    #[default]
    Auto,
    /// Force a single contiguous block.
    Contiguous,
    /// Force chunked storage, using `chunk_dims` if given or the auto-chunk rule.
    Chunked,
}

/// The compression filter applied to chunked datasets.
///
/// Has no effect on contiguous datasets (contiguous layout has no filter pipeline).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Compression {
    /// No filter pipeline.
    #[default]
    None,
    /// DEFLATE via the gzip filter, at the given level (1-9).
    Gzip(u8),
    /// The LZF filter.
    Lzf,
}

/// Per-write-call configuration.
///
/// Constructed with [`Default`] and refined with the `with_*` builder methods.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Dataset path, beginning with `/`. Defaults to `/data`.
    pub dataset: String,
    /// Layout selection strategy.
    pub layout: Layout,
    /// Explicit chunk dimensions; only consulted when `layout` is `Chunked` or `Auto` resolves
    /// to chunked. `None` triggers the auto-chunk rule.
    pub chunk_dims: Option<Vec<usize>>,
    /// Compression filter for chunked datasets.
    pub compression: Compression,
    /// Attributes to attach to the dataset.
    pub attrs: Attributes,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            dataset: "/data".to_string(),
            layout: Layout::Auto,
            chunk_dims: None,
            compression: Compression::None,
            attrs: Attributes::new(),
        }
    }
}

impl WriteOptions {
    /// Sets the dataset path.
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    /// Sets the layout strategy.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets explicit chunk dimensions.
    pub fn with_chunk_dims(mut self, chunk_dims: Vec<usize>) -> Self {
        self.chunk_dims = Some(chunk_dims);
        self.layout = Layout::Chunked;
        self
    }

    /// Sets the compression filter.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the attribute set.
    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }
}
