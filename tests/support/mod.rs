pub mod mini_reader;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;

static COUNTER: AtomicU64 = AtomicU64::new(0);
static INIT_LOGGER: Once = Once::new();

/// Installs a compact, test-writer `tracing` subscriber the first time it's called; later calls
/// are no-ops. Run with `RUST_LOG=trace` to see span/event output on a failing test.
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .compact()
            .without_time()
            .init();
    });
}

/// A fresh scratch file path under the OS temp directory, unique per process and per call.
pub fn temp_path(label: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("hdf5-writer-test-{}-{}-{}.h5", std::process::id(), label, n))
}
