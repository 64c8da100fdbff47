pub mod aggregate;
pub mod config;
pub mod plot;
pub mod report;
pub mod util;

/// Benchmark input sizes are plotted in thousands of elements
pub const INPUT_SIZE_SCALE: f64 = 1000.0;
