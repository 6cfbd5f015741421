//! Utility functions and types

pub mod data_loader;
pub mod frame;
pub mod telemetry;

pub use data_loader::{DataLoader, DataSaver};

use std::time::Instant;

/// Simple wall-clock timer for stage logging
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    /// Elapsed milliseconds since start
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
