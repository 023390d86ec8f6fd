//! Register bus implementations
//!
//! Three buses available:
//! - **Mmio**: memory-mapped register window (hardware)
//! - **Simulated**: in-memory model of the array (CI, demos)
//! - **Recording**: wraps either and logs every access

pub mod mmio;
pub mod recording;
pub mod simulated;

pub use mmio::MmioBus;
pub use recording::{Access, RecordingBus};
pub use simulated::SimulatedPma;
