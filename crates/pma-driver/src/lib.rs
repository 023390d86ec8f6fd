//! Host-side driver for a register-mapped pattern-matching neuron array.
//!
//! The array classifies byte vectors (RBF or k-NN, L1 or L-Sup distance)
//! entirely in silicon. The host only sequences 16-bit register accesses:
//! streaming vectors into the comparator, committing or reading categories,
//! and walking the internal neuron chain to snapshot or replay everything
//! the array has learned.
//!
//! # Layers
//!
//! ```text
//! PatternMatcher<B>   learn / classify / save / restore / accessors
//!   └─ RegisterBus    read(reg) / write(reg, value)
//!        ├─ MmioBus       mapped register window (hardware)
//!        ├─ SimulatedPma  in-memory array (CI, demos)
//!        └─ RecordingBus  access log around either
//! ```
//!
//! # Quick start
//!
//! ```
//! use pma_driver::{PatternMatcher, SimulatedPma};
//! use pma_driver::chip::{ClassifierMode, DistanceMode};
//!
//! let mut pm = PatternMatcher::new(SimulatedPma::new());
//! pm.initialize_with(1, DistanceMode::L1, ClassifierMode::Rbf, 2, 0x4000);
//!
//! pm.learn(&[1, 2, 3], 7);
//! assert_eq!(pm.classify(&[1, 2, 3]), 7);
//!
//! let saved = pm.save_all();
//! pm.forget();
//! pm.restore_all(&saved).unwrap();
//! assert_eq!(pm.committed_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod backends;
mod bus;
pub mod config;
mod error;
pub mod knowledge;
mod matcher;
mod record;
mod response;
pub mod session;

/// Silicon model (re-exported from pma-chip).
pub mod chip {
    pub use pma_chip::limits;
    pub use pma_chip::regs;
    pub use pma_chip::{ClassifierMode, DistanceMode, Register};
}

pub use backends::{Access, MmioBus, RecordingBus, SimulatedPma};
pub use bus::{BusType, RegisterBus};
pub use config::{DeviceConfig, PmaConfig};
pub use error::{PmaError, Result};
pub use knowledge::KnowledgeImage;
pub use matcher::PatternMatcher;
pub use record::NeuronRecord;
pub use response::{Classification, Match};
pub use session::{ChainCursor, RestoreSession, SaveSession, SavedMode};

/// Commonly used types.
pub mod prelude {
    pub use crate::chip::{ClassifierMode, DistanceMode, Register};
    pub use crate::{
        KnowledgeImage, NeuronRecord, PatternMatcher, PmaConfig, PmaError, RegisterBus, Result,
        SimulatedPma,
    };
}
