//! Neuron records moved during save/restore

use pma_chip::limits::SAVE_RESTORE_SIZE;

/// Full state of one committed neuron.
///
/// Only ever produced or consumed through chain iteration; the chip has no
/// random access to neuron state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeuronRecord {
    /// NCR value of the neuron (context and norm bit)
    pub context: u16,
    /// Prototype memory, always `SAVE_RESTORE_SIZE` components
    pub vector: [u16; SAVE_RESTORE_SIZE],
    /// Active influence field
    pub influence: u16,
    /// Minimum influence field
    pub min_influence: u16,
    /// Category (with the degenerate flag as read from CAT)
    pub category: u16,
}

impl Default for NeuronRecord {
    fn default() -> Self {
        Self {
            context: 0,
            vector: [0; SAVE_RESTORE_SIZE],
            influence: 0,
            min_influence: 0,
            category: 0,
        }
    }
}

impl NeuronRecord {
    /// Prototype components narrowed to bytes, as they were learned.
    #[must_use]
    pub fn prototype(&self) -> Vec<u8> {
        self.vector.iter().map(|&c| c.to_le_bytes()[0]).collect()
    }

    /// Category without the degenerate flag.
    #[must_use]
    pub const fn category_field(&self) -> u16 {
        self.category & pma_chip::regs::cat::CATEGORY
    }

    /// Whether the chip flagged this neuron as degenerated.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.category & pma_chip::regs::cat::DEGENERATE != 0
    }
}
