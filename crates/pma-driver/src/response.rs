//! Classification results read back from the response registers

use pma_chip::limits::NO_MATCH;
use pma_chip::regs::{cat, nsr};

/// Nearest-neuron response to one classified vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Category field, [`NO_MATCH`] when nothing responded
    pub category: u16,
    /// Responding neuron is degenerated
    pub degenerate: bool,
    /// Distance to the responding neuron
    pub distance: u16,
    /// 1-based identifier of the responding neuron
    pub neuron_id: u16,
    /// Every responding neuron agreed on the category
    pub identified: bool,
    /// Responding neurons disagreed
    pub uncertain: bool,
}

impl Classification {
    pub(crate) const fn from_registers(status: u16, raw_cat: u16, distance: u16, neuron_id: u16) -> Self {
        Self {
            category: raw_cat & cat::CATEGORY,
            degenerate: raw_cat & cat::DEGENERATE != 0 && raw_cat & cat::CATEGORY != NO_MATCH,
            distance,
            neuron_id,
            identified: status & nsr::IDENTIFIED != 0,
            uncertain: status & nsr::UNCERTAIN != 0,
        }
    }

    /// Whether any neuron responded
    pub const fn is_match(&self) -> bool {
        self.category != NO_MATCH
    }
}

/// One entry of a nearest-neighbour walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Category field
    pub category: u16,
    /// Distance to the neuron
    pub distance: u16,
    /// 1-based neuron identifier
    pub neuron_id: u16,
    /// Neuron is degenerated
    pub degenerate: bool,
}

impl Match {
    pub(crate) const fn from_registers(raw_cat: u16, distance: u16, neuron_id: u16) -> Self {
        Self {
            category: raw_cat & cat::CATEGORY,
            distance,
            neuron_id,
            degenerate: raw_cat & cat::DEGENERATE != 0,
        }
    }
}
