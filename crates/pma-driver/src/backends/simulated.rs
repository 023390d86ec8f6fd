// SPDX-License-Identifier: AGPL-3.0-only

//! Simulated (virtual) neuron array
//!
//! Implements [`RegisterBus`] over an in-memory model of the chip: 128 neuron
//! cells, the comparator, the response list and the save/restore chain
//! cursor. This enables:
//!
//! 1. **CI without hardware**: every register sequence the driver issues has
//!    an observable effect here, so learn/classify and save/restore round
//!    trips are tested end to end.
//!
//! 2. **Protocol validation**: register semantics follow the hardware,
//!    including the mode bit changing what NCR, COMP, AIF, MINIF and CAT
//!    address, and CAT reads advancing the chain.
//!
//! ## Model
//!
//! ```text
//! normal mode     COMP/LCOMP  stage the input vector, LCOMP runs recognition
//!                 CAT read    pops the next responding neuron (0xFFFF when none)
//!                 CAT write   learns the staged vector under that category
//!                 NCR == GCR  global context + norm bit
//! save/restore    RSTCHAIN    cursor -> neuron 0
//!                 NCR COMP AIF MINIF  address the neuron under the cursor
//!                 CAT read    returns the category, advances the cursor
//!                 CAT write   stores (and commits) the category, advances
//! ```
//!
//! Distances and influence adaptation are an approximation of the silicon;
//! only the register-visible behaviour is meant to match.

use crate::bus::{BusType, RegisterBus};
use pma_chip::limits::{
    DEFAULT_CONTEXT, DEFAULT_MAX_IF, DEFAULT_MIN_IF, MAX_NEURONS, MAX_VECTOR_SIZE,
    NOT_PROCESSED, SAVE_RESTORE_SIZE,
};
use pma_chip::regs::{cat, ncr, nsr};
use pma_chip::{ClassifierMode, DistanceMode, Register};
use tracing::{debug, trace};

/// One neuron cell of the array.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    ncr: u16,
    memory: [u8; SAVE_RESTORE_SIZE],
    aif: u16,
    minif: u16,
    cat: u16,
}

impl Cell {
    const fn blank() -> Self {
        Self {
            ncr: 0,
            memory: [0; SAVE_RESTORE_SIZE],
            aif: 0,
            minif: 0,
            cat: 0,
        }
    }

    const fn context(&self) -> u16 {
        self.ncr & ncr::CONTEXT
    }

    fn distance(&self, input: &[u8]) -> u16 {
        let pairs = input.iter().zip(self.memory.iter());
        match DistanceMode::from_ncr(self.ncr) {
            DistanceMode::L1 => {
                let sum: u32 = pairs.map(|(&a, &b)| u32::from(a.abs_diff(b))).sum();
                u16::try_from(sum).unwrap_or(u16::MAX)
            }
            DistanceMode::LSup => pairs
                .map(|(&a, &b)| u16::from(a.abs_diff(b)))
                .max()
                .unwrap_or(0),
        }
    }
}

/// A responding neuron after recognition.
#[derive(Debug, Clone, Copy)]
struct Response {
    index: usize,
    distance: u16,
    category: u16,
}

/// Simulated neuron array.
///
/// Power-on state: no committed neurons, context 1, L1 norm, RBF mode,
/// MINIF 2, MAXIF 0x4000.
#[derive(Debug)]
pub struct SimulatedPma {
    cells: Vec<Cell>,
    committed: usize,

    nsr: u16,
    gcr: u16,
    minif: u16,
    maxif: u16,

    /// Staged input vector
    input: Vec<u8>,
    /// Set by LCOMP; the next COMP starts a fresh vector
    vector_complete: bool,
    /// Responding neurons, nearest first
    responses: Vec<Response>,
    next_response: usize,
    current: Option<Response>,

    /// Save/restore chain cursor and component slot within the cursor neuron
    cursor: usize,
    slot: usize,
    /// Component slot for broadcast TESTCOMP writes
    test_slot: usize,
}

impl Default for SimulatedPma {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPma {
    /// Create an array in its power-on state.
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::blank(); MAX_NEURONS],
            committed: 0,
            nsr: 0,
            gcr: DEFAULT_CONTEXT,
            minif: DEFAULT_MIN_IF,
            maxif: DEFAULT_MAX_IF,
            input: Vec::with_capacity(MAX_VECTOR_SIZE),
            vector_complete: false,
            responses: Vec::new(),
            next_response: 0,
            current: None,
            cursor: 0,
            slot: 0,
            test_slot: 0,
        }
    }

    /// Number of committed neurons, independent of the mode bit.
    pub fn committed(&self) -> usize {
        self.committed
    }

    /// Whether NSR currently selects save/restore mode.
    pub fn in_save_restore_mode(&self) -> bool {
        self.nsr & nsr::NET_MODE != 0
    }

    /// Chain cursor position (0-based).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn global_context(&self) -> u16 {
        self.gcr & ncr::CONTEXT
    }

    fn context_matches(&self, cell: &Cell) -> bool {
        let global = self.global_context();
        global == 0 || cell.context() == global
    }

    fn clear_responses(&mut self) {
        self.responses.clear();
        self.next_response = 0;
        self.current = None;
    }

    fn stage_component(&mut self, value: u16) {
        if self.vector_complete {
            self.input.clear();
            self.vector_complete = false;
            self.clear_responses();
        }
        if self.input.len() < MAX_VECTOR_SIZE {
            self.input.push(value.to_le_bytes()[0]);
        }
    }

    fn recognize(&mut self) {
        self.clear_responses();
        let knn = ClassifierMode::from_nsr(self.nsr) == ClassifierMode::Knn;

        let mut responses: Vec<Response> = self.cells[..self.committed]
            .iter()
            .enumerate()
            .filter(|(_, cell)| self.context_matches(cell))
            .filter_map(|(index, cell)| {
                let distance = cell.distance(&self.input);
                (knn || distance < cell.aif).then_some(Response {
                    index,
                    distance,
                    category: cell.cat,
                })
            })
            .collect();
        responses.sort_by_key(|r| (r.distance, r.index));
        self.responses = responses;
        self.vector_complete = true;

        trace!(
            "recognition: {} components, {} responding",
            self.input.len(),
            self.responses.len()
        );
    }

    fn status_bits(&self) -> u16 {
        let Some(first) = self.responses.first() else {
            return 0;
        };
        let agree = self
            .responses
            .iter()
            .all(|r| r.category & cat::CATEGORY == first.category & cat::CATEGORY);
        if agree {
            nsr::IDENTIFIED
        } else {
            nsr::UNCERTAIN
        }
    }

    fn pop_response(&mut self) -> u16 {
        self.current = self.responses.get(self.next_response).copied();
        match self.current {
            Some(r) => {
                self.next_response += 1;
                r.category
            }
            None => NOT_PROCESSED,
        }
    }

    /// Learn the staged vector under `category`.
    fn learn(&mut self, category: u16) {
        if !self.vector_complete || self.input.is_empty() {
            return;
        }
        let wanted = category & cat::CATEGORY;
        let mut already_known = false;
        let mut nearest_other: Option<u16> = None;

        for i in 0..self.committed {
            if !self.context_matches(&self.cells[i]) {
                continue;
            }
            let distance = self.cells[i].distance(&self.input);
            let cell = &mut self.cells[i];
            let same = cell.cat & cat::CATEGORY == wanted;
            if !same {
                nearest_other = Some(nearest_other.map_or(distance, |d| d.min(distance)));
            }
            if distance >= cell.aif {
                continue;
            }
            if same && wanted != 0 {
                already_known = true;
            } else {
                // Shrink the influence field of a wrongly firing neuron
                if distance <= cell.minif {
                    cell.aif = cell.minif;
                    cell.cat |= cat::DEGENERATE;
                } else {
                    cell.aif = distance;
                }
            }
        }
        self.clear_responses();

        if wanted == 0 || already_known {
            return;
        }
        if self.committed >= MAX_NEURONS {
            debug!("array full, category {wanted} not committed");
            return;
        }

        let aif = nearest_other
            .unwrap_or(self.maxif)
            .min(self.maxif)
            .max(self.minif);
        let mut memory = [0u8; SAVE_RESTORE_SIZE];
        memory[..self.input.len()].copy_from_slice(&self.input);
        self.cells[self.committed] = Cell {
            ncr: self.gcr & (ncr::CONTEXT | ncr::NORM),
            memory,
            aif,
            minif: self.minif,
            cat: wanted,
        };
        self.committed += 1;
        debug!(
            "committed neuron {} category={wanted} aif={aif}",
            self.committed
        );
    }

    fn forget(&mut self) {
        for cell in &mut self.cells {
            cell.cat = 0;
        }
        self.committed = 0;
        self.clear_responses();
    }

    fn advance_cursor(&mut self) {
        self.cursor = (self.cursor + 1).min(MAX_NEURONS);
        self.slot = 0;
    }

    fn cursor_cell(&mut self) -> Option<&mut Cell> {
        self.cells.get_mut(self.cursor)
    }

    // ── save/restore mode ────────────────────────────────────────────────────

    fn read_chain(&mut self, reg: Register) -> u16 {
        match reg {
            Register::Ncr => self.cursor_cell().map_or(0, |c| c.ncr),
            Register::Comp => {
                let slot = self.slot;
                self.slot = (self.slot + 1) % SAVE_RESTORE_SIZE;
                self.cursor_cell().map_or(0, |c| u16::from(c.memory[slot]))
            }
            Register::Aif => self.cursor_cell().map_or(0, |c| c.aif),
            Register::Minif => self.cursor_cell().map_or(0, |c| c.minif),
            Register::Cat => {
                let value = self.cursor_cell().map_or(0, |c| c.cat);
                self.advance_cursor();
                value
            }
            Register::Nid => u16::try_from(self.cursor + 1).unwrap_or(u16::MAX),
            Register::ForgetNcount => u16::try_from(self.cursor).unwrap_or(u16::MAX),
            _ => self.read_common(reg),
        }
    }

    fn write_chain(&mut self, reg: Register, value: u16) {
        match reg {
            Register::Ncr => {
                if let Some(c) = self.cursor_cell() {
                    c.ncr = value;
                }
            }
            Register::Comp | Register::Lcomp => {
                let slot = self.slot;
                self.slot = (self.slot + 1) % SAVE_RESTORE_SIZE;
                if let Some(c) = self.cursor_cell() {
                    c.memory[slot] = value.to_le_bytes()[0];
                }
            }
            Register::Aif => {
                if let Some(c) = self.cursor_cell() {
                    c.aif = value;
                }
            }
            Register::Minif => {
                if let Some(c) = self.cursor_cell() {
                    c.minif = value;
                }
            }
            Register::Cat => {
                let index = self.cursor;
                if let Some(c) = self.cursor_cell() {
                    c.cat = value;
                    if value & cat::CATEGORY != 0 && index == self.committed {
                        self.committed += 1;
                    }
                }
                self.advance_cursor();
            }
            Register::TestComp => {
                let slot = self.test_slot;
                self.test_slot = (self.test_slot + 1) % SAVE_RESTORE_SIZE;
                for cell in &mut self.cells {
                    cell.memory[slot] = value.to_le_bytes()[0];
                }
            }
            Register::TestCat => {
                for cell in &mut self.cells {
                    cell.cat = value;
                }
            }
            _ => self.write_common(reg, value),
        }
    }

    // ── normal mode ──────────────────────────────────────────────────────────

    fn read_normal(&mut self, reg: Register) -> u16 {
        match reg {
            Register::Ncr | Register::Gcr => self.gcr,
            Register::Cat => self.pop_response(),
            Register::IdxDist => self.current.map_or(NOT_PROCESSED, |r| r.distance),
            Register::Aif => self.current.map_or(0, |r| self.cells[r.index].aif),
            Register::Minif => self.minif,
            Register::Nid => self
                .current
                .map_or(0, |r| u16::try_from(r.index + 1).unwrap_or(u16::MAX)),
            Register::ForgetNcount => u16::try_from(self.committed).unwrap_or(u16::MAX),
            _ => self.read_common(reg),
        }
    }

    fn write_normal(&mut self, reg: Register, value: u16) {
        match reg {
            Register::Ncr | Register::Gcr => self.gcr = value & (ncr::CONTEXT | ncr::NORM),
            Register::Comp => self.stage_component(value),
            Register::Lcomp => {
                self.stage_component(value);
                self.recognize();
            }
            Register::Cat => self.learn(value),
            Register::Minif => self.minif = value,
            // Broadcast writes only take effect in save/restore mode
            Register::TestComp | Register::TestCat => {}
            _ => self.write_common(reg, value),
        }
    }

    // ── mode independent ─────────────────────────────────────────────────────

    fn read_common(&mut self, reg: Register) -> u16 {
        match reg {
            Register::Gcr => self.gcr,
            Register::Maxif => self.maxif,
            Register::Nsr => self.nsr | self.status_bits(),
            _ => 0,
        }
    }

    fn write_common(&mut self, reg: Register, value: u16) {
        match reg {
            Register::Gcr => self.gcr = value & (ncr::CONTEXT | ncr::NORM),
            Register::Maxif => self.maxif = value,
            Register::Nsr => self.nsr = value & (nsr::NET_MODE | nsr::CLASS_MODE),
            Register::RstChain => {
                self.cursor = 0;
                self.slot = 0;
            }
            Register::ForgetNcount => self.forget(),
            // Read-only or not writable in this mode
            _ => {}
        }
    }
}

impl RegisterBus for SimulatedPma {
    fn read(&mut self, reg: Register) -> u16 {
        let value = if self.in_save_restore_mode() {
            self.read_chain(reg)
        } else {
            self.read_normal(reg)
        };
        trace!("sim read {reg} = {value:#06x}");
        value
    }

    fn write(&mut self, reg: Register, value: u16) {
        trace!("sim write {reg} <- {value:#06x}");
        if self.in_save_restore_mode() {
            self.write_chain(reg, value);
        } else {
            self.write_normal(reg, value);
        }
    }

    fn bus_type(&self) -> BusType {
        BusType::Simulated
    }
}
