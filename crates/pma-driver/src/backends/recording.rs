//! Access recorder
//!
//! Wraps any bus and keeps an ordered log of every register access. Used to
//! check ordering contracts in tests and to print traces from the CLI.

use crate::bus::{BusType, RegisterBus};
use pma_chip::Register;

/// One register access, with the value read or written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read returning the value
    Read(Register, u16),
    /// Write of the value
    Write(Register, u16),
}

impl Access {
    /// Register touched
    pub const fn register(&self) -> Register {
        match self {
            Self::Read(reg, _) | Self::Write(reg, _) => *reg,
        }
    }

    /// Value read or written
    pub const fn value(&self) -> u16 {
        match self {
            Self::Read(_, v) | Self::Write(_, v) => *v,
        }
    }

    /// Whether this was a write
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write(..))
    }
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(reg, v) => write!(f, "R {reg:<13} -> {v:#06x}"),
            Self::Write(reg, v) => write!(f, "W {reg:<13} <- {v:#06x}"),
        }
    }
}

/// Bus wrapper recording every access
#[derive(Debug)]
pub struct RecordingBus<B> {
    inner: B,
    log: Vec<Access>,
}

impl<B: RegisterBus> RecordingBus<B> {
    /// Wrap `inner`
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            log: Vec::new(),
        }
    }

    /// Every access since creation or the last [`clear`](Self::clear)
    pub fn accesses(&self) -> &[Access] {
        &self.log
    }

    /// Writes only, in order
    pub fn writes(&self) -> Vec<(Register, u16)> {
        self.log
            .iter()
            .filter_map(|a| match *a {
                Access::Write(reg, v) => Some((reg, v)),
                Access::Read(..) => None,
            })
            .collect()
    }

    /// Values written to `reg`, in order
    pub fn writes_to(&self, reg: Register) -> Vec<u16> {
        self.log
            .iter()
            .filter(|a| a.is_write() && a.register() == reg)
            .map(Access::value)
            .collect()
    }

    /// Number of reads of `reg`
    pub fn reads_of(&self, reg: Register) -> usize {
        self.log
            .iter()
            .filter(|a| !a.is_write() && a.register() == reg)
            .count()
    }

    /// Drop the log
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Wrapped bus
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Wrapped bus, mutable (accesses made through it are not recorded)
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    /// Unwrap, discarding the log
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: RegisterBus> RegisterBus for RecordingBus<B> {
    fn read(&mut self, reg: Register) -> u16 {
        let value = self.inner.read(reg);
        self.log.push(Access::Read(reg, value));
        value
    }

    fn write(&mut self, reg: Register, value: u16) {
        self.inner.write(reg, value);
        self.log.push(Access::Write(reg, value));
    }

    fn bus_type(&self) -> BusType {
        BusType::Recording
    }
}
