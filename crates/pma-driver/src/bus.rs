//! Register bus abstraction
//!
//! The protocol engine never touches hardware directly. Every access goes
//! through a [`RegisterBus`], so the same sequences drive a mapped device,
//! the in-memory simulator, or a recorder wrapped around either.

use pma_chip::Register;
use std::fmt::Debug;

/// Synchronous 16-bit register transport.
///
/// Reads take `&mut self`: on this chip reading CAT or COMP advances internal
/// state, so a read is a side-effecting transaction like a write.
pub trait RegisterBus: Debug + Send {
    /// Read a register
    fn read(&mut self, reg: Register) -> u16;

    /// Write a register
    fn write(&mut self, reg: Register, value: u16);

    /// Get bus type for logging
    fn bus_type(&self) -> BusType;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read(&mut self, reg: Register) -> u16 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u16) {
        (**self).write(reg, value);
    }

    fn bus_type(&self) -> BusType {
        (**self).bus_type()
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn read(&mut self, reg: Register) -> u16 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: Register, value: u16) {
        (**self).write(reg, value);
    }

    fn bus_type(&self) -> BusType {
        (**self).bus_type()
    }
}

/// Bus type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    /// In-memory chip model, no hardware required
    Simulated,

    /// Memory-mapped register window
    Mmio,

    /// Recorder wrapped around another bus
    Recording,
}

impl std::fmt::Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulated => write!(f, "Simulated"),
            Self::Mmio => write!(f, "MMIO"),
            Self::Recording => write!(f, "Recording"),
        }
    }
}
