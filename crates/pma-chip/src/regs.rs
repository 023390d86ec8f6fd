//! Register map for the pattern-matching neuron array.
//!
//! Every register is a 16-bit value living in a 32-bit aligned slot, so
//! offsets advance by four. Offsets are relative to the register window base
//! ([`WINDOW_BASE`] on the reference SoC).
//!
//! ```text
//! 0x00  NCR            neuron context + norm bit
//! 0x04  COMP           component stream (all but the last byte)
//! 0x08  LCOMP          last component, starts recognition
//! 0x0C  IDX_DIST       distance of the current response
//! 0x10  CAT            category read / commit
//! 0x14  AIF            active influence field
//! 0x18  MINIF          minimum influence field
//! 0x1C  MAXIF          maximum influence field
//! 0x20  TESTCOMP       broadcast component write (init only)
//! 0x24  TESTCAT        broadcast category write (init only)
//! 0x28  NID            neuron identifier
//! 0x2C  GCR            global context + norm bit
//! 0x30  RSTCHAIN       reset chain cursor to the first neuron
//! 0x34  NSR            network status
//! 0x3C  FORGET_NCOUNT  forget (write) / committed count (read)
//! ```
//!
//! Several registers change meaning when NSR's network-mode bit is set
//! (save/restore mode): NCR, COMP, AIF, MINIF and CAT then address the neuron
//! under the chain cursor instead of the comparator.

// ── Window ───────────────────────────────────────────────────────────────────

/// Physical base of the register window on the reference SoC.
pub const WINDOW_BASE: u64 = 0xB060_0000;

/// Length of the register window in bytes (covers `FORGET_NCOUNT`).
pub const WINDOW_LEN: usize = 0x40;

/// Stride between register slots.
pub const REGISTER_STRIDE: usize = 4;

// ── Registers ────────────────────────────────────────────────────────────────

/// A named 16-bit register in the neuron array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    /// Neuron control: context field and distance norm bit.
    Ncr,
    /// Comparator stream input.
    Comp,
    /// Last comparator input; writing it triggers recognition.
    Lcomp,
    /// Distance index of the current response (read-only).
    IdxDist,
    /// Category read (classification) or write (commit).
    Cat,
    /// Active influence field of the neuron under the cursor.
    Aif,
    /// Minimum influence field.
    Minif,
    /// Maximum influence field.
    Maxif,
    /// Broadcast component write, used only by initialization.
    TestComp,
    /// Broadcast category write, used only by initialization.
    TestCat,
    /// Neuron identifier.
    Nid,
    /// Global context register.
    Gcr,
    /// Chain cursor reset.
    RstChain,
    /// Network status register.
    Nsr,
    /// Forget trigger (write) / committed count (read).
    ForgetNcount,
}

impl Register {
    /// Every register, in offset order.
    pub const ALL: [Self; 15] = [
        Self::Ncr,
        Self::Comp,
        Self::Lcomp,
        Self::IdxDist,
        Self::Cat,
        Self::Aif,
        Self::Minif,
        Self::Maxif,
        Self::TestComp,
        Self::TestCat,
        Self::Nid,
        Self::Gcr,
        Self::RstChain,
        Self::Nsr,
        Self::ForgetNcount,
    ];

    /// Byte offset of this register from the window base.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::Ncr => 0x00,
            Self::Comp => 0x04,
            Self::Lcomp => 0x08,
            Self::IdxDist => 0x0C,
            Self::Cat => 0x10,
            Self::Aif => 0x14,
            Self::Minif => 0x18,
            Self::Maxif => 0x1C,
            Self::TestComp => 0x20,
            Self::TestCat => 0x24,
            Self::Nid => 0x28,
            Self::Gcr => 0x2C,
            Self::RstChain => 0x30,
            Self::Nsr => 0x34,
            Self::ForgetNcount => 0x3C,
        }
    }

    /// Mnemonic as printed in register dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ncr => "NCR",
            Self::Comp => "COMP",
            Self::Lcomp => "LCOMP",
            Self::IdxDist => "IDX_DIST",
            Self::Cat => "CAT",
            Self::Aif => "AIF",
            Self::Minif => "MINIF",
            Self::Maxif => "MAXIF",
            Self::TestComp => "TESTCOMP",
            Self::TestCat => "TESTCAT",
            Self::Nid => "NID",
            Self::Gcr => "GCR",
            Self::RstChain => "RSTCHAIN",
            Self::Nsr => "NSR",
            Self::ForgetNcount => "FORGET_NCOUNT",
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── NCR / GCR bit definitions ────────────────────────────────────────────────

pub mod ncr {
    /// Context field (7 bits). Context 0 matches every neuron.
    pub const CONTEXT: u16 = 0x007F;
    /// Distance norm: set selects L-Sup, clear selects L1.
    pub const NORM: u16 = 0x0080;
    /// Bit position of [`NORM`].
    pub const NORM_SHIFT: u16 = 7;
}

// ── NSR bit definitions ──────────────────────────────────────────────────────

pub mod nsr {
    /// Responding neurons disagree on the category.
    pub const UNCERTAIN: u16 = 1 << 2;
    /// All responding neurons agree on the category.
    pub const IDENTIFIED: u16 = 1 << 3;
    /// Save/restore mode.
    pub const NET_MODE: u16 = 1 << 4;
    /// Classifier mode: set selects k-NN, clear selects RBF.
    pub const CLASS_MODE: u16 = 1 << 5;
    /// Bit position of [`CLASS_MODE`].
    pub const CLASS_MODE_SHIFT: u16 = 5;
}

// ── CAT bit definitions ──────────────────────────────────────────────────────

pub mod cat {
    /// Category field (15 bits).
    pub const CATEGORY: u16 = 0x7FFF;
    /// Neuron degenerated: its influence field hit the minimum.
    pub const DEGENERATE: u16 = 0x8000;
}

// ── FORGET_NCOUNT ────────────────────────────────────────────────────────────

pub mod ncount {
    /// Committed-count field (low byte).
    pub const COUNT: u16 = 0x00FF;
}
