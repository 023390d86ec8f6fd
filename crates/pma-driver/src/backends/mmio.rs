//! Memory-mapped register window
//!
//! Maps the neuron array's register window from a device node (`/dev/mem`,
//! a UIO node, or a PCI resource file) and performs volatile 32-bit accesses
//! at each register slot. Registers carry 16 bits; the upper half of each
//! slot is ignored on read and written as zero.
//!
//! Unsafe is confined to the mapping, the volatile accesses and `Drop`.

use crate::bus::{BusType, RegisterBus};
use crate::config::DeviceConfig;
use crate::error::{PmaError, Result};
use pma_chip::regs::{REGISTER_STRIDE, WINDOW_LEN};
use pma_chip::Register;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Mapped register window
pub struct MmioBus {
    ptr: NonNull<u8>,
    /// Length of the mapping (page aligned)
    map_len: usize,
    /// Offset of the register window inside the mapping
    window_offset: usize,
    _file: File,
    path: PathBuf,
}

impl std::fmt::Debug for MmioBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmioBus")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("map_len", &self.map_len)
            .field("window_offset", &self.window_offset)
            .field("path", &self.path)
            .finish()
    }
}

// SAFETY: Send - MmioBus owns the mapping exclusively; moving it between threads does not
// invalidate mmap'd memory (process-wide). Accesses require &mut self.
unsafe impl Send for MmioBus {}

impl MmioBus {
    /// Map the register window described by `config`
    ///
    /// # Errors
    ///
    /// Returns error if the device node cannot be opened, the window is too
    /// small to cover every register, or `mmap` fails.
    pub fn open(config: &DeviceConfig) -> Result<Self> {
        Self::map(&config.path, config.base, config.len)
    }

    /// Map `len` bytes at physical offset `base` of the device node at `path`
    ///
    /// `base` need not be page aligned; the mapping is widened to the
    /// enclosing pages.
    ///
    /// # Errors
    ///
    /// Returns error if the device node cannot be opened, the window is too
    /// small to cover every register, or `mmap` fails.
    ///
    /// # Panics
    ///
    /// Panics if `rustix::mm::mmap` returns a null pointer on success
    /// (should never happen per rustix API contract).
    pub fn map(path: &Path, base: u64, len: usize) -> Result<Self> {
        if !path.exists() {
            return Err(PmaError::device_not_found(path));
        }
        if len < WINDOW_LEN {
            return Err(PmaError::map_failed(format!(
                "window of {len:#x} bytes does not cover the register map ({WINDOW_LEN:#x})"
            )));
        }

        tracing::debug!("Mapping register window {}: base={base:#x} len={len:#x}", path.display());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| PmaError::map_failed(format!("Cannot open {}: {e}", path.display())))?;

        let page = rustix::param::page_size() as u64;
        let page_base = base - base % page;
        // Truncation acceptable: offset within one page
        #[allow(clippy::cast_possible_truncation)]
        let window_offset = (base - page_base) as usize;
        let map_len = window_offset + len;

        // SAFETY: mmap of a device register window.
        // - File descriptor is valid (just opened, kept alive in the struct)
        // - map_len is non-zero (len >= WINDOW_LEN checked above)
        // - page_base is page aligned
        // - MAP_SHARED so writes reach the device; unmapped in Drop
        let ptr = unsafe {
            let addr = mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                page_base,
            )
            .map_err(|e| PmaError::map_failed(format!("mmap failed: {e}")))?;

            NonNull::new(addr.cast::<u8>()).expect("rustix mmap returns non-null pointer on success")
        };

        tracing::info!(
            "Mapped register window of {} at {ptr:p} (+{window_offset:#x})",
            path.display()
        );

        Ok(Self {
            ptr,
            map_len,
            window_offset,
            _file: file,
            path: path.to_path_buf(),
        })
    }

    /// Device node backing the mapping
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[allow(clippy::cast_ptr_alignment)]
    fn slot(&self, reg: Register) -> *mut u32 {
        let offset = self.window_offset + reg.offset();
        debug_assert!(offset + REGISTER_STRIDE <= self.map_len);
        // SAFETY: offset lies inside the mapping: window_offset + WINDOW_LEN <= map_len
        // (checked in map) and every register offset + stride <= WINDOW_LEN.
        let ptr = unsafe { self.ptr.as_ptr().add(offset) };
        ptr.cast::<u32>()
    }
}

impl RegisterBus for MmioBus {
    fn read(&mut self, reg: Register) -> u16 {
        // SAFETY: read_volatile necessary for MMIO - reads of CAT and COMP advance
        // chip state and must not be elided or reordered. Slot is in bounds and
        // 4-byte aligned (register offsets are multiples of 4, mapping is page aligned
        // and the window base is 4-byte aligned on every supported SoC).
        let raw = unsafe { self.slot(reg).read_volatile() };
        // Truncation acceptable: registers are 16 bits wide, upper half of the slot is unused
        #[allow(clippy::cast_possible_truncation)]
        let value = (raw & 0xFFFF) as u16;
        tracing::trace!("Read {reg} = {value:#06x}");
        value
    }

    fn write(&mut self, reg: Register, value: u16) {
        tracing::trace!("Write {reg} <- {value:#06x}");
        // SAFETY: write_volatile necessary for MMIO - writes trigger comparator and
        // commit cycles. Slot is in bounds and aligned, as for read.
        unsafe {
            self.slot(reg).write_volatile(u32::from(value));
        }
    }

    fn bus_type(&self) -> BusType {
        BusType::Mmio
    }
}

impl Drop for MmioBus {
    fn drop(&mut self) {
        // SAFETY: ptr/map_len come from the successful mmap in map(); Drop runs once
        // and no references into the mapping outlive self.
        unsafe {
            let _ = munmap(self.ptr.as_ptr().cast(), self.map_len);
        }
        tracing::debug!("Unmapped register window of {}", self.path.display());
    }
}
