//! Platform adapter: memory layout and byte access.
//!
//! Every algorithm in this crate talks to memory through these two traits,
//! so the same scanner, dumper and initializer run against a real target or
//! against a [`SyntheticMemory`] buffer in tests.

use std::ops::Range;

mod synthetic;
#[cfg(feature = "linker-symbols")]
mod raw;

pub use synthetic::SyntheticMemory;
#[cfg(feature = "linker-symbols")]
pub use raw::{LinkerLayout, RawMemory};

/// Width of an address on the target.
///
/// Only affects how addresses are masked and rendered; arithmetic is done in
/// `usize` on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressWidth {
    /// 16-bit addresses (8-bit AVR controllers).
    Bits16,
    /// 32-bit addresses (ARM Cortex-M and friends).
    Bits32,
    /// 64-bit addresses.
    Bits64,
}

impl AddressWidth {
    /// Width of the host's native pointers.
    pub const fn native() -> Self {
        if usize::BITS <= 16 {
            Self::Bits16
        } else if usize::BITS <= 32 {
            Self::Bits32
        } else {
            Self::Bits64
        }
    }

    /// Number of hex digits needed to print an address.
    pub const fn hex_digits(self) -> usize {
        match self {
            Self::Bits16 => 4,
            Self::Bits32 => 8,
            Self::Bits64 => 16,
        }
    }

    /// Truncate an address to this width.
    pub const fn mask(self, addr: usize) -> u64 {
        let addr = addr as u64;
        match self {
            Self::Bits16 => addr & 0xFFFF,
            Self::Bits32 => addr & 0xFFFF_FFFF,
            Self::Bits64 => addr,
        }
    }

    /// Format an address as zero-padded uppercase hex.
    pub fn format(self, addr: usize) -> String {
        format!("{:0width$X}", self.mask(addr), width = self.hex_digits())
    }
}

/// Provides the two boundaries of the watched gap.
pub trait MemoryLayout {
    /// Top of dynamically allocated memory, or the end of static data if
    /// nothing has been allocated yet.
    fn heap_end(&self) -> usize;

    /// An address at or above the current top of the call stack.
    fn stack_top(&self) -> usize;

    /// Address range of the live command-text buffer, if it is worth
    /// rendering as text in dumps.
    fn command_buffer(&self) -> Option<Range<usize>> {
        None
    }
}

/// Byte-level access to target memory.
pub trait MemoryBus {
    /// Address width of the target.
    fn address_width(&self) -> AddressWidth;

    /// Read one byte, or `None` if the address is not backed by memory.
    fn read_byte(&self, addr: usize) -> Option<u8>;

    /// Write one byte. Returns `false` if the address is not backed by memory.
    fn write_byte(&mut self, addr: usize, value: u8) -> bool;

    /// Fill `range` with `value`, returning how many bytes were written.
    fn fill(&mut self, range: Range<usize>, value: u8) -> usize {
        range.filter(|&addr| self.write_byte(addr, value)).count()
    }
}

/// A complete platform: boundaries plus memory access.
pub trait Platform: MemoryLayout + MemoryBus {}

impl<T: MemoryLayout + MemoryBus> Platform for T {}
