//! Real-target platform: linker symbols and raw memory access.
//!
//! Only compiled with the `linker-symbols` feature. The symbols are the ones
//! avr-libc's allocator exports; other toolchains can supply their own
//! [`MemoryLayout`] and still use [`RawMemory`] for access.

use std::ops::Range;

use super::{AddressWidth, MemoryBus, MemoryLayout};

extern "C" {
    /// Current break of the allocator, null until the first allocation.
    static __brkval: *mut u8;
    /// First byte past statically allocated data.
    static __bss_end: u8;
}

/// Reads the heap end from `__brkval`, falling back to `__bss_end`.
#[derive(Debug, Clone, Default)]
pub struct LinkerLayout {
    command_buffer: Option<Range<usize>>,
}

impl LinkerLayout {
    /// Create a layout with no command buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set the command queue address range.
    pub fn with_command_buffer(mut self, range: Range<usize>) -> Self {
        self.command_buffer = Some(range);
        self
    }
}

impl MemoryLayout for LinkerLayout {
    fn heap_end(&self) -> usize {
        // SAFETY: both symbols are defined by the runtime; `__brkval` is read
        // by value and `__bss_end` is only used for its address.
        unsafe {
            let brk = std::ptr::read_volatile(std::ptr::addr_of!(__brkval));
            if brk.is_null() {
                std::ptr::addr_of!(__bss_end) as usize
            } else {
                brk as usize
            }
        }
    }

    #[inline(never)]
    fn stack_top(&self) -> usize {
        // The marker is popped on return, so one past it is at or above
        // the caller's stack top.
        let marker = 0u8;
        std::hint::black_box(&marker) as *const u8 as usize + 1
    }

    fn command_buffer(&self) -> Option<Range<usize>> {
        self.command_buffer.clone()
    }
}

/// Volatile byte access to the live address space.
pub struct RawMemory<L> {
    layout: L,
    width: AddressWidth,
}

impl<L: MemoryLayout> RawMemory<L> {
    /// Wrap a layout with raw memory access.
    ///
    /// # Safety
    ///
    /// Every address between the layout's heap end and stack top must be
    /// mapped RAM that no other code relies on while a check, dump or
    /// injection is running.
    pub unsafe fn new(layout: L, width: AddressWidth) -> Self {
        Self { layout, width }
    }
}

impl<L: MemoryLayout> MemoryLayout for RawMemory<L> {
    fn heap_end(&self) -> usize {
        self.layout.heap_end()
    }

    fn stack_top(&self) -> usize {
        self.layout.stack_top()
    }

    fn command_buffer(&self) -> Option<Range<usize>> {
        self.layout.command_buffer()
    }
}

impl<L: MemoryLayout> MemoryBus for RawMemory<L> {
    fn address_width(&self) -> AddressWidth {
        self.width
    }

    fn read_byte(&self, addr: usize) -> Option<u8> {
        if addr == 0 {
            return None;
        }
        // SAFETY: guaranteed mapped by the contract of `RawMemory::new`.
        Some(unsafe { std::ptr::read_volatile(addr as *const u8) })
    }

    fn write_byte(&mut self, addr: usize, value: u8) -> bool {
        if addr == 0 {
            return false;
        }
        // SAFETY: guaranteed mapped and unused by the contract of `RawMemory::new`.
        unsafe { std::ptr::write_volatile(addr as *mut u8, value) };
        true
    }
}
