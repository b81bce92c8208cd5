//! In-memory platform for tests, demos and host-side simulation.

use std::ops::Range;

use super::{AddressWidth, MemoryBus, MemoryLayout};

/// A fabricated address space backed by a `Vec<u8>`.
///
/// Addresses `base..base + len` are readable and writable; everything else
/// reads as `None`. The heap and stack boundaries are plain fields so tests
/// can place the watched gap (or a collision) wherever they like.
#[derive(Debug, Clone)]
pub struct SyntheticMemory {
    base: usize,
    bytes: Vec<u8>,
    width: AddressWidth,
    heap_end: usize,
    stack_top: usize,
    command_buffer: Option<Range<usize>>,
}

impl SyntheticMemory {
    /// Create `size` zeroed bytes starting at `base`.
    ///
    /// The boundaries default to the whole buffer: heap end at `base`, stack
    /// top at `base + size`.
    pub fn new(base: usize, size: usize) -> Self {
        Self {
            base,
            bytes: vec![0; size],
            width: AddressWidth::native(),
            heap_end: base,
            stack_top: base + size,
            command_buffer: None,
        }
    }

    /// Builder pattern: set the address width reported by the bus.
    pub fn with_width(mut self, width: AddressWidth) -> Self {
        self.width = width;
        self
    }

    /// Builder pattern: set the heap end and stack top.
    pub fn with_boundaries(mut self, heap_end: usize, stack_top: usize) -> Self {
        self.heap_end = heap_end;
        self.stack_top = stack_top;
        self
    }

    /// Builder pattern: mark a range as the live command buffer.
    pub fn with_command_buffer(mut self, range: Range<usize>) -> Self {
        self.command_buffer = Some(range);
        self
    }

    /// Builder pattern: fill every byte with `value`.
    pub fn with_fill(mut self, value: u8) -> Self {
        self.bytes.fill(value);
        self
    }

    /// Move the heap end, as an allocation would.
    pub fn set_heap_end(&mut self, addr: usize) {
        self.heap_end = addr;
    }

    /// Move the stack top, as a deeper or shallower call chain would.
    pub fn set_stack_top(&mut self, addr: usize) {
        self.stack_top = addr;
    }

    /// First backed address.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Backed address range.
    pub fn address_range(&self) -> Range<usize> {
        self.base..self.base + self.bytes.len()
    }

    /// Raw view of the backing buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copy `data` into memory starting at `addr`, ignoring unbacked bytes.
    pub fn write_slice(&mut self, addr: usize, data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            self.write_byte(addr + i, b);
        }
    }

    fn index(&self, addr: usize) -> Option<usize> {
        addr.checked_sub(self.base).filter(|&i| i < self.bytes.len())
    }
}

impl MemoryLayout for SyntheticMemory {
    fn heap_end(&self) -> usize {
        self.heap_end
    }

    fn stack_top(&self) -> usize {
        self.stack_top
    }

    fn command_buffer(&self) -> Option<Range<usize>> {
        self.command_buffer.clone()
    }
}

impl MemoryBus for SyntheticMemory {
    fn address_width(&self) -> AddressWidth {
        self.width
    }

    fn read_byte(&self, addr: usize) -> Option<u8> {
        self.index(addr).map(|i| self.bytes[i])
    }

    fn write_byte(&mut self, addr: usize, value: u8) -> bool {
        match self.index(addr) {
            Some(i) => {
                self.bytes[i] = value;
                true
            }
            None => false,
        }
    }

    fn fill(&mut self, range: Range<usize>, value: u8) -> usize {
        let start = range.start.max(self.base);
        let end = range.end.min(self.base + self.bytes.len());
        if start >= end {
            return 0;
        }
        self.bytes[start - self.base..end - self.base].fill(value);
        end - start
    }
}
