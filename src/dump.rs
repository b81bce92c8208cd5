//! Hex dump of the watched region with a per-byte verdict column.
//!
//! Each row shows 16 bytes in hex followed by one glyph per byte:
//!
//! | Byte                                  | Glyph         |
//! |---------------------------------------|---------------|
//! | inside the command buffer, printable  | the character |
//! | inside the command buffer, otherwise  | `.`           |
//! | sentinel                              | ` `           |
//! | anything else                         | `?`           |
//! | unreadable                            | ` ` (hex `--`)|
//!
//! A clean pool therefore shows a blank right-hand column, and every `?`
//! marks a byte something has written.

use std::ops::Range;

use crate::api::config::WatchConfig;
use crate::output::ReportSink;
use crate::platform::{AddressWidth, MemoryBus};
use crate::region::{MemoryRegion, ROW_BYTES};

/// Glyph for a byte that is not the sentinel.
pub const ANOMALY_GLYPH: char = '?';
/// Glyph for an untouched sentinel byte.
pub const SENTINEL_GLYPH: char = ' ';
/// Glyph for a non-printable byte inside the command buffer.
pub const NON_PRINTABLE_GLYPH: char = '.';

/// One rendered row of a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpRow {
    /// Address of the first byte, a multiple of 16.
    pub address: usize,
    /// The raw bytes, `None` where the bus could not read.
    pub bytes: [Option<u8>; ROW_BYTES],
    /// Verdict glyph for each byte.
    pub glyphs: [char; ROW_BYTES],
}

impl DumpRow {
    /// Number of bytes flagged as anomalies.
    pub fn anomalies(&self) -> usize {
        self.glyphs.iter().filter(|&&g| g == ANOMALY_GLYPH).count()
    }

    /// Render as `ADDR:b0 b1 .. b7 -b8 .. b15 |glyphs`.
    pub fn render(&self, width: AddressWidth) -> String {
        let mut line = String::with_capacity(width.hex_digits() + 3 * ROW_BYTES + ROW_BYTES + 3);
        line.push_str(&width.format(self.address));
        line.push(':');
        for (i, byte) in self.bytes.iter().enumerate() {
            if i == ROW_BYTES / 2 {
                line.push('-');
            }
            match byte {
                Some(b) => line.push_str(&format!("{:02X}", b)),
                None => line.push_str("--"),
            }
            line.push(' ');
        }
        line.push('|');
        line.extend(self.glyphs.iter());
        line
    }

    /// Write the row through the formatter contract.
    pub fn emit_to(&self, out: &mut dyn ReportSink, width: AddressWidth) {
        out.emit_hex_word(self.address, width);
        out.emit_text(":");
        for (i, byte) in self.bytes.iter().enumerate() {
            if i == ROW_BYTES / 2 {
                out.emit_text("-");
            }
            match byte {
                Some(b) => out.emit_hex_byte(*b),
                None => out.emit_text("--"),
            }
            out.emit_text(" ");
        }
        out.emit_text("|");
        let glyphs: String = self.glyphs.iter().collect();
        out.emit_text(&glyphs);
        out.emit_line();
    }
}

/// Decide the glyph for one byte.
pub fn classify_byte(
    addr: usize,
    byte: Option<u8>,
    exempt: Option<&Range<usize>>,
    sentinel: u8,
) -> char {
    let Some(byte) = byte else {
        return SENTINEL_GLYPH;
    };
    if exempt.map_or(false, |zone| zone.contains(&addr)) {
        if (0x20..=0x7E).contains(&byte) {
            byte as char
        } else {
            NON_PRINTABLE_GLYPH
        }
    } else if byte == sentinel {
        SENTINEL_GLYPH
    } else {
        ANOMALY_GLYPH
    }
}

/// Iterator over the rows of a dump.
pub struct DumpRows<'a, B: ?Sized> {
    bus: &'a B,
    next: usize,
    end: usize,
    exempt: Option<Range<usize>>,
    sentinel: u8,
}

impl<'a, B: MemoryBus + ?Sized> Iterator for DumpRows<'a, B> {
    type Item = DumpRow;

    fn next(&mut self) -> Option<DumpRow> {
        if self.next >= self.end {
            return None;
        }
        let address = self.next;
        let mut bytes = [None; ROW_BYTES];
        let mut glyphs = [SENTINEL_GLYPH; ROW_BYTES];
        for i in 0..ROW_BYTES {
            let addr = address + i;
            bytes[i] = self.bus.read_byte(addr);
            glyphs[i] = classify_byte(addr, bytes[i], self.exempt.as_ref(), self.sentinel);
        }
        self.next = address.saturating_add(ROW_BYTES);
        Some(DumpRow { address, bytes, glyphs })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next) / ROW_BYTES;
        (remaining, Some(remaining))
    }
}

impl<'a, B: MemoryBus + ?Sized> ExactSizeIterator for DumpRows<'a, B> {}

/// Rows covering every address from the lower to the higher boundary of
/// `region`, inclusive, aligned to 16-byte rows.
///
/// A collided region is dumped from the stack top up to the heap end.
pub fn dump_rows<'a, B: MemoryBus + ?Sized>(
    bus: &'a B,
    region: MemoryRegion,
    exempt: Option<Range<usize>>,
    config: &WatchConfig,
) -> DumpRows<'a, B> {
    let rows = region.aligned_rows();
    DumpRows {
        bus,
        next: rows.start,
        end: rows.end,
        exempt,
        sentinel: config.sentinel,
    }
}
