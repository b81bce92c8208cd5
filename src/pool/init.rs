//! Pool initializer: fills the effective span with the sentinel.

use std::ops::Range;

use crate::api::config::WatchConfig;
use crate::diagnostics::macros::mw_log;
use crate::error::WatchError;
use crate::platform::MemoryBus;
use crate::region::MemoryRegion;

/// A byte that did not read back as the sentinel right after the fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAnomaly {
    /// Address of the byte.
    pub address: usize,
    /// What was read back, `None` if the bus could not read it at all.
    pub found: Option<u8>,
}

impl WriteAnomaly {
    /// The matching error value, for bytes that could be read.
    pub fn to_error(&self) -> Option<WatchError> {
        self.found.map(|found| WatchError::HardwareWriteAnomaly {
            address: self.address,
            found,
        })
    }
}

/// What an initialization wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// The span that was filled.
    pub span: Range<usize>,
    /// Bytes the bus accepted.
    pub bytes_initialized: usize,
    /// Bytes that failed read-back verification.
    pub anomalies: Vec<WriteAnomaly>,
}

impl InitReport {
    /// Whether every written byte read back correctly.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Fill `[start + low, end - high)` with the sentinel and verify it.
///
/// Fails with [`WatchError::RegionTooSmall`] without touching memory when the
/// guard margins leave nothing to fill (this includes a stack/heap
/// collision). Verification failures are not errors: nothing else can have
/// written the pool yet, so they point at the hardware and are returned in
/// [`InitReport::anomalies`].
///
/// This overwrites live memory. The caller must make sure nothing else is
/// using the span.
pub fn initialize<B: MemoryBus + ?Sized>(
    bus: &mut B,
    region: MemoryRegion,
    config: &WatchConfig,
) -> Result<InitReport, WatchError> {
    let span = region
        .effective_span(config.guards)
        .ok_or_else(|| WatchError::RegionTooSmall {
            size: region.len(),
            required: config.guards.total(),
        })?;

    mw_log!(info, "initializing free memory block {:#x}..{:#x}", span.start, span.end);
    let bytes_initialized = bus.fill(span.clone(), config.sentinel);
    mw_log!(info, "{} bytes of memory initialized", bytes_initialized);

    let anomalies: Vec<WriteAnomaly> = span
        .clone()
        .filter_map(|address| match bus.read_byte(address) {
            Some(byte) if byte == config.sentinel => None,
            found => Some(WriteAnomaly { address, found }),
        })
        .collect();

    for anomaly in &anomalies {
        mw_log!(warn, "? address {:#x} = {:?}", anomaly.address, anomaly.found);
    }

    Ok(InitReport {
        span,
        bytes_initialized,
        anomalies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AddressWidth, MemoryBus, SyntheticMemory};

    #[test]
    fn test_fills_effective_span_only() {
        let mut mem = SyntheticMemory::new(0x100, 400);
        let region = MemoryRegion::new(0x100, 0x100 + 400);
        let report = initialize(&mut mem, region, &WatchConfig::default()).unwrap();

        assert_eq!(report.span, 0x108..0x100 + 150);
        assert_eq!(report.bytes_initialized, 142);
        assert!(report.is_clean());
        assert!(mem.bytes()[..8].iter().all(|&b| b == 0));
        assert!(mem.bytes()[8..150].iter().all(|&b| b == 0xE5));
        assert!(mem.bytes()[150..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_too_small_writes_nothing() {
        let mut mem = SyntheticMemory::new(0x100, 258).with_fill(0x5A);
        let before = mem.bytes().to_vec();
        let region = MemoryRegion::new(0x100, 0x100 + 258);

        let err = initialize(&mut mem, region, &WatchConfig::default()).unwrap_err();
        assert_eq!(err, WatchError::RegionTooSmall { size: 258, required: 258 });
        assert_eq!(mem.bytes(), &before[..]);
    }

    #[test]
    fn test_oversized_guards_are_too_small() {
        let mut mem = SyntheticMemory::new(0x100, 400);
        let config = WatchConfig::default().with_guards(usize::MAX, 1);
        let err = initialize(&mut mem, MemoryRegion::new(0x100, 0x100 + 400), &config).unwrap_err();

        assert_eq!(err, WatchError::RegionTooSmall { size: 400, required: usize::MAX });
        assert!(mem.bytes().iter().all(|&b| b == 0));
    }

    /// A bus with one stuck bit, to exercise read-back verification.
    struct StuckBit {
        inner: SyntheticMemory,
        addr: usize,
    }

    impl MemoryBus for StuckBit {
        fn address_width(&self) -> AddressWidth {
            self.inner.address_width()
        }

        fn read_byte(&self, addr: usize) -> Option<u8> {
            let byte = self.inner.read_byte(addr)?;
            Some(if addr == self.addr { byte & !0x01 } else { byte })
        }

        fn write_byte(&mut self, addr: usize, value: u8) -> bool {
            self.inner.write_byte(addr, value)
        }
    }

    #[test]
    fn test_read_back_anomaly_is_reported() {
        let mut bus = StuckBit {
            inner: SyntheticMemory::new(0, 300),
            addr: 20,
        };
        let report = initialize(&mut bus, MemoryRegion::new(0, 300), &WatchConfig::default()).unwrap();

        assert_eq!(report.bytes_initialized, 42);
        assert_eq!(report.anomalies, vec![WriteAnomaly { address: 20, found: Some(0xE4) }]);
        assert_eq!(
            report.anomalies[0].to_error(),
            Some(WatchError::HardwareWriteAnomaly { address: 20, found: 0xE4 })
        );
    }
}
