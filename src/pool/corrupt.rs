//! Fault injector for self-tests.

use crate::api::config::WatchConfig;
use crate::diagnostics::macros::mw_log;
use crate::error::WatchError;
use crate::platform::MemoryBus;
use crate::region::MemoryRegion;

/// Write `count` single bytes at even spacing inside the effective span.
///
/// The stride is `span / (count + 1)`, so the writes split an intact pool
/// into `count + 1` blocks as long as each piece stays longer than the
/// minimum block size. The `i`-th write (1-based) stores `i` truncated to a
/// byte, bumped by one if that happens to equal the sentinel.
///
/// Returns the touched addresses. `count == 0` is a no-op.
pub fn corrupt<B: MemoryBus + ?Sized>(
    bus: &mut B,
    region: MemoryRegion,
    count: usize,
    config: &WatchConfig,
) -> Result<Vec<usize>, WatchError> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let too_small = || WatchError::RegionTooSmall {
        size: region.len(),
        required: config.guards.total(),
    };
    let span = region.effective_span(config.guards).ok_or_else(too_small)?;
    let stride = match count.checked_add(1) {
        Some(pieces) => span.len() / pieces,
        None => 0,
    };
    if stride == 0 {
        return Err(too_small());
    }

    let mut touched = Vec::with_capacity(count);
    for i in 1..=count {
        let addr = span.start + i * stride;
        let value = injection_value(i, config.sentinel);
        if bus.write_byte(addr, value) {
            mw_log!(debug, "corrupting address {:#x} with {:#04x}", addr, value);
            touched.push(addr);
        }
    }

    Ok(touched)
}

fn injection_value(index: usize, sentinel: u8) -> u8 {
    let value = (index % 256) as u8;
    if value == sentinel {
        value.wrapping_add(1)
    } else {
        value
    }
}
