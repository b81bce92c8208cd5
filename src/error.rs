//! Error taxonomy for free-memory checks.

use thiserror::Error;

/// Everything a check, initialization or injection can report.
///
/// None of these halt the controller; they are findings to show the
/// operator. Each has a stable numeric [`code`](WatchError::code).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    /// The region left after guard margins is empty; nothing was written.
    #[error("free memory region too small: {size} bytes, need more than {required}")]
    RegionTooSmall {
        /// Size of the region between heap end and stack top.
        size: usize,
        /// Bytes taken by the guard margins.
        required: usize,
    },

    /// The scan found no sentinel run long enough to be a free block.
    #[error("no free block detected in free memory area")]
    NoFreeBlockDetected,

    /// The scan found more than one free block.
    #[error("memory corruption detected: free memory split into {count} blocks")]
    MultipleFreeBlocksDetected {
        /// Number of blocks found.
        count: usize,
    },

    /// The stack top is below the heap end.
    #[error("stack/heap collision: stack top {end:#x} below heap end {start:#x}")]
    StackHeapCollision {
        /// Heap end.
        start: usize,
        /// Stack top.
        end: usize,
    },

    /// A freshly written sentinel byte read back as something else.
    #[error("hardware write anomaly at {address:#x}: read back {found:#04x}")]
    HardwareWriteAnomaly {
        /// Address of the byte.
        address: usize,
        /// Value read back.
        found: u8,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl WatchError {
    /// Numeric code reported alongside the message.
    ///
    /// Fragmentation reports the block count so callers can tell how many
    /// pieces the pool was split into.
    pub fn code(&self) -> i32 {
        match self {
            WatchError::NoFreeBlockDetected => -1,
            WatchError::MultipleFreeBlocksDetected { count } => {
                i32::try_from(*count).unwrap_or(i32::MAX)
            }
            WatchError::StackHeapCollision { .. } => -2,
            WatchError::RegionTooSmall { .. } => -3,
            WatchError::HardwareWriteAnomaly { .. } => -4,
            WatchError::InvalidConfig(_) => -5,
        }
    }
}
