//! Address alignment utilities.

/// Align an address down to the given power-of-two alignment.
#[inline]
pub const fn align_down(addr: usize, align: usize) -> usize {
    addr & !(align - 1)
}

/// Align an address up to the given power-of-two alignment.
///
/// Saturates instead of wrapping when `addr` is within `align` of `usize::MAX`.
#[inline]
pub const fn align_up(addr: usize, align: usize) -> usize {
    match addr.checked_add(align - 1) {
        Some(v) => v & !(align - 1),
        None => align_down(usize::MAX, align),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(17, 16), 32);
    }

    #[test]
    fn test_align_down() {
        assert_eq!(align_down(0, 16), 0);
        assert_eq!(align_down(15, 16), 0);
        assert_eq!(align_down(0x1B8F, 16), 0x1B80);
        assert_eq!(align_down(0x1B90, 16), 0x1B90);
    }

    #[test]
    fn test_align_up_saturates() {
        assert_eq!(align_up(usize::MAX - 3, 16), usize::MAX & !15);
    }
}
