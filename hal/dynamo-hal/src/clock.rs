//! Monotonic time base
//!
//! Millisecond timestamps wrap at `u32::MAX` (about 49.7 days). All
//! elapsed-time arithmetic must go through [`elapsed_ms`] so that a wrap
//! between two samples still yields the correct difference.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary epoch (usually boot)
    fn now_ms(&self) -> u32;
}

/// Wrap-safe difference `now - earlier` in milliseconds
#[inline]
pub const fn elapsed_ms(now: u32, earlier: u32) -> u32 {
    now.wrapping_sub(earlier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_simple() {
        assert_eq!(elapsed_ms(1500, 500), 1000);
        assert_eq!(elapsed_ms(500, 500), 0);
    }

    #[test]
    fn test_elapsed_across_wrap() {
        let earlier = u32::MAX - 99;
        let now = 400;
        assert_eq!(elapsed_ms(now, earlier), 500);
    }
}
