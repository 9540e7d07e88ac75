//! Secure randomness helpers.
//!
//! All randomness in this crate comes from [`OsRng`]. If the OS
//! entropy source is unavailable the process aborts via panic; there
//! is deliberately no fallback to a weaker generator.

use rand::rngs::OsRng;
use rand::RngCore;

/// Random 32-bit value for anti-spam numbers and other non-key uses.
#[must_use]
pub fn random_u32() -> u32 {
    OsRng.next_u32()
}

/// Random 64-bit value for anti-spam numbers and other non-key uses.
#[must_use]
pub fn random_u64() -> u64 {
    OsRng.next_u64()
}

/// Fill `buf` with secure random bytes.
pub(crate) fn fill_random(buf: &mut [u8]) {
    OsRng.fill_bytes(buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_are_independent() {
        assert_ne!(random_u64(), random_u64());
    }

    #[test]
    fn values_cover_full_width() {
        // 16 draws with all high bytes zero would mean a broken source.
        assert!((0..16).any(|_| random_u32() > u32::from(u16::MAX)));
        assert!((0..16).any(|_| random_u64() > u64::from(u32::MAX)));
    }

    #[test]
    fn fill_random_touches_buffer() {
        let mut buf = [0u8; 64];
        fill_random(&mut buf);
        assert!(buf.iter().any(|&b| b != 0));
    }
}
