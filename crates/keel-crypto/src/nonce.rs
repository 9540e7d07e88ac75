//! Nonce generation and constant-time increment.
//!
//! A nonce must never repeat under a given shared key. Two schemes
//! satisfy that here: a fresh random nonce per self-contained request
//! packet, and sequential increment for an ongoing message stream.
//! The increment treats the 24 bytes as a big-endian unsigned integer
//! and always walks the full width, so the carry path does not leak
//! through timing.

use std::fmt;

use keel_core::NONCE_SIZE;

use crate::random::fill_random;

/// 24-byte XChaCha20-Poly1305 nonce.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Fresh random nonce; overwhelmingly unlikely to collide with
    /// any nonce ever used under the same key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        fill_random(&mut bytes);
        Self(bytes)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }

    /// Add 1, big-endian, carrying across all 24 bytes.
    ///
    /// The loop always covers the full width; no early exit on a
    /// settled carry.
    pub fn increment(&mut self) {
        let mut carry = 1u16;
        for byte in self.0.iter_mut().rev() {
            carry += u16::from(*byte);
            *byte = carry as u8;
            carry >>= 8;
        }
    }

    /// Add a 32-bit count, big-endian, carrying across all 24 bytes.
    ///
    /// Equivalent to calling [`Nonce::increment`] `n` times.
    pub fn increment_by(&mut self, n: u32) {
        let mut addend = [0u8; NONCE_SIZE];
        addend[NONCE_SIZE - 4..].copy_from_slice(&n.to_be_bytes());

        let mut carry = 0u16;
        for i in (0..NONCE_SIZE).rev() {
            carry += u16::from(self.0[i]) + u16::from(addend[i]);
            self.0[i] = carry as u8;
            carry >>= 8;
        }
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", hex::encode(self.0))
    }
}
