//! Authenticated encryption over precomputed shared keys.
//!
//! XChaCha20-Poly1305 with explicit 24-byte nonces. The contract is
//! `len(ciphertext) = len(plaintext) + 16`: the primitive appends the
//! Poly1305 tag and needs no padding of its own. Decryption failure
//! is reported as a single opaque [`CipherError::AuthenticationFailure`]
//! whether the cause was tampering, a wrong key, or a wrong nonce.
//!
//! The asymmetric entry points are one-shot wrappers that derive the
//! shared key for a single call; use [`SharedKey::precompute`] and
//! the symmetric entry points when talking to one peer repeatedly.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

use keel_core::TAG_SIZE;

use crate::keys::{PublicKey, SecretKey, SharedKey};
use crate::nonce::Nonce;

/// Upper bound on a single plaintext, matching the 16-bit length
/// fields of the surrounding transport.
pub const MAX_MESSAGE_SIZE: usize = 65_535;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("plaintext must not be empty")]
    EmptyPlaintext,

    #[error("message too large: {0} bytes")]
    MessageTooLarge(usize),

    #[error("ciphertext too short: {0} bytes")]
    TruncatedCiphertext(usize),

    #[error("encryption failed")]
    EncryptionFailed,

    /// Tag verification failed: tampering, wrong key, or wrong nonce.
    /// Deliberately not subdivided further.
    #[error("authentication failure")]
    AuthenticationFailure,
}

/// Encrypt `plaintext` under a precomputed shared key.
///
/// Returns ciphertext of exactly `plaintext.len() + 16` bytes.
pub fn encrypt_symmetric(
    key: &SharedKey,
    nonce: &Nonce,
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if plaintext.is_empty() {
        return Err(CipherError::EmptyPlaintext);
    }
    if plaintext.len() > MAX_MESSAGE_SIZE {
        return Err(CipherError::MessageTooLarge(plaintext.len()));
    }

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|_| CipherError::EncryptionFailed)
}

/// Decrypt `ciphertext` under a precomputed shared key.
///
/// Returns plaintext of exactly `ciphertext.len() - 16` bytes. The
/// tag comparison is a constant-time property of the primitive.
pub fn decrypt_symmetric(
    key: &SharedKey,
    nonce: &Nonce,
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if ciphertext.len() <= TAG_SIZE {
        return Err(CipherError::TruncatedCiphertext(ciphertext.len()));
    }
    if ciphertext.len() > MAX_MESSAGE_SIZE + TAG_SIZE {
        return Err(CipherError::MessageTooLarge(ciphertext.len()));
    }

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(XNonce::from_slice(nonce.as_bytes()), ciphertext)
        .map_err(|_| CipherError::AuthenticationFailure)
}

/// One-shot encrypt toward a peer.
///
/// Derives the shared key for this call only; the key is zeroed on
/// drop on every path out of this function.
pub fn encrypt(
    peer_public: &PublicKey,
    own_secret: &SecretKey,
    nonce: &Nonce,
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let key = SharedKey::precompute(peer_public, own_secret);
    encrypt_symmetric(&key, nonce, plaintext)
}

/// One-shot decrypt from a peer.
///
/// Derives the shared key for this call only; the key is zeroed on
/// drop on every path out of this function.
pub fn decrypt(
    peer_public: &PublicKey,
    own_secret: &SecretKey,
    nonce: &Nonce,
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let key = SharedKey::precompute(peer_public, own_secret);
    decrypt_symmetric(&key, nonce, ciphertext)
}
