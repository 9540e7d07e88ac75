//! X25519 identity keys and precomputed shared keys.
//!
//! A Keel identity is an X25519 keypair; the hex-encoded public key
//! is the identifier users exchange out of band. Encryption toward a
//! peer always goes through a [`SharedKey`], derived once per peer
//! from our secret key and their public key and reused for every
//! message. The derivation is the expensive scalar multiplication,
//! so callers cache the result.

use std::fmt;

use hkdf::Hkdf;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, ZeroizeOnDrop};

use keel_core::PUBLIC_KEY_SIZE;

/// Size of an X25519 secret key.
pub const SECRET_KEY_SIZE: usize = 32;

/// Size of a derived symmetric key.
pub const SHARED_KEY_SIZE: usize = 32;

/// Domain-separation salt for shared-key derivation.
const SHARED_KEY_SALT: &[u8] = b"keel-shared-key-v1";

/// HKDF info string. Role-independent so both endpoints derive the
/// same key from the commutative DH output.
const SHARED_KEY_INFO: &[u8] = b"request-cipher";

/// Errors from parsing a public key out of untrusted input.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex encoding")]
    InvalidHex,

    #[error("reserved key bit is set")]
    ReservedBitSet,
}

/// X25519 public key identifying a peer.
///
/// Equality is constant time; prefer [`keys_equal`] at call sites
/// that compare keys from the network.
#[derive(Clone, Copy)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wrap raw key bytes without validation.
    ///
    /// Used for keys lifted from wire packets; untrusted text input
    /// should go through [`PublicKey::from_hex`] instead.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse and validate a hex-encoded public key.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidHex)?;
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; PUBLIC_KEY_SIZE];
        arr.copy_from_slice(&bytes);
        let key = Self(arr);
        if !key.is_valid() {
            return Err(KeyError::ReservedBitSet);
        }
        Ok(key)
    }

    /// Structural sanity check: the top bit of the last byte of a
    /// curve25519 public key is always zero. Necessary but not
    /// sufficient; an input filter, not a proof of curve membership.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0[PUBLIC_KEY_SIZE - 1] & 0x80 == 0
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    #[must_use]
    pub const fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }
}

/// Constant-time public key comparison; true when equal.
#[must_use]
pub fn keys_equal(a: &PublicKey, b: &PublicKey) -> bool {
    a.0.ct_eq(&b.0).into()
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        keys_equal(self, other)
    }
}

impl Eq for PublicKey {}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(self.0))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != PUBLIC_KEY_SIZE {
                return Err(serde::de::Error::invalid_length(bytes.len(), &"32 bytes"));
            }
            let mut arr = [0u8; PUBLIC_KEY_SIZE];
            arr.copy_from_slice(&bytes);
            let key = Self(arr);
            if !key.is_valid() {
                return Err(serde::de::Error::custom(KeyError::ReservedBitSet));
            }
            Ok(key)
        }
    }
}

/// X25519 secret key. Zeroed on drop, never serialized.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_SIZE]);

impl SecretKey {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SECRET_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    ///
    /// # Security
    /// Handle with care; these bytes recreate the identity.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SECRET_KEY_SIZE] {
        &self.0
    }

    /// Derive the matching public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        let secret = StaticSecret::from(self.0);
        PublicKey(*x25519_dalek::PublicKey::from(&secret).as_bytes())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

/// X25519 identity keypair.
pub struct Keypair {
    secret: SecretKey,
    public: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair using the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey(*x25519_dalek::PublicKey::from(&secret).as_bytes());
        Self {
            secret: SecretKey(secret.to_bytes()),
            public,
        }
    }

    /// Rebuild a keypair from a stored secret key.
    #[must_use]
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public
    }

    #[must_use]
    pub const fn secret_key(&self) -> &SecretKey {
        &self.secret
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Symmetric key shared between two identities. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; SHARED_KEY_SIZE]);

impl SharedKey {
    /// Derive the shared key for a peer: X25519 Diffie-Hellman on
    /// `(own_secret, peer_public)` followed by HKDF-SHA256.
    ///
    /// Both endpoints derive the identical key from their own secret
    /// and the other's public key. The scalar multiplication is the
    /// expensive step; callers exchanging many messages with one
    /// peer cache the result instead of re-deriving per message.
    #[must_use]
    pub fn precompute(peer_public: &PublicKey, own_secret: &SecretKey) -> Self {
        let secret = StaticSecret::from(*own_secret.as_bytes());
        let peer = x25519_dalek::PublicKey::from(peer_public.to_bytes());
        let shared = secret.diffie_hellman(&peer);

        let hk = Hkdf::<Sha256>::new(Some(SHARED_KEY_SALT), shared.as_bytes());
        let mut key = [0u8; SHARED_KEY_SIZE];
        hk.expand(SHARED_KEY_INFO, &mut key)
            .expect("32-byte output is within HKDF-SHA256 limits");
        Self(key)
    }

    /// Fresh random symmetric key, for callers that need one not
    /// bound to a peer.
    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; SHARED_KEY_SIZE];
        crate::random::fill_random(&mut key);
        Self(key)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; SHARED_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    ///
    /// # Security
    /// Never log or persist the returned bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SHARED_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_generation_is_unique() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn secret_key_roundtrip() {
        let keypair = Keypair::generate();
        let restored = Keypair::from_secret(keypair.secret_key().clone());
        assert_eq!(keypair.public_key(), restored.public_key());
    }

    #[test]
    fn generated_public_keys_pass_validation() {
        for _ in 0..32 {
            assert!(Keypair::generate().public_key().is_valid());
        }
    }

    #[test]
    fn reserved_bit_rejected() {
        let mut bytes = Keypair::generate().public_key().to_bytes();
        bytes[31] |= 0x80;
        assert!(!PublicKey::from_bytes(bytes).is_valid());

        bytes[31] &= 0x7f;
        assert!(PublicKey::from_bytes(bytes).is_valid());
    }

    #[test]
    fn hex_roundtrip() {
        let key = *Keypair::generate().public_key();
        let parsed = PublicKey::from_hex(&key.to_string()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert_eq!(PublicKey::from_hex("zz"), Err(KeyError::InvalidHex));
        assert_eq!(PublicKey::from_hex("abcd"), Err(KeyError::InvalidLength(2)));

        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        bytes[31] = 0x80;
        assert_eq!(
            PublicKey::from_hex(&hex::encode(bytes)),
            Err(KeyError::ReservedBitSet)
        );
    }

    #[test]
    fn keys_equal_matches_semantics() {
        let a = *Keypair::generate().public_key();
        let b = *Keypair::generate().public_key();
        assert!(keys_equal(&a, &a));
        assert!(!keys_equal(&a, &b));
    }

    #[test]
    fn shared_key_is_commutative() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();

        let ab = SharedKey::precompute(bob.public_key(), alice.secret_key());
        let ba = SharedKey::precompute(alice.public_key(), bob.secret_key());
        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn shared_key_differs_per_peer() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();
        let carol = Keypair::generate();

        let ab = SharedKey::precompute(bob.public_key(), alice.secret_key());
        let ac = SharedKey::precompute(carol.public_key(), alice.secret_key());
        assert_ne!(ab.as_bytes(), ac.as_bytes());
    }

    #[test]
    fn precompute_is_deterministic() {
        let alice = Keypair::generate();
        let bob = Keypair::generate();

        let first = SharedKey::precompute(bob.public_key(), alice.secret_key());
        let second = SharedKey::precompute(bob.public_key(), alice.secret_key());
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn generated_shared_keys_are_unique() {
        assert_ne!(
            SharedKey::generate().as_bytes(),
            SharedKey::generate().as_bytes()
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let keypair = Keypair::generate();
        let rendered = format!("{:?}", keypair.secret_key());
        assert_eq!(rendered, "SecretKey([REDACTED])");

        let shared = SharedKey::generate();
        assert_eq!(format!("{shared:?}"), "SharedKey([REDACTED])");
    }

    #[test]
    fn public_key_serde_json_roundtrip() {
        let key = *Keypair::generate().public_key();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{key}\""));

        let restored: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, restored);
    }
}
