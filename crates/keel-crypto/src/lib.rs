//! Cryptographic primitives for Keel.
//!
//! This crate provides:
//! - X25519 identity keys with validation and constant-time comparison
//! - Precomputed shared keys for amortized encryption toward one peer
//! - XChaCha20-Poly1305 authenticated encryption with explicit nonces
//! - Nonce generation and constant-time increment
//! - The sealed request codec for pre-session messages
//!
//! # Design
//!
//! Two identities that have never spoken exchange self-contained
//! request packets (friend requests, NAT pings) before any session
//! exists. Each packet carries both public keys and a fresh random
//! nonce in the clear, followed by a ciphertext sealed under the
//! X25519 shared secret of the two identities; the Poly1305 tag is
//! the only integrity boundary.
//!
//! Callers that exchange many messages with one peer should derive a
//! [`SharedKey`] once with [`SharedKey::precompute`] and use the
//! symmetric entry points; the one-shot asymmetric entry points exist
//! for self-contained packets and re-derive (and zero) the key per
//! call.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod keys;
pub mod nonce;
pub mod random;
pub mod request;

pub use cipher::{decrypt, decrypt_symmetric, encrypt, encrypt_symmetric, CipherError};
pub use keys::{keys_equal, KeyError, Keypair, PublicKey, SecretKey, SharedKey};
pub use nonce::Nonce;
pub use random::{random_u32, random_u64};
pub use request::{create_request, handle_request, Request, RequestError};
