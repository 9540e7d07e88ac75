//! Sealed request codec for pre-session messages.
//!
//! A request packet is the only way two identities talk before a
//! session exists: friend requests, NAT pings, key announces. Each
//! packet is self-contained: a fresh random nonce, both public keys
//! in the clear, and a ciphertext holding the request kind byte and
//! payload:
//!
//! ```text
//! [type 0x20] [recipient pk 32B] [sender pk 32B] [nonce 24B] [ciphertext]
//! ciphertext = seal([kind] ++ data), len = 1 + len(data) + 16
//! ```
//!
//! The whole packet is capped at 1024 bytes. The recipient key in
//! the header is a fast-reject filter so nodes can drop misrouted
//! packets without a scalar multiplication; the authentication tag
//! is the actual security boundary.

use bytes::Bytes;
use tracing::debug;

use keel_core::{FrameError, RequestFrame, MAX_REQUEST_DATA_SIZE};

use crate::cipher::{self, CipherError};
use crate::keys::{keys_equal, PublicKey, SecretKey};
use crate::nonce::Nonce;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("request frame: {0}")]
    Frame(#[from] FrameError),

    #[error("request payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("packet not addressed to this identity")]
    AddressMismatch,

    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// A received, decrypted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub sender: PublicKey,
    pub kind: u8,
    pub data: Vec<u8>,
}

/// Build an encrypted request packet for `peer_public`.
///
/// Generates a fresh random nonce, independent of any session nonce
/// stream, and seals `[kind] ++ data` toward the peer. Fails without
/// producing output if the finished packet would exceed the 1024-byte
/// cap or encryption fails.
pub fn create_request(
    own_public: &PublicKey,
    own_secret: &SecretKey,
    peer_public: &PublicKey,
    kind: u8,
    data: &[u8],
) -> Result<Bytes, RequestError> {
    if data.len() > MAX_REQUEST_DATA_SIZE {
        return Err(RequestError::PayloadTooLarge {
            size: data.len(),
            max: MAX_REQUEST_DATA_SIZE,
        });
    }

    let nonce = Nonce::generate();

    let mut plaintext = Vec::with_capacity(1 + data.len());
    plaintext.push(kind);
    plaintext.extend_from_slice(data);

    let ciphertext = cipher::encrypt(peer_public, own_secret, &nonce, &plaintext)?;

    let frame = RequestFrame {
        recipient: peer_public.to_bytes(),
        sender: own_public.to_bytes(),
        nonce: *nonce.as_bytes(),
        ciphertext: Bytes::from(ciphertext),
    };
    Ok(frame.encode())
}

/// Parse and decrypt a request packet addressed to us.
///
/// Rejects packets outside the framing bounds, packets whose embedded
/// recipient key does not match `own_public` (compared in constant
/// time, before any decryption), and packets whose ciphertext fails
/// authentication.
pub fn handle_request(
    own_public: &PublicKey,
    own_secret: &SecretKey,
    packet: &[u8],
) -> Result<Request, RequestError> {
    let frame = RequestFrame::decode(Bytes::copy_from_slice(packet))?;

    let recipient = PublicKey::from_bytes(frame.recipient);
    if !keys_equal(&recipient, own_public) {
        debug!("dropping request: recipient key is not ours");
        return Err(RequestError::AddressMismatch);
    }

    let sender = PublicKey::from_bytes(frame.sender);
    let nonce = Nonce::from_bytes(frame.nonce);

    let plaintext =
        cipher::decrypt(&sender, own_secret, &nonce, &frame.ciphertext).map_err(|err| {
            debug!("dropping request from {sender:?}: {err}");
            err
        })?;

    // The framing floor guarantees at least the kind byte survives
    // tag removal.
    let kind = plaintext[0];
    let data = plaintext[1..].to_vec();

    Ok(Request { sender, kind, data })
}
