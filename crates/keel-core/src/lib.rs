//! Core Keel protocol types, framing, and constants.
//!
//! This crate provides:
//! - Wire constants and the request-kind registry
//! - Bounds-checked framing for pre-session request packets
//! - The injectable clock service used by the session layer
//!
//! The cryptographic half of the protocol (key agreement, AEAD,
//! nonce management) lives in `keel-crypto`, which builds on the
//! framing defined here.

#![forbid(unsafe_code)]

pub mod time;

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Wire tag marking an encrypted pre-session request packet.
pub const REQUEST_PACKET_TYPE: u8 = 32;

/// Size of an X25519 public key on the wire.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce on the wire.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag appended to every ciphertext.
pub const TAG_SIZE: usize = 16;

/// Fixed Request Packet Header (89 bytes)
/// [Type (1B)][Recipient PK (32B)][Sender PK (32B)][Nonce (24B)]
pub const REQUEST_HEADER_SIZE: usize = 1 + PUBLIC_KEY_SIZE * 2 + NONCE_SIZE;

/// Smallest parseable request packet: header plus a ciphertext that
/// holds at least the one-byte request kind and the tag.
pub const MIN_REQUEST_SIZE: usize = REQUEST_HEADER_SIZE + 1 + TAG_SIZE;

/// Hard cap on a request packet, enforced on both build and parse.
pub const MAX_REQUEST_SIZE: usize = 1024;

/// Largest request payload that still fits under [`MAX_REQUEST_SIZE`].
pub const MAX_REQUEST_DATA_SIZE: usize = MAX_REQUEST_SIZE - MIN_REQUEST_SIZE;

/// Request kinds carried in the first plaintext byte of a request.
pub mod request_kind {
    /// Friend request.
    pub const FRIEND: u8 = 32;
    /// Hardening probe.
    pub const HARDENING: u8 = 48;
    /// DHT public-key announce.
    pub const DHT_ANNOUNCE: u8 = 156;
    /// NAT ping.
    pub const NAT_PING: u8 = 254;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("packet too short: {0}")]
    TooShort(usize),
    #[error("packet exceeds request cap: {0}")]
    TooLarge(usize),
    #[error("invalid packet type: {0}")]
    InvalidPacketType(u8),
}

/// Unencrypted view of a request packet.
///
/// The recipient and sender keys travel in the clear because the
/// receiver needs them to select decryption keys before any
/// decryption is possible; the authentication tag inside the
/// ciphertext is the actual security boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub recipient: [u8; PUBLIC_KEY_SIZE],
    pub sender: [u8; PUBLIC_KEY_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Bytes,
}

impl RequestFrame {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(REQUEST_HEADER_SIZE + self.ciphertext.len());
        buf.put_u8(REQUEST_PACKET_TYPE);
        buf.put_slice(&self.recipient);
        buf.put_slice(&self.sender);
        buf.put_slice(&self.nonce);
        buf.put_slice(&self.ciphertext);
        buf.freeze()
    }

    pub fn decode(bytes: Bytes) -> Result<Self, FrameError> {
        if bytes.len() < MIN_REQUEST_SIZE {
            return Err(FrameError::TooShort(bytes.len()));
        }
        if bytes.len() > MAX_REQUEST_SIZE {
            return Err(FrameError::TooLarge(bytes.len()));
        }
        if bytes[0] != REQUEST_PACKET_TYPE {
            return Err(FrameError::InvalidPacketType(bytes[0]));
        }

        let mut recipient = [0u8; PUBLIC_KEY_SIZE];
        recipient.copy_from_slice(&bytes[1..1 + PUBLIC_KEY_SIZE]);

        let mut sender = [0u8; PUBLIC_KEY_SIZE];
        sender.copy_from_slice(&bytes[1 + PUBLIC_KEY_SIZE..1 + PUBLIC_KEY_SIZE * 2]);

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[1 + PUBLIC_KEY_SIZE * 2..REQUEST_HEADER_SIZE]);

        let mut ciphertext = bytes;
        ciphertext.advance(REQUEST_HEADER_SIZE);

        Ok(Self {
            recipient,
            sender,
            nonce,
            ciphertext,
        })
    }

    /// Total encoded size of this frame.
    pub fn encoded_len(&self) -> usize {
        REQUEST_HEADER_SIZE + self.ciphertext.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> RequestFrame {
        RequestFrame {
            recipient: [0x11; PUBLIC_KEY_SIZE],
            sender: [0x22; PUBLIC_KEY_SIZE],
            nonce: [0x33; NONCE_SIZE],
            ciphertext: Bytes::from(vec![0x44; 1 + TAG_SIZE]),
        }
    }

    #[test]
    fn frame_roundtrip() {
        let frame = sample_frame();
        let bytes = frame.encode();
        assert_eq!(bytes.len(), frame.encoded_len());
        assert_eq!(bytes[0], REQUEST_PACKET_TYPE);

        let decoded = RequestFrame::decode(bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn frame_too_short() {
        let bytes = Bytes::from(vec![REQUEST_PACKET_TYPE; MIN_REQUEST_SIZE - 1]);
        assert_eq!(
            RequestFrame::decode(bytes),
            Err(FrameError::TooShort(MIN_REQUEST_SIZE - 1))
        );
    }

    #[test]
    fn frame_too_large() {
        let bytes = Bytes::from(vec![REQUEST_PACKET_TYPE; MAX_REQUEST_SIZE + 1]);
        assert_eq!(
            RequestFrame::decode(bytes),
            Err(FrameError::TooLarge(MAX_REQUEST_SIZE + 1))
        );
    }

    #[test]
    fn frame_invalid_type() {
        let mut raw = sample_frame().encode().to_vec();
        raw[0] = 0x7f;
        assert_eq!(
            RequestFrame::decode(Bytes::from(raw)),
            Err(FrameError::InvalidPacketType(0x7f))
        );
    }

    #[test]
    fn frame_bounds_are_consistent() {
        assert_eq!(REQUEST_HEADER_SIZE, 89);
        assert_eq!(MIN_REQUEST_SIZE, 106);
        assert_eq!(MAX_REQUEST_DATA_SIZE, 918);
    }

    #[test]
    fn frame_at_exact_cap_decodes() {
        let frame = RequestFrame {
            ciphertext: Bytes::from(vec![0u8; MAX_REQUEST_SIZE - REQUEST_HEADER_SIZE]),
            ..sample_frame()
        };
        let bytes = frame.encode();
        assert_eq!(bytes.len(), MAX_REQUEST_SIZE);
        assert!(RequestFrame::decode(bytes).is_ok());
    }
}
