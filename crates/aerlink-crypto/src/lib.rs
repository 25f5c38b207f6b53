//! Aerlink Cryptographic Envelope
//!
//! This crate implements the encrypted envelope format spoken by the
//! device firmware, plus the session key sequence that doubles as the
//! per-command nonce.
//!
//! # Design
//!
//! All functions in this crate are pure - they have no side effects and
//! produce deterministic outputs given the same inputs. Session key
//! rotation and transport I/O live in `aerlink-client`; this crate only
//! transforms bytes.
//!
//! # Wire format
//!
//! An envelope is a single ASCII string:
//!
//! ```text
//! token (8 hex) || ciphertext (uppercase hex) || digest (64 hex)
//! ```
//!
//! where `digest = SHA-256(token || ciphertext)` rendered as uppercase
//! hex, and the ciphertext is AES-128-CBC keyed from
//! `MD5(secret || token)`. The digest is verified before any decryption
//! is attempted.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod client_key;
pub mod envelope;

pub use client_key::ClientKey;
pub use envelope::{CryptoError, DEVICE_SECRET, decrypt, derive_key_iv, encrypt};
