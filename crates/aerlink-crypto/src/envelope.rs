//! Envelope encryption and integrity checking.
//!
//! Every encrypted exchange with the device is a single ASCII envelope:
//! the session key, the uppercase-hex AES-128-CBC ciphertext, and a
//! 64-character uppercase-hex SHA-256 digest over the first two parts.
//! The cipher key and IV are both derived from the session key, so an
//! envelope carries everything needed to decrypt it - the digest is the
//! only tamper check.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::NoPadding};
use md5::Md5;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::client_key::ClientKey;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Shared secret baked into the device firmware.
pub const DEVICE_SECRET: &str = "JiangPan";

/// AES block size; also the maximum pad length.
const BLOCK_SIZE: usize = 16;

/// Length of the hex-rendered SHA-256 digest suffix.
const DIGEST_LEN: usize = 64;

/// Errors from envelope encoding and decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// A session key was not 8 hex characters.
    #[error("invalid session key: expected 8 hex characters, got {length}")]
    InvalidKey {
        /// Length of the rejected input.
        length: usize,
    },

    /// The envelope digest did not match the recomputed value.
    #[error("envelope digest mismatch")]
    DigestMismatch,

    /// The envelope could not be split or its ciphertext decoded.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope {
        /// What was wrong with the envelope.
        reason: &'static str,
    },

    /// The decrypted payload did not end with a valid pad block.
    #[error("invalid padding in decrypted payload")]
    Padding,
}

/// Derive the AES-128-CBC key and IV for a session key.
///
/// Computes `MD5(secret || key)`, renders it as 32 uppercase hex
/// characters, and uses the UTF-8 bytes of each 16-character half
/// directly as key and IV. Pure; constant-time behavior is not required
/// by the protocol.
pub fn derive_key_iv(secret: &str, key: ClientKey) -> ([u8; BLOCK_SIZE], [u8; BLOCK_SIZE]) {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    hasher.update(key.to_string().as_bytes());

    let hex = hex::encode_upper(hasher.finalize());
    let bytes = hex.as_bytes();

    let mut cipher_key = [0u8; BLOCK_SIZE];
    let mut iv = [0u8; BLOCK_SIZE];
    cipher_key.copy_from_slice(&bytes[..BLOCK_SIZE]);
    iv.copy_from_slice(&bytes[BLOCK_SIZE..]);

    (cipher_key, iv)
}

/// Encrypt a plaintext into a wire envelope under the given session key.
///
/// The plaintext is padded to a block multiple with `n` bytes of value
/// `n`; a plaintext that is already block-aligned still receives a full
/// 16-byte pad block of value `0x10`. This mirrors the device firmware
/// exactly and must not be replaced with padding omission.
pub fn encrypt(key: ClientKey, plaintext: &[u8]) -> String {
    let (cipher_key, iv) = derive_key_iv(DEVICE_SECRET, key);

    let pad = BLOCK_SIZE - plaintext.len() % BLOCK_SIZE;
    let mut padded = plaintext.to_vec();
    padded.resize(plaintext.len() + pad, pad as u8);

    let ciphertext = Aes128CbcEnc::new(&cipher_key.into(), &iv.into())
        .encrypt_padded_vec_mut::<NoPadding>(&padded);

    let token = key.to_string();
    let ciphertext_hex = hex::encode_upper(ciphertext);
    let digest = digest_for(&token, &ciphertext_hex);

    let mut envelope = String::with_capacity(token.len() + ciphertext_hex.len() + DIGEST_LEN);
    envelope.push_str(&token);
    envelope.push_str(&ciphertext_hex);
    envelope.push_str(&digest);
    envelope
}

/// Decrypt a wire envelope, verifying its digest first.
///
/// Returns the plaintext bytes with the trailing pad block removed.
/// Consumers parse the result as UTF-8 JSON.
///
/// # Errors
///
/// - [`CryptoError::DigestMismatch`] if the digest does not match; no
///   decryption is attempted in that case.
/// - [`CryptoError::MalformedEnvelope`] if the envelope cannot be split
///   into its three parts or the ciphertext is not valid block-aligned
///   hex.
/// - [`CryptoError::Padding`] if the decrypted payload does not end with
///   a coherent pad block.
pub fn decrypt(envelope: &str) -> Result<Vec<u8>, CryptoError> {
    if !envelope.is_ascii() {
        return Err(CryptoError::MalformedEnvelope { reason: "not ASCII" });
    }
    if envelope.len() < ClientKey::WIRE_LEN + 2 * BLOCK_SIZE + DIGEST_LEN {
        return Err(CryptoError::MalformedEnvelope { reason: "too short" });
    }

    let (token, rest) = envelope.split_at(ClientKey::WIRE_LEN);
    let (ciphertext_hex, digest) = rest.split_at(rest.len() - DIGEST_LEN);

    if digest_for(token, ciphertext_hex) != digest {
        return Err(CryptoError::DigestMismatch);
    }

    let key = ClientKey::parse(token)?;
    let ciphertext = hex::decode(ciphertext_hex)
        .map_err(|_| CryptoError::MalformedEnvelope { reason: "ciphertext is not hex" })?;

    let (cipher_key, iv) = derive_key_iv(DEVICE_SECRET, key);
    let padded = Aes128CbcDec::new(&cipher_key.into(), &iv.into())
        .decrypt_padded_vec_mut::<NoPadding>(&ciphertext)
        .map_err(|_| CryptoError::MalformedEnvelope { reason: "ciphertext not block-aligned" })?;

    strip_pad(padded)
}

/// Uppercase-hex SHA-256 over token and hex ciphertext.
fn digest_for(token: &str, ciphertext_hex: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.update(ciphertext_hex.as_bytes());
    hex::encode_upper(hasher.finalize())
}

/// Validate and remove the trailing pad block.
///
/// The last byte gives the pad length; every pad byte must carry that
/// same value.
fn strip_pad(mut padded: Vec<u8>) -> Result<Vec<u8>, CryptoError> {
    let pad = usize::from(*padded.last().ok_or(CryptoError::Padding)?);
    if pad == 0 || pad > BLOCK_SIZE || pad > padded.len() {
        return Err(CryptoError::Padding);
    }

    let body_len = padded.len() - pad;
    if padded[body_len..].iter().any(|&b| b as usize != pad) {
        return Err(CryptoError::Padding);
    }

    padded.truncate(body_len);
    Ok(padded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    // Reference vector produced by the device firmware's cipher: the
    // control document for a Turbo mode change, encrypted under key
    // 0000000B.
    const TURBO_PLAINTEXT: &[u8] = br#"{"state":{"desired":{"CommandType":"app","DeviceId":"","EnduserId":"","D03-12":"Turbo"}}}"#;
    const TURBO_ENVELOPE: &str = "0000000B698EA726A265C48549F18D0A5269F0965DD0029CB118BD313DF7C7A749812C5423A70FB38C2DC3FE6FFE899B0B0F3323703C7DB851EF9473CC455A236E5D0F3AD8A9FBB4D33A195E8BBA8C28D00888B0265797113B2846B5658205B179BBF4B48A0EC7C4BC04564D19CE11C8874208A4F8BB78428021E60DE180F3716591B941";

    fn key(text: &str) -> ClientKey {
        ClientKey::parse(text).unwrap()
    }

    #[test]
    fn derive_key_iv_known_vector() {
        let (cipher_key, iv) = derive_key_iv(DEVICE_SECRET, key("0000000B"));

        assert_eq!(&cipher_key, b"2A564B6FD1B753B4");
        assert_eq!(&iv, b"DB4DB0F798FB6BD4");
    }

    #[test]
    fn derive_key_iv_is_deterministic_and_token_sensitive() {
        let a = derive_key_iv(DEVICE_SECRET, key("0000000A"));
        let b = derive_key_iv(DEVICE_SECRET, key("0000000B"));

        assert_eq!(a, derive_key_iv(DEVICE_SECRET, key("0000000A")));
        assert_ne!(a, b);
    }

    #[test]
    fn encrypt_known_vector() {
        assert_eq!(encrypt(key("0000000B"), TURBO_PLAINTEXT), TURBO_ENVELOPE);
    }

    #[test]
    fn decrypt_known_vector() {
        assert_eq!(decrypt(TURBO_ENVELOPE).unwrap(), TURBO_PLAINTEXT);
    }

    #[test]
    fn decrypt_known_vector_small() {
        // {"on":true} under key 0000000A.
        let envelope = "0000000AD600244C61F5B4BDFA846B03DB2ADDEEAE4B65A18E47D3F8B40F4B9DA5FB463A6BA9D7C9D4BED38AEDBAA59979A0806B";
        assert_eq!(decrypt(envelope).unwrap(), br#"{"on":true}"#);
    }

    #[test]
    fn aligned_plaintext_still_receives_full_pad_block() {
        // 16 plaintext bytes pad to 32, so 64 hex chars of ciphertext.
        let envelope = encrypt(key("00000001"), b"0123456789ABCDEF");
        assert_eq!(envelope.len(), 8 + 64 + 64);
        assert_eq!(decrypt(&envelope).unwrap(), b"0123456789ABCDEF");
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let envelope = encrypt(key("00000001"), b"");
        assert_eq!(envelope.len(), 8 + 32 + 64);
        assert_eq!(decrypt(&envelope).unwrap(), b"");
    }

    #[test]
    fn decrypt_rejects_truncated_envelope() {
        assert_eq!(
            decrypt("0000000A"),
            Err(CryptoError::MalformedEnvelope { reason: "too short" })
        );
        assert_eq!(
            decrypt(""),
            Err(CryptoError::MalformedEnvelope { reason: "too short" })
        );
    }

    #[test]
    fn decrypt_rejects_non_ascii() {
        let envelope = format!("é{}", &TURBO_ENVELOPE[2..]);
        assert_eq!(
            decrypt(&envelope),
            Err(CryptoError::MalformedEnvelope { reason: "not ASCII" })
        );
    }

    #[test]
    fn decrypt_rejects_tampered_ciphertext() {
        let mut envelope = TURBO_ENVELOPE.to_string();
        // Flip one ciphertext character; the digest no longer matches.
        let flipped = if envelope.as_bytes()[20] == b'0' { "1" } else { "0" };
        envelope.replace_range(20..21, flipped);

        assert_eq!(decrypt(&envelope), Err(CryptoError::DigestMismatch));
    }

    fn flip_hex_char(c: u8) -> char {
        if c == b'0' { '1' } else { '0' }
    }

    proptest! {
        #[test]
        fn round_trip(value: u32, plaintext in proptest::collection::vec(any::<u8>(), 0..256)) {
            let key = ClientKey::from(value);
            let envelope = encrypt(key, &plaintext);

            prop_assert_eq!(decrypt(&envelope).unwrap(), plaintext);
        }

        #[test]
        fn envelope_length_formula(value: u32, plaintext in proptest::collection::vec(any::<u8>(), 0..256)) {
            let envelope = encrypt(ClientKey::from(value), &plaintext);
            let padded_len = plaintext.len() + (16 - plaintext.len() % 16);

            prop_assert_eq!(envelope.len(), 8 + 2 * padded_len + 64);
            prop_assert!(envelope.is_ascii());
        }

        #[test]
        fn any_corrupted_digest_character_is_rejected(
            value: u32,
            plaintext in proptest::collection::vec(any::<u8>(), 0..128),
            corrupt_at in 0usize..64,
        ) {
            let envelope = encrypt(ClientKey::from(value), &plaintext);
            let digest_start = envelope.len() - 64;
            let index = digest_start + corrupt_at;

            let mut corrupted = envelope;
            let replacement = flip_hex_char(corrupted.as_bytes()[index]);
            corrupted.replace_range(index..=index, &replacement.to_string());

            prop_assert_eq!(decrypt(&corrupted), Err(CryptoError::DigestMismatch));
        }
    }
}
