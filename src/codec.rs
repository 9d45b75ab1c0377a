//! Message encryption/decryption using BLAKE2b + XSalsa20Poly1305
//!
//! This module implements key-derived message encryption using:
//! - BLAKE2b with a 32-byte output (libsodium's generic hash) to turn
//!   arbitrary key material into a secretbox key
//! - NaCl secretbox (XSalsa20Poly1305) for authenticated encryption
//!
//! Sealed messages are encoded by [`crate::payload`] as
//! `<hex nonce>.<hex ciphertext>`.

use std::fmt;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{CodecError, ErrorKind, MissingKey, Result};
use crate::payload;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 24;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// Length of the Poly1305 tag carried by every ciphertext
pub const MAC_LEN: usize = 16;

type Blake2b256 = Blake2b<U32>;

/// Derive a 32-byte secretbox key from arbitrary key material
///
/// Unkeyed BLAKE2b with a 32-byte digest; identical to libsodium's
/// `crypto_generichash(key, "", 32)`.
fn derive_subkey(key: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut subkey = Zeroizing::new([0u8; KEY_LEN]);
    subkey.copy_from_slice(&Blake2b256::digest(key));
    subkey
}

/// Encrypts and decrypts messages under a default or per-call key.
///
/// The default key is fixed at construction. All per-call values (resolved
/// key, subkey, nonce) live only for the duration of the call, so one codec
/// can be shared freely across threads.
#[derive(Clone, Default)]
pub struct SecretBoxCodec {
    default_key: Option<Zeroizing<Vec<u8>>>,
}

impl fmt::Debug for SecretBoxCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default_key = match &self.default_key {
            None => "<none>",
            Some(key) if key.is_empty() => "<empty>",
            Some(_) => "<redacted>",
        };
        f.debug_struct("SecretBoxCodec")
            .field("default_key", &default_key)
            .finish()
    }
}

impl SecretBoxCodec {
    /// Create a codec with an optional default key. No validation happens
    /// here; an empty default is only reported when an operation needs it.
    pub fn new(default_key: Option<&str>) -> Self {
        Self::from_bytes(default_key.map(str::as_bytes))
    }

    /// Like [`SecretBoxCodec::new`], for key material that is not UTF-8.
    pub fn from_bytes(default_key: Option<&[u8]>) -> Self {
        Self {
            default_key: default_key.map(|key| Zeroizing::new(key.to_vec())),
        }
    }

    /// Encrypt a text message, returning the encoded payload
    pub fn encrypt(&self, message: &str, key: Option<&str>) -> Result<String> {
        self.encrypt_bytes(message.as_bytes(), key.map(str::as_bytes))
    }

    /// Decrypt an encoded payload into a text message
    pub fn decrypt(&self, payload: &str, key: Option<&str>) -> Result<String> {
        let plaintext = self.decrypt_bytes(payload, key.map(str::as_bytes))?;
        String::from_utf8(plaintext).map_err(|e| {
            CodecError::with_source(
                ErrorKind::PlaintextNotUtf8,
                "decrypted message is not valid UTF-8",
                e.utf8_error(),
            )
        })
    }

    /// Encrypt arbitrary bytes with a fresh random nonce
    pub fn encrypt_bytes(&self, message: &[u8], key: Option<&[u8]>) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        self.encrypt_with_nonce(message, key, &nonce)
    }

    /// Encrypt bytes with a provided nonce
    ///
    /// This function is ONLY for testing purposes to generate deterministic output.
    /// NEVER use this in production - always use `encrypt()` which generates a random nonce.
    pub fn encrypt_with_nonce(
        &self,
        message: &[u8],
        key: Option<&[u8]>,
        nonce: &[u8; NONCE_LEN],
    ) -> Result<String> {
        let key = self.resolve_key(key)?;
        let subkey = derive_subkey(key);

        let cipher = XSalsa20Poly1305::new(&(*subkey).into());
        let ciphertext = cipher
            .encrypt(&Nonce::from(*nonce), message)
            .map_err(|_| {
                CodecError::new(ErrorKind::SecretboxFailure, "secretbox sealing failed")
            })?;

        debug!(
            message_len = message.len(),
            ciphertext_len = ciphertext.len(),
            "sealed message"
        );
        Ok(payload::wrap(nonce, &ciphertext))
    }

    /// Decrypt an encoded payload into the original bytes
    pub fn decrypt_bytes(&self, payload: &str, key: Option<&[u8]>) -> Result<Vec<u8>> {
        let key = self.resolve_key(key)?;
        let sealed = payload::unwrap(payload).inspect_err(|e| {
            debug!(payload_len = payload.len(), error = %e, "rejected malformed payload");
        })?;

        let subkey = derive_subkey(key);
        let cipher = XSalsa20Poly1305::new(&(*subkey).into());
        let plaintext = cipher
            .decrypt(&Nonce::from(sealed.nonce), sealed.ciphertext.as_slice())
            .map_err(|_| {
                debug!(
                    ciphertext_len = sealed.ciphertext.len(),
                    "secretbox authentication failed"
                );
                CodecError::new(
                    ErrorKind::Decrypt,
                    "corrupt input, tampered-with data, or wrong key",
                )
            })?;

        debug!(plaintext_len = plaintext.len(), "opened message");
        Ok(plaintext)
    }

    /// Pick the key for one operation.
    ///
    /// A per-call key wins over the default, but an empty per-call key is an
    /// error rather than a fallback.
    fn resolve_key<'a>(&'a self, custom: Option<&'a [u8]>) -> Result<&'a [u8]> {
        let default = self.default_key.as_deref().map(Vec::as_slice);
        let resolved = match (custom, default) {
            (Some(key), _) if key.is_empty() => Err(MissingKey::CustomKeyEmpty),
            (Some(key), _) => Ok(key),
            (None, Some(key)) if key.is_empty() => Err(MissingKey::DefaultKeyEmpty),
            (None, Some(key)) => Ok(key),
            (None, None) => Err(MissingKey::NoKeyAvailable),
        };
        resolved.map_err(|missing| {
            debug!(%missing, "no usable key");
            CodecError::key_not_found(missing)
        })
    }
}
