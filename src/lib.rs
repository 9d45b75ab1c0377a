//! sodiumbox - key-derived message encryption using NaCl secretbox
//!
//! Messages are sealed with XSalsa20Poly1305 under a BLAKE2b-derived key and
//! encoded as `<hex nonce>.<hex ciphertext>`, byte-compatible with libsodium.

#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod keysource;
pub mod payload;

pub use codec::SecretBoxCodec;
pub use error::{CodecError, ErrorCategory, ErrorKind, MissingKey, Result};
