//! Hex payload encoding for sealed messages
//!
//! The encoded format is `<hex nonce>.<hex ciphertext>`:
//! - nonce first, always 24 bytes (48 hex characters)
//! - a single literal `.` separator
//! - the secretbox ciphertext, 16-byte tag included
//!
//! Encoding is always lowercase. Decoding accepts either case.

use crate::codec::{MAC_LEN, NONCE_LEN};
use crate::error::{CodecError, ErrorKind, Result};

/// Separator between the nonce and ciphertext segments
pub const SEPARATOR: char = '.';

/// A decoded payload, ready to be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

/// Encode a nonce and ciphertext into a payload string
pub fn wrap(nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> String {
    format!("{}{}{}", hex::encode(nonce), SEPARATOR, hex::encode(ciphertext))
}

/// Decode a payload string into its nonce and ciphertext
pub fn unwrap(payload: &str) -> Result<SealedPayload> {
    let mut segments = payload.split(SEPARATOR);
    let (nonce_hex, ciphertext_hex) = match (segments.next(), segments.next(), segments.next()) {
        (Some(nonce), Some(ciphertext), None) if !nonce.is_empty() && !ciphertext.is_empty() => {
            (nonce, ciphertext)
        }
        _ => {
            return Err(CodecError::new(
                ErrorKind::Malformation,
                "decryption payload malformed; expected <nonce>.<ciphertext>",
            ));
        }
    };

    let nonce_bytes = decode_segment("nonce", nonce_hex)?;
    let nonce: [u8; NONCE_LEN] = nonce_bytes.as_slice().try_into().map_err(|_| {
        CodecError::new(
            ErrorKind::Malformation,
            format!(
                "nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce_bytes.len()
            ),
        )
    })?;

    let ciphertext = decode_segment("ciphertext", ciphertext_hex)?;
    if ciphertext.len() < MAC_LEN {
        return Err(CodecError::new(
            ErrorKind::Malformation,
            format!(
                "ciphertext must be at least {} bytes, got {}",
                MAC_LEN,
                ciphertext.len()
            ),
        ));
    }

    Ok(SealedPayload { nonce, ciphertext })
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>> {
    hex::decode(segment).map_err(|e| {
        CodecError::with_source(ErrorKind::Malformation, format!("{} is not valid hex", name), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ciphertext_hex(len: usize) -> String {
        "ab".repeat(len)
    }

    #[test]
    fn test_wrap_layout() {
        let nonce = [0x0fu8; NONCE_LEN];
        let wrapped = wrap(&nonce, &[0xde, 0xad, 0xbe, 0xef]);

        assert_eq!(
            wrapped,
            "0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f.deadbeef"
        );
    }

    #[test]
    fn test_unwrap_valid() {
        let nonce = [7u8; NONCE_LEN];
        let ciphertext = vec![0x42u8; MAC_LEN + 5];
        let parsed = unwrap(&wrap(&nonce, &ciphertext)).unwrap();

        assert_eq!(parsed.nonce, nonce);
        assert_eq!(parsed.ciphertext, ciphertext);
    }

    #[test]
    fn test_unwrap_accepts_uppercase() {
        let payload = format!("{}.{}", "AB".repeat(NONCE_LEN), "CD".repeat(MAC_LEN));
        let parsed = unwrap(&payload).unwrap();

        assert_eq!(parsed.nonce, [0xab; NONCE_LEN]);
        assert_eq!(parsed.ciphertext, vec![0xcd; MAC_LEN]);
    }

    #[test]
    fn test_no_separator() {
        let err = unwrap("abc").expect_err("expected malformation");
        assert_eq!(err.kind, ErrorKind::Malformation);
    }

    #[test]
    fn test_two_separators() {
        let err = unwrap("ab.cd.ef").expect_err("expected malformation");
        assert_eq!(err.kind, ErrorKind::Malformation);
    }

    #[test]
    fn test_empty_segments() {
        let nonce_hex = "00".repeat(NONCE_LEN);

        for payload in [
            String::new(),
            ".".to_string(),
            format!("{}.", nonce_hex),
            format!(".{}", ciphertext_hex(MAC_LEN)),
        ] {
            let err = unwrap(&payload).expect_err("expected malformation");
            assert_eq!(err.kind, ErrorKind::Malformation, "payload {:?}", payload);
        }
    }

    #[test]
    fn test_bad_hex() {
        let nonce_hex = "00".repeat(NONCE_LEN);

        let err = unwrap(&format!("{}.zz{}", nonce_hex, ciphertext_hex(MAC_LEN)))
            .expect_err("expected malformation");
        assert_eq!(err.kind, ErrorKind::Malformation);
        assert!(err.source_error().is_some());

        let err = unwrap(&format!("{}0.{}", nonce_hex, ciphertext_hex(MAC_LEN)))
            .expect_err("odd-length hex should be malformed");
        assert_eq!(err.kind, ErrorKind::Malformation);
    }

    #[test]
    fn test_wrong_nonce_length() {
        let short = format!("{}.{}", "00".repeat(NONCE_LEN - 1), ciphertext_hex(MAC_LEN));
        let long = format!("{}.{}", "00".repeat(NONCE_LEN + 1), ciphertext_hex(MAC_LEN));

        for payload in [short, long] {
            let err = unwrap(&payload).expect_err("expected malformation");
            assert_eq!(err.kind, ErrorKind::Malformation);
            assert!(err.message().contains("nonce must be 24 bytes"));
        }
    }

    #[test]
    fn test_ciphertext_shorter_than_tag() {
        let payload = format!("{}.{}", "00".repeat(NONCE_LEN), ciphertext_hex(MAC_LEN - 1));
        let err = unwrap(&payload).expect_err("expected malformation");

        assert_eq!(err.kind, ErrorKind::Malformation);
    }
}
