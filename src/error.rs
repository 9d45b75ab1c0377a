use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to the caller.
    Internal,

    /// The caller provided invalid input, a bad key, or no key at all.
    User,
}

/// Which step of key resolution came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKey {
    /// A per-call key was supplied but it is empty.
    CustomKeyEmpty,
    /// No per-call key was supplied and the configured default is empty.
    DefaultKeyEmpty,
    /// Neither a per-call key nor a default key is configured.
    NoKeyAvailable,
}

impl fmt::Display for MissingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MissingKey::CustomKeyEmpty => "custom key is empty",
            MissingKey::DefaultKeyEmpty => "default key is empty",
            MissingKey::NoKeyAvailable => "neither a custom key nor a default key is available",
        };
        f.write_str(msg)
    }
}

/// Condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No usable key could be resolved for the operation.
    KeyNotFound(MissingKey),
    /// The payload is not `<hex nonce>.<hex ciphertext>` or its parts have
    /// impossible lengths.
    Malformation,
    /// Authentication failed due to a wrong key, tampering or corruption.
    Decrypt,
    /// The plaintext is authentic but is not valid UTF-8.
    PlaintextNotUtf8,
    /// NaCl secretbox (XSalsa20Poly1305) failed to seal data.
    SecretboxFailure,
    /// A key could not be obtained from the configured reader.
    KeyUnavailable,
    /// Interaction with stdin/stdout or the filesystem failed.
    Io,
}

impl ErrorKind {
    fn category(self) -> ErrorCategory {
        match self {
            ErrorKind::SecretboxFailure | ErrorKind::Io => ErrorCategory::Internal,
            _ => ErrorCategory::User,
        }
    }
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct CodecError {
    /// Broad error category, derived from the kind.
    pub category: ErrorCategory,
    /// Specific condition tag.
    pub kind: ErrorKind,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl CodecError {
    /// Creates a new error of the given kind with a display message.
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category: kind.category(),
            kind,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category: kind.category(),
            kind,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    pub(crate) fn key_not_found(missing: MissingKey) -> Self {
        Self::new(ErrorKind::KeyNotFound(missing), missing.to_string())
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }

    pub fn is_key_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::KeyNotFound(_))
    }

    pub fn is_malformation(&self) -> bool {
        self.kind == ErrorKind::Malformation
    }

    pub fn is_decrypt(&self) -> bool {
        self.kind == ErrorKind::Decrypt
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_messages_are_distinct() {
        let custom = CodecError::key_not_found(MissingKey::CustomKeyEmpty);
        let default = CodecError::key_not_found(MissingKey::DefaultKeyEmpty);
        let neither = CodecError::key_not_found(MissingKey::NoKeyAvailable);

        assert_eq!(custom.to_string(), "custom key is empty");
        assert_eq!(default.to_string(), "default key is empty");
        assert_ne!(neither.to_string(), custom.to_string());
        assert_ne!(neither.to_string(), default.to_string());
        assert!(neither.is_key_not_found());
        assert_eq!(neither.category, ErrorCategory::User);
    }

    #[test]
    fn test_context_preserves_kind_and_source() {
        let err = CodecError::new(ErrorKind::Decrypt, "inner").with_context("outer");

        assert_eq!(err.message(), "outer");
        assert!(err.is_decrypt());
        let source = err.source_error().expect("context should keep the source");
        assert_eq!(source.to_string(), "inner");
    }

    #[test]
    fn test_io_is_internal() {
        let io = std::io::Error::other("boom");
        let err = CodecError::with_source(ErrorKind::Io, "failed to read", io);

        assert_eq!(err.category, ErrorCategory::Internal);
        assert!(err.source_error().is_some());
    }
}
