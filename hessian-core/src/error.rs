//! Error types for Hessian encoding and decoding.

use std::fmt;
use thiserror::Error;

/// The table a reference index points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Back-reference to a previously decoded list, map, or object.
    Value,
    /// Compact reference to a previously read class definition.
    Class,
    /// Integer reference to a previously read list/map type name.
    Type,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::Class => f.write_str("class definition"),
            Self::Type => f.write_str("type"),
        }
    }
}

/// The main error type for Hessian operations.
///
/// Every variant is terminal for the encode or decode call that produced it:
/// a partially consumed buffer has no well-defined resumption point.
#[derive(Debug, Error)]
pub enum HessianError {
    /// The leading byte of a value is not valid at this position.
    #[error("malformed tag 0x{tag:02x} at offset {offset}")]
    MalformedTag {
        /// The offending byte.
        tag: u8,
        /// Offset of the byte within the input.
        offset: usize,
    },

    /// The input ended before a claimed length was satisfied.
    #[error("truncated input: need {needed} bytes, have {remaining}")]
    TruncatedInput {
        /// Bytes the current read required.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },

    /// The stream names a class that no native type is registered for.
    #[error("unknown class identity: {0}")]
    UnknownClassIdentity(String),

    /// A back-reference, class reference, or type reference is out of range.
    #[error("invalid {kind} reference {index} (table holds {len})")]
    InvalidReference {
        /// Which table the index was resolved against.
        kind: ReferenceKind,
        /// The index read from the stream.
        index: i64,
        /// Number of entries registered so far.
        len: usize,
    },

    /// The value has no Hessian representation.
    #[error("unencodable type: {0}")]
    UnencodableType(String),

    /// A decoded value cannot be converted into the requested native type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The native type requested.
        expected: String,
        /// The kind of value found in the stream.
        found: String,
    },

    /// A string payload is not valid UTF-8 or contains unpaired surrogates.
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// Composite values are nested deeper than the configured limit.
    #[error("nesting depth exceeds limit of {0}")]
    DepthExceeded(usize),

    /// A shared value could not be borrowed.
    #[error("value already borrowed: {0}")]
    Borrowed(String),

    /// A type descriptor could not be built from a native type's layout.
    #[error("invalid type definition: {0}")]
    Definition(String),

    /// A one-shot decode finished with unread input left over.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

impl HessianError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// A specialized `Result` type for Hessian operations.
pub type Result<T> = std::result::Result<T, HessianError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_tag_display() {
        let err = HessianError::MalformedTag {
            tag: 0x40,
            offset: 12,
        };
        assert_eq!(err.to_string(), "malformed tag 0x40 at offset 12");
    }

    #[test]
    fn test_truncated_input_display() {
        let err = HessianError::TruncatedInput {
            needed: 4,
            remaining: 1,
        };
        assert_eq!(err.to_string(), "truncated input: need 4 bytes, have 1");
    }

    #[test]
    fn test_unknown_class_display() {
        let err = HessianError::UnknownClassIdentity("com.example.Missing".to_string());
        assert_eq!(
            err.to_string(),
            "unknown class identity: com.example.Missing"
        );
    }

    #[test]
    fn test_invalid_reference_display() {
        let err = HessianError::InvalidReference {
            kind: ReferenceKind::Class,
            index: 3,
            len: 1,
        };
        assert_eq!(
            err.to_string(),
            "invalid class definition reference 3 (table holds 1)"
        );
    }

    #[test]
    fn test_type_mismatch_helper() {
        let err = HessianError::mismatch("i32", "string");
        assert_eq!(err.to_string(), "type mismatch: expected i32, found string");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HessianError>();
    }
}
