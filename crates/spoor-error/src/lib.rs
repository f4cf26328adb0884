use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for spoordb operations.
///
/// Structured variants for the failures callers are expected to match on,
/// with enough context embedded to report the failure without access to
/// internal state.
#[derive(Error, Debug)]
pub enum SpoorError {
    // === Construction Errors ===
    /// Bad or missing construction parameters (empty path, duplicate field
    /// name, oversized value list, malformed identifier text).
    #[error("invalid schema: {detail}")]
    Schema { detail: String },

    /// Append between stores whose data-field counts differ.
    #[error("schema mismatch: session has {expected} fields, store has {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// The store rejected one value of an event. `field` is the 0-based
    /// index into the supplied value slice, so the caller can name the
    /// offending value. Prior adds are unaffected.
    #[error("too many values: field index {field} rejected")]
    TooManyValues { field: usize },

    /// Operation on a session that has already been finalized or closed.
    #[error("construction session is closed")]
    SessionClosed,

    // === Store Errors ===
    /// The path could not be opened as a valid store.
    #[error("cannot open store '{path}' ({code:?})")]
    Open { path: PathBuf, code: StoreCode },

    /// Finalize failed inside the store.
    #[error("finalize failed ({code:?})")]
    Finalize { code: StoreCode },

    /// The store's contents are not decodable.
    #[error("store is corrupt: {detail}")]
    Corrupt { detail: String },

    // === Lookup Errors ===
    /// A field name absent from the field-name sequence.
    #[error("unknown field: {name}")]
    UnknownField { name: String },

    /// A field id outside the store's field range.
    #[error("invalid field: {field}")]
    InvalidField { field: u32 },

    /// A value string absent from its field's lexicon.
    #[error("no such value in field {field}: '{value}'")]
    UnknownValue { field: String, value: String },

    /// A value index the store could not resolve to a string.
    #[error("cannot resolve value {value} of field {field}")]
    ValueLookup { field: u32, value: u64 },

    /// A trail id at or beyond `num_trails`.
    #[error("trail id {trail_id} out of range (store has {num_trails} trails)")]
    TrailOutOfRange { trail_id: u64, num_trails: u64 },

    /// An identifier with no trail in the store.
    #[error("identifier not found: {uuid}")]
    UuidNotFound { uuid: String },

    // === Filter Errors ===
    /// A filter operator outside the supported set.
    #[error("invalid op: {op}")]
    InvalidOperator { op: String },

    /// A binary filter array that does not follow the clause framing.
    #[error("malformed filter array: {detail}")]
    BadFilter { detail: String },

    // === I/O ===
    /// File I/O error from the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Store-specific failure codes embedded in [`SpoorError::Open`] and
/// [`SpoorError::Finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StoreCode {
    /// No failure.
    Ok = 0,
    /// The backing resource does not exist.
    Missing = 1,
    /// The file exists but does not start with the store magic.
    BadMagic = 2,
    /// The format version is newer than this build understands.
    UnsupportedVersion = 3,
    /// The file ended mid-record.
    Truncated = 4,
    /// A record decoded to an impossible value.
    Garbled = 5,
    /// Another writer holds the path.
    Conflict = 6,
    /// The write-back itself failed.
    WriteFailed = 7,
}

impl SpoorError {
    /// Whether this is a lookup miss (as opposed to a corrupt store or a
    /// misused API). Membership tests convert exactly these into `false`.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UuidNotFound { .. }
                | Self::TrailOutOfRange { .. }
                | Self::UnknownValue { .. }
                | Self::UnknownField { .. }
        )
    }

    /// Whether the store itself is unusable (open/corruption/I/O class),
    /// as opposed to a bad argument from the caller.
    pub const fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::Open { .. } | Self::Finalize { .. } | Self::Corrupt { .. } | Self::Io(_)
        )
    }

    /// Create a schema error.
    pub fn schema(detail: impl Into<String>) -> Self {
        Self::Schema {
            detail: detail.into(),
        }
    }

    /// Create a corruption error.
    pub fn corrupt(detail: impl Into<String>) -> Self {
        Self::Corrupt {
            detail: detail.into(),
        }
    }

    /// Create an open error for `path`.
    pub fn open(path: impl Into<PathBuf>, code: StoreCode) -> Self {
        Self::Open {
            path: path.into(),
            code,
        }
    }

    /// Create an unknown-field error.
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Create a malformed-filter error.
    pub fn bad_filter(detail: impl Into<String>) -> Self {
        Self::BadFilter {
            detail: detail.into(),
        }
    }
}

/// Result type alias using `SpoorError`.
pub type Result<T> = std::result::Result<T, SpoorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SpoorError::schema("path is required");
        assert_eq!(err.to_string(), "invalid schema: path is required");

        let err = SpoorError::SchemaMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "schema mismatch: session has 3 fields, store has 2"
        );

        let err = SpoorError::TrailOutOfRange {
            trail_id: 9,
            num_trails: 4,
        };
        assert_eq!(
            err.to_string(),
            "trail id 9 out of range (store has 4 trails)"
        );
    }

    #[test]
    fn open_error_carries_code() {
        let err = SpoorError::open("missing.sdb", StoreCode::Missing);
        assert!(matches!(
            err,
            SpoorError::Open {
                code: StoreCode::Missing,
                ..
            }
        ));
        assert!(err.to_string().contains("missing.sdb"));
    }

    #[test]
    fn not_found_classification() {
        assert!(SpoorError::UuidNotFound {
            uuid: "a".repeat(32)
        }
        .is_not_found());
        assert!(SpoorError::TrailOutOfRange {
            trail_id: 1,
            num_trails: 1
        }
        .is_not_found());
        assert!(!SpoorError::SessionClosed.is_not_found());
        assert!(!SpoorError::corrupt("x").is_not_found());
    }

    #[test]
    fn store_failure_classification() {
        assert!(SpoorError::Finalize {
            code: StoreCode::WriteFailed
        }
        .is_store_failure());
        assert!(SpoorError::corrupt("bad lexicon").is_store_failure());
        assert!(!SpoorError::SessionClosed.is_store_failure());
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SpoorError = io_err.into();
        assert!(matches!(err, SpoorError::Io(_)));
        assert!(err.is_store_failure());
    }

    #[test]
    fn store_code_values() {
        assert_eq!(StoreCode::Ok as i32, 0);
        assert_eq!(StoreCode::Missing as i32, 1);
        assert_eq!(StoreCode::Truncated as i32, 4);
        assert_eq!(StoreCode::WriteFailed as i32, 7);
    }
}
