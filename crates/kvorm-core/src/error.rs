use crate::value::Value;
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured engine error with a stable classification.
/// `kind` is what callers match on; `origin` names the layer that raised it.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// True when this error carries the given kind.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub(crate) fn primary_key_violation(table: &str, key: &[Value]) -> Self {
        Self::new(
            ErrorKind::PrimaryKeyConstraintViolation,
            ErrorOrigin::Table,
            format!("{table} already has a record with primary key {}", fmt_values(key)),
        )
    }

    pub(crate) fn not_found_on_update(table: &str, key: &[Value]) -> Self {
        Self::new(
            ErrorKind::NotFoundOnUpdate,
            ErrorOrigin::Table,
            format!("{table} has no record with primary key {}", fmt_values(key)),
        )
    }

    pub(crate) fn unique_key_violation(table: &str, fields: &str, values: &[Value]) -> Self {
        Self::new(
            ErrorKind::UniqueKeyViolation,
            ErrorOrigin::Index,
            format!("{table} unique index {fields} already contains {}", fmt_values(values)),
        )
    }

    pub(crate) fn not_found(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, origin, message)
    }

    pub(crate) fn invalid_key_field(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidKeyField, ErrorOrigin::Key, message)
    }

    pub(crate) fn bad_decode_entry(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadDecodeEntry, ErrorOrigin::Entry, message)
    }

    pub(crate) fn unexpected_prefix(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedDecodePrefix, origin, message)
    }

    pub(crate) fn invalid_range(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::InvalidRangeIterationKeys,
            ErrorOrigin::Key,
            message,
        )
    }

    pub(crate) fn index_out_of_bounds(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IndexOutOfBounds, ErrorOrigin::Key, message)
    }

    pub(crate) fn invalid_table(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::InvalidTableDefinition,
            ErrorOrigin::Table,
            message,
        )
    }

    pub(crate) fn invalid_page_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPageRequest, ErrorOrigin::Iterator, message)
    }

    pub(crate) fn json_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::JsonValidationError, ErrorOrigin::Json, message)
    }

    pub(crate) fn corruption(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corruption, origin, message)
    }

    /// Construct a store-origin failure. Backends outside this crate use this
    /// to surface their own I/O errors.
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store, ErrorOrigin::Store, message)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Json, ErrorOrigin::Json, err.to_string())
    }
}

///
/// ErrorKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    PrimaryKeyConstraintViolation,
    NotFoundOnUpdate,
    UniqueKeyViolation,
    InvalidKeyField,
    BytesFieldTooLong,
    BadDecodeEntry,
    UnexpectedDecodePrefix,
    InvalidRangeIterationKeys,
    IndexOutOfBounds,
    JsonValidationError,
    NotFound,
    InvalidTableDefinition,
    InvalidTableId,
    InvalidIndexId,
    DuplicateIndexId,
    DuplicateIndexFields,
    MissingPrimaryKey,
    InvalidAutoIncrementKey,
    AutoIncrementKeyAlreadySet,
    InvalidPageRequest,
    Corruption,
    Serialize,
    Store,
    Json,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryKeyConstraintViolation => "primary_key_constraint_violation",
            Self::NotFoundOnUpdate => "not_found_on_update",
            Self::UniqueKeyViolation => "unique_key_violation",
            Self::InvalidKeyField => "invalid_key_field",
            Self::BytesFieldTooLong => "bytes_field_too_long",
            Self::BadDecodeEntry => "bad_decode_entry",
            Self::UnexpectedDecodePrefix => "unexpected_decode_prefix",
            Self::InvalidRangeIterationKeys => "invalid_range_iteration_keys",
            Self::IndexOutOfBounds => "index_out_of_bounds",
            Self::JsonValidationError => "json_validation_error",
            Self::NotFound => "not_found",
            Self::InvalidTableDefinition => "invalid_table_definition",
            Self::InvalidTableId => "invalid_table_id",
            Self::InvalidIndexId => "invalid_index_id",
            Self::DuplicateIndexId => "duplicate_index_id",
            Self::DuplicateIndexFields => "duplicate_index_fields",
            Self::MissingPrimaryKey => "missing_primary_key",
            Self::InvalidAutoIncrementKey => "invalid_auto_increment_key",
            Self::AutoIncrementKeyAlreadySet => "auto_increment_key_already_set",
            Self::InvalidPageRequest => "invalid_page_request",
            Self::Corruption => "corruption",
            Self::Serialize => "serialize",
            Self::Store => "store",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorOrigin {
    Field,
    Key,
    Entry,
    Table,
    Index,
    Iterator,
    Store,
    Serialize,
    Json,
    Module,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Field => "field",
            Self::Key => "key",
            Self::Entry => "entry",
            Self::Table => "table",
            Self::Index => "index",
            Self::Iterator => "iterator",
            Self::Store => "store",
            Self::Serialize => "serialize",
            Self::Json => "json",
            Self::Module => "module",
        };
        write!(f, "{label}")
    }
}

// Renders a key tuple as `a/b/c` for error messages and entry strings.
pub(crate) fn fmt_values(values: &[Value]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

///
/// TESTS
///
