//! Error types for schema definition, encoding and decoding.
//!
//! - [`DefinitionError`]: malformed schema, raised while declaring types. A programming defect.
//! - [`DecodingError`]: truncated or unrecognised wire/JSON input. Recoverable per message.
//! - [`EncodingError`]: an instance does not match its declared schema.

use crate::format::IntType;
use thiserror::Error;

/// Malformed schema detected at declaration time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    #[error("duplicate struct type: {0}")]
    DuplicateStruct(String),
    #[error("unknown struct type: {0}")]
    UnknownStruct(String),
    #[error("{type_name}.{field}: field declared more than once")]
    DuplicateField { type_name: String, field: String },
    #[error("{type_name}.{field}: re-declares a field inherited from {inherited_from}")]
    RedeclaredField {
        type_name: String,
        field: String,
        inherited_from: String,
    },
    #[error("{type_name}.{field}: {reason}")]
    InvalidFormat {
        type_name: String,
        field: String,
        reason: String,
    },
    #[error("{type_name}.{field}: embed requires a nested struct field")]
    EmbedWithoutStruct { type_name: String, field: String },
    #[error("{type_name}.{field}: discriminator must be a single integer scalar")]
    InvalidDiscriminator { type_name: String, field: String },
    #[error("{0}: more than one discriminator field")]
    MultipleDiscriminators(String),
    #[error("discriminator field {field} already used by union {union}")]
    DuplicateDiscriminatorField { field: String, union: String },
    #[error("{0}: variant value given but no union ancestor declares a discriminator")]
    NotAUnion(String),
    #[error("{type_name}: variant value {value} does not fit discriminator {field} ({ty})")]
    VariantOutOfRange {
        type_name: String,
        field: String,
        value: u64,
        ty: IntType,
    },
    #[error("duplicate {field} value {value}: already registered to {existing}")]
    DuplicateVariant {
        field: String,
        value: u64,
        existing: String,
    },
    #[error("{type_name}: {field} is already fixed by ancestor {ancestor}")]
    VariantAlreadyResolved {
        type_name: String,
        field: String,
        ancestor: String,
    },
    #[error("{type_name}: extends union {union} without a variant value for {field}")]
    MissingVariantValue {
        type_name: String,
        union: String,
        field: String,
    },
    #[error("{type_name}.{field}: layout would contain its own ancestor {via}")]
    RecursiveLayout {
        type_name: String,
        field: String,
        via: String,
    },
    #[error("{0}: struct has no fields")]
    EmptyStruct(String),
    #[error("{type_name}: minimum size of {affected} overflows")]
    SizeOverflow { type_name: String, affected: String },
}

/// Leaf-level value problems, reported by formats and wrapped with the field name.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("value {value} out of range for {ty}")]
    OutOfRange { value: i128, ty: IntType },
    #[error("expected {expected} elements, got {found}")]
    ArrayLength { expected: usize, found: usize },
    #[error("{len} items do not fit a {prefix} length prefix")]
    TooLong { len: usize, prefix: IntType },
    #[error("invalid hex string {0:?}")]
    InvalidHex(String),
}

/// Wire or JSON input that cannot be turned into an instance.
#[derive(Debug, Error)]
pub enum DecodingError {
    #[error("truncated input: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("unknown {field} value {value} for union {union}")]
    UnknownDiscriminator {
        union: String,
        field: String,
        value: u64,
    },
    #[error("{type_name}: {field} is {found}, expected {expected}")]
    DiscriminatorMismatch {
        type_name: String,
        field: String,
        expected: u64,
        found: u64,
    },
    #[error("unknown struct type: {0}")]
    UnknownStruct(String),
    #[error("{type_name}: missing field {field}")]
    MissingField { type_name: String, field: String },
    #[error("{field}: {source}")]
    Json {
        field: String,
        #[source]
        source: ValueError,
    },
    #[error("{field}: expected a JSON object")]
    ExpectedObject { field: String },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

/// An instance whose shape does not match its declared schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("unknown struct type: {0}")]
    UnknownStruct(String),
    #[error("{type_name}: missing field {field}")]
    MissingField { type_name: String, field: String },
    #[error("{field}: {source}")]
    Value {
        field: String,
        #[source]
        source: ValueError,
    },
    #[error("{field}: expected a {expected} instance, got {found}")]
    StructExpected {
        field: String,
        expected: String,
        found: &'static str,
    },
    #[error("expected an instance of {expected}, got {found}")]
    NotAVariant { expected: String, found: String },
    #[error("{type_name}: no variant value registered for discriminator {field}")]
    UnresolvedDiscriminator { type_name: String, field: String },
}
