//! Error types for schema construction, field lookup and value validation.

use serde_json::json;
use thiserror::Error;

/// HTTP status carried by every [ValidationError].
pub const VALIDATION_STATUS: u16 = 400;
/// Default HTTP status of a [RestError].
pub const DEFAULT_REST_STATUS: u16 = 500;

/// Errors produced when building a [crate::field::FieldDescriptor] or a
/// [crate::schema::TypeDescriptor] from metadata or packed data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Field name is blank.
    #[error("Invalid field name '{0}'")]
    InvalidName(String),
    /// Kind name is not one of the known kinds.
    #[error("Invalid type '{0}'. Valid types: {valid}", valid = crate::constants::FieldKind::valid_names())]
    InvalidKind(String),
    /// Packed code is wider than 5 bits or carries the reserved kind 0.
    #[error("Invalid packed code {code:#07b} for field '{name}'")]
    InvalidCode { name: String, code: u32 },
    /// Enum field declared without values.
    #[error("Cannot define field '{0}' as enum without values")]
    EnumWithoutValues(String),
    /// Values declared on a field that is not an enum.
    #[error("Field '{name}' of type '{kind}' cannot declare enum values")]
    UnexpectedValues { name: String, kind: String },
    /// Enum side-table entry that does not address a field.
    #[error("Enum values declared for field #{ordinal}, but only {fields} fields exist")]
    EnumOrdinalOutOfRange { ordinal: usize, fields: usize },
    /// Packed data does not match the field names.
    #[error("Malformed packed data: {0}")]
    Packed(#[from] ReadError),
}

/// Errors produced when reading codes from packed integers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// A code was requested from a slot past the end of the data.
    #[error("slot {slot} is out of bounds ({len} slots)")]
    OutOfBounds { slot: usize, len: usize },
    /// More slots were supplied than the fields need.
    #[error("expected {expected} slots, found {found}")]
    TrailingSlots { expected: usize, found: usize },
}

/// Reference to a field name that the descriptor does not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Field '{name}' unknown.")]
pub struct LookupError {
    pub name: String,
}

impl LookupError {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A runtime value that cannot be accepted for a field.
///
/// This is the only error meant to reach an API caller. The transport layer
/// turns [ValidationError::status] and [ValidationError::payload] into a
/// client response.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Field label, `name` or `name[i]` for array items.
    pub field: Option<String>,
    /// Offending value, when one was supplied.
    pub value: Option<serde_json::Value>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            value: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn status(&self) -> u16 {
        VALIDATION_STATUS
    }

    /// Structured body: `{"type": "validation", "field": .., "value": ..}`.
    pub fn payload(&self) -> serde_json::Value {
        json!({
            "type": "validation",
            "field": self.field,
            "value": self.value,
        })
    }
}

/// Error carrying an HTTP status and optional JSON data for the transport layer.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RestError {
    pub message: String,
    pub status: u16,
    pub data: Option<serde_json::Value>,
}

impl RestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: DEFAULT_REST_STATUS,
            data: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<ValidationError> for RestError {
    fn from(err: ValidationError) -> Self {
        let data = err.payload();
        RestError {
            message: err.message,
            status: VALIDATION_STATUS,
            data: Some(data),
        }
    }
}

/// Any failure raised by the crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    pub fn status(&self) -> u16 {
        match self {
            Error::Validation(err) => err.status(),
            Error::Schema(_) | Error::Lookup(_) => DEFAULT_REST_STATUS,
        }
    }

    pub fn into_rest(self) -> RestError {
        match self {
            Error::Validation(err) => err.into(),
            other => RestError::new(other.to_string()),
        }
    }
}
