//! Field kinds and the bit layout used to pack field declarations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Set on a packed code when the field is required.
pub const REQUIRED_FLAG: u8 = 0b01000;
/// Set on a packed code when the field holds an array of its kind.
pub const ARRAY_FLAG: u8 = 0b10000;
/// Low bits of a packed code holding the kind.
pub const KIND_MASK: u8 = 0b00111;
/// All bits of a packed code.
pub const CODE_MASK: u8 = 0b11111;

/// Width in bits of one packed field code.
pub const BIT_COUNT: u32 = 5;
/// Fields stored in one packed integer. Slots stay below 2^31.
pub const FIELDS_PER_SLOT: usize = (31 / BIT_COUNT) as usize;
/// Bits used in one packed integer.
pub const MAX_BITS_PER_SLOT: u32 = FIELDS_PER_SLOT as u32 * BIT_COUNT;

/// Scalar data type of a field. Code 0 is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum FieldKind {
    String = 1,
    Integer = 2,
    Number = 3,
    Boolean = 4,
    Date = 5,
    Any = 6,
    Enum = 7,
}

/// Code/name table, indexed by `code - 1`.
const KIND_TABLE: [(FieldKind, &str); 7] = [
    (FieldKind::String, "string"),
    (FieldKind::Integer, "integer"),
    (FieldKind::Number, "number"),
    (FieldKind::Boolean, "boolean"),
    (FieldKind::Date, "date"),
    (FieldKind::Any, "any"),
    (FieldKind::Enum, "enum"),
];

impl FieldKind {
    /// Every kind in code order.
    pub const ALL: [FieldKind; 7] = [
        FieldKind::String,
        FieldKind::Integer,
        FieldKind::Number,
        FieldKind::Boolean,
        FieldKind::Date,
        FieldKind::Any,
        FieldKind::Enum,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up a kind by its 3-bit code. Returns `None` for 0 and anything above 7.
    pub fn from_code(code: u8) -> Option<Self> {
        let index = usize::from(code).checked_sub(1)?;
        KIND_TABLE.get(index).map(|(kind, _)| *kind)
    }

    pub fn name(self) -> &'static str {
        KIND_TABLE[usize::from(self.code()) - 1].1
    }

    pub fn from_name(name: &str) -> Option<Self> {
        KIND_TABLE
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(kind, _)| *kind)
    }

    /// Comma separated list of kind names, in code order.
    pub fn valid_names() -> String {
        KIND_TABLE
            .iter()
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Number | FieldKind::Integer)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKind {
    type Err = crate::errors::SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::from_name(s).ok_or_else(|| crate::errors::SchemaError::InvalidKind(s.to_string()))
    }
}
