//! Packed wire form of a type descriptor.
//!
//! Names, packed codes and the enum side-table travel together as one
//! [PackedSchema]; the side-table is keyed by field ordinal, so the three
//! parts only make sense when read back in the same order.
//!
//! JSON shape:
//!
//! ```text
//! { "n": ["str", "int1", "enum"], "d": [15433], "v": { "2": ["a", "b"] } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bits;

/// Enum values by field ordinal.
pub type EnumTable = BTreeMap<usize, Vec<String>>;

/// Compact description of an ordered set of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedSchema {
    /// Field names in packing order.
    #[serde(rename = "n")]
    pub names: Vec<String>,
    /// Packed 5-bit codes, six per integer, low-order bits first.
    #[serde(rename = "d")]
    pub data: Vec<u32>,
    /// Enum values of enum fields. Absent when no field is an enum.
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub enums: Option<EnumTable>,
}

impl PackedSchema {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Slots the packed data must hold for `fields` names.
    pub fn slots_for(fields: usize) -> usize {
        bits::slots_for(fields)
    }

    /// Enum values for the field at `ordinal`, if it has any.
    pub fn enum_values(&self, ordinal: usize) -> Option<&[String]> {
        self.enums
            .as_ref()
            .and_then(|enums| enums.get(&ordinal))
            .map(Vec::as_slice)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
