//! Type descriptor: the ordered set of fields of one schema.
//!
//! Use [TypeDescriptor::set] or [TypeDescriptor::from_fields] to build one,
//! [TypeDescriptor::render] to pack it for the wire, [TypeDescriptor::parse]
//! to read it back and [TypeDescriptor::cast] to cast request parameters.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, OnceLock},
};

use crate::{
    bits::{BitReader, BitWriter, slots_for},
    errors::{Error, LookupError, ReadError, SchemaError, ValidationError},
    field::FieldDescriptor,
    params::{ApiParams, CastOptions, Section, UnknownKeys},
    wire::{EnumTable, PackedSchema},
};

#[derive(Debug, Clone)]
struct Slot {
    index: usize,
    field: Arc<FieldDescriptor>,
}

/// Fields keyed by name, iterated in insertion order.
///
/// Setting a field whose name already exists replaces it and moves it to the
/// end of the order. The ordered views are cached until the next mutation.
#[derive(Debug, Clone, Default)]
pub struct TypeDescriptor {
    fields: HashMap<String, Slot>,
    next_index: usize,
    all: OnceLock<Vec<Arc<FieldDescriptor>>>,
    required: OnceLock<Vec<Arc<FieldDescriptor>>>,
}

impl TypeDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor holding `fields`, in order. Later duplicates replace earlier ones.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<FieldDescriptor>>,
    {
        let mut descriptor = Self::new();
        for field in fields {
            descriptor.set(field);
        }

        descriptor
    }

    /// Descriptor read from its packed wire form.
    pub fn from_packed(packed: &PackedSchema) -> Result<Self, SchemaError> {
        let mut descriptor = Self::new();
        descriptor.parse(packed)?;
        Ok(descriptor)
    }

    fn invalidate(&mut self) {
        self.all = OnceLock::new();
        self.required = OnceLock::new();
    }

    /// Inserts `field`, replacing any field with the same name.
    pub fn set(&mut self, field: impl Into<Arc<FieldDescriptor>>) {
        let field = field.into();
        let index = self.next_index;
        self.next_index += 1;

        self.fields
            .insert(field.name().to_string(), Slot { index, field });
        self.invalidate();
    }

    pub fn get(&self, name: &str) -> Result<&FieldDescriptor, LookupError> {
        self.fields
            .get(name)
            .map(|slot| slot.field.as_ref())
            .ok_or_else(|| LookupError::new(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.next_index = 0;
        self.invalidate();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All fields in insertion order.
    pub fn as_array(&self) -> &[Arc<FieldDescriptor>] {
        self.all.get_or_init(|| {
            let mut slots: Vec<&Slot> = self.fields.values().collect();
            slots.sort_by_key(|slot| slot.index);
            slots.into_iter().map(|slot| Arc::clone(&slot.field)).collect()
        })
    }

    /// Required fields in insertion order.
    pub fn required_fields(&self) -> &[Arc<FieldDescriptor>] {
        self.required.get_or_init(|| {
            self.as_array()
                .iter()
                .filter(|field| field.required())
                .cloned()
                .collect()
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.as_array().iter().map(|field| &**field)
    }

    /// Packs the fields into their wire form.
    pub fn render(&self) -> PackedSchema {
        let fields = self.as_array();
        let mut names = Vec::with_capacity(fields.len());
        let mut writer = BitWriter::with_capacity(fields.len());
        let mut enums = EnumTable::new();

        for (ordinal, field) in fields.iter().enumerate() {
            names.push(field.name().to_string());
            writer.write_code(field.to_code());
            if let Some(values) = field.values() {
                enums.insert(ordinal, values.to_vec());
            }
        }

        let packed = PackedSchema {
            names,
            data: writer.finish(),
            enums: (!enums.is_empty()).then_some(enums),
        };

        tracing::debug!(
            fields = packed.names.len(),
            slots = packed.data.len(),
            "rendered type descriptor"
        );

        packed
    }

    /// Replaces the fields with those read from `packed`.
    ///
    /// Every field is decoded before anything is replaced, so a failing parse
    /// leaves the descriptor as it was.
    pub fn parse(&mut self, packed: &PackedSchema) -> Result<(), SchemaError> {
        let expected = slots_for(packed.names.len());
        if packed.data.len() > expected {
            return Err(ReadError::TrailingSlots {
                expected,
                found: packed.data.len(),
            }
            .into());
        }

        if let Some(ordinal) = packed
            .enums
            .iter()
            .flat_map(|enums| enums.keys())
            .find(|ordinal| **ordinal >= packed.names.len())
        {
            return Err(SchemaError::EnumOrdinalOutOfRange {
                ordinal: *ordinal,
                fields: packed.names.len(),
            });
        }

        let mut reader = BitReader::new(&packed.data);
        let mut fields = Vec::with_capacity(packed.names.len());
        for (ordinal, name) in packed.names.iter().enumerate() {
            let code = reader.read_code()?;
            let values = packed.enum_values(ordinal).map(<[String]>::to_vec);
            fields.push(FieldDescriptor::from_code(
                name.as_str(),
                u32::from(code),
                values,
                None,
            )?);
        }

        self.clear();
        for field in fields {
            self.set(field);
        }

        tracing::debug!(
            fields = self.len(),
            slots = packed.data.len(),
            "parsed type descriptor"
        );

        Ok(())
    }

    /// Casts every section of `params` in place with the default [CastOptions].
    pub fn cast(&self, params: &mut ApiParams) -> Result<(), Error> {
        self.cast_with(params, &CastOptions::default())
    }

    /// Casts `path`, `query`, `headers` and `body`, in that order.
    ///
    /// Each key is cast by the field of the same name. A key naming no field
    /// fails with a [LookupError] unless its section ignores unknown keys.
    /// Required fields that appear in no section are reported together in
    /// one [ValidationError].
    pub fn cast_with(&self, params: &mut ApiParams, options: &CastOptions) -> Result<(), Error> {
        let mut seen: HashSet<String> = HashSet::new();

        for section in Section::ALL {
            let Some(record) = params.section_mut(section) else {
                continue;
            };

            let keys: Vec<String> = record.keys().cloned().collect();
            for key in keys {
                match self.fields.get(&key) {
                    Some(slot) => {
                        slot.field.cast(record)?;
                        seen.insert(key);
                    }
                    None if options.policy(section) == UnknownKeys::Ignore => {
                        tracing::trace!(%section, key = %key, "ignoring key outside schema");
                    }
                    None => return Err(LookupError::new(key).into()),
                }
            }
        }

        let missing: Vec<&str> = self
            .required_fields()
            .iter()
            .map(|field| field.name())
            .filter(|name| !seen.contains(*name))
            .collect();

        if !missing.is_empty() {
            tracing::debug!(?missing, "required fields not found");
            let list = missing.join(",");
            return Err(ValidationError::new(format!(
                "Fields [{list}] are required, but not found"
            ))
            .with_field(list)
            .into());
        }

        Ok(())
    }
}

impl<F: Into<Arc<FieldDescriptor>>> FromIterator<F> for TypeDescriptor {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        TypeDescriptor::from_fields(iter)
    }
}

impl TryFrom<&PackedSchema> for TypeDescriptor {
    type Error = SchemaError;

    fn try_from(packed: &PackedSchema) -> Result<Self, Self::Error> {
        TypeDescriptor::from_packed(packed)
    }
}
