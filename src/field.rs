//! Field descriptors: one named, typed field of a schema.
//!
//! A [FieldDescriptor] knows how to pack itself into a 5-bit code and how to
//! turn an untyped wire value into the canonical value for its kind.

use serde::{Deserialize, Serialize};

use crate::{
    coerce,
    constants::{ARRAY_FLAG, CODE_MASK, FieldKind, KIND_MASK, REQUIRED_FLAG},
    errors::{SchemaError, ValidationError},
    value::{Record, Value},
};

/// Plain field metadata, as written by a schema author or read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub name: String,
    /// Kind name, e.g. `"integer"`.
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_array: bool,
    /// Allowed values; only for enums.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// Free text, never packed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Overrides the generated signature type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ts_type: Option<String>,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind: kind.name().to_string(),
            ..Default::default()
        }
    }

    pub fn set_required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    pub fn set_array(&mut self, is_array: bool) -> &mut Self {
        self.is_array = is_array;
        self
    }

    pub fn set_values<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Immutable description of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    is_array: bool,
    required: bool,
    values: Option<Vec<String>>,
    comment: Option<String>,
    ts_type: Option<String>,
}

impl TryFrom<FieldMeta> for FieldDescriptor {
    type Error = SchemaError;

    fn try_from(meta: FieldMeta) -> Result<Self, Self::Error> {
        FieldDescriptor::from_meta(meta)
    }
}

impl FieldDescriptor {
    /// Optional scalar field of a non-enum kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Result<Self, SchemaError> {
        Self::from_meta(FieldMeta::new(name, kind))
    }

    /// Builds a descriptor from explicit metadata.
    pub fn from_meta(meta: FieldMeta) -> Result<Self, SchemaError> {
        let kind = FieldKind::from_name(&meta.kind)
            .ok_or_else(|| SchemaError::InvalidKind(meta.kind.clone()))?;

        Self::checked(FieldDescriptor {
            name: meta.name,
            kind,
            is_array: meta.is_array,
            required: meta.required,
            values: meta.values,
            comment: meta.comment,
            ts_type: meta.ts_type,
        })
    }

    /// Builds a descriptor from a packed 5-bit code.
    ///
    /// `required`, when given, takes precedence over the required bit of `code`.
    pub fn from_code(
        name: impl Into<String>,
        code: u32,
        values: Option<Vec<String>>,
        required: Option<bool>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let kind = u8::try_from(code)
            .ok()
            .filter(|code| code & !CODE_MASK == 0)
            .and_then(|code| FieldKind::from_code(code & KIND_MASK))
            .ok_or_else(|| SchemaError::InvalidCode {
                name: name.clone(),
                code,
            })?;
        let bits = code as u8;

        Self::checked(FieldDescriptor {
            name,
            kind,
            is_array: bits & ARRAY_FLAG != 0,
            required: required.unwrap_or(bits & REQUIRED_FLAG != 0),
            values,
            comment: None,
            ts_type: None,
        })
    }

    fn checked(field: FieldDescriptor) -> Result<Self, SchemaError> {
        if field.name.trim().is_empty() {
            return Err(SchemaError::InvalidName(field.name));
        }

        match (field.kind, &field.values) {
            (FieldKind::Enum, Some(values)) if !values.is_empty() => Ok(field),
            (FieldKind::Enum, _) => Err(SchemaError::EnumWithoutValues(field.name)),
            (kind, Some(_)) => Err(SchemaError::UnexpectedValues {
                name: field.name,
                kind: kind.name().to_string(),
            }),
            (_, None) => Ok(field),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn values(&self) -> Option<&[String]> {
        self.values.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Copies the descriptor back into plain metadata.
    pub fn to_meta(&self) -> FieldMeta {
        FieldMeta {
            name: self.name.clone(),
            kind: self.kind.name().to_string(),
            required: self.required,
            is_array: self.is_array,
            values: self.values.clone(),
            comment: self.comment.clone(),
            ts_type: self.ts_type.clone(),
        }
    }

    /// Packed 5-bit code: kind in bits 0-2, required in bit 3, array in bit 4.
    pub fn to_code(&self) -> u8 {
        self.kind.code()
            | if self.required { REQUIRED_FLAG } else { 0 }
            | if self.is_array { ARRAY_FLAG } else { 0 }
    }

    /// Optional marker for generated signatures: `""` when required, `"?"` otherwise.
    pub fn optional(&self) -> &'static str {
        if self.required { "" } else { "?" }
    }

    /// Type used in generated signatures, e.g. `number`, `Date[]`.
    pub fn ts_type(&self) -> String {
        if let Some(ts_type) = &self.ts_type {
            return ts_type.clone();
        }

        let base = match self.kind {
            FieldKind::Date => "Date",
            FieldKind::Integer => "number",
            kind => kind.name(),
        };

        if self.is_array {
            format!("{base}[]")
        } else {
            base.to_string()
        }
    }

    /// Casts `container[name]` into the canonical value for this field.
    ///
    /// Array fields wrap a scalar into a one-item array and cast every item.
    /// The literal strings `"undefined"` and `"null"` read as their sentinels.
    /// An `Undefined` result removes the key; anything else replaces it.
    /// The container is left untouched when validation fails.
    pub fn cast(&self, container: &mut Record) -> Result<Value, ValidationError> {
        let raw = container.get(&self.name).cloned().unwrap_or_default();

        let value = if self.is_array {
            let items = match raw {
                Value::Array(items) => items,
                other => vec![other],
            };

            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| self.cast_item(item, &format!("{}[{}]", self.name, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)?
        } else {
            self.cast_item(raw, &self.name)?
        };

        tracing::trace!(field = %self.name, kind = %self.kind, "field cast");

        if value.is_undefined() {
            container.remove(&self.name);
        } else {
            container.insert(self.name.clone(), value.clone());
        }

        Ok(value)
    }

    /// Checks `value` against this field without converting it.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.check(value, &self.name).map(|_| ())
    }

    fn cast_item(&self, value: Value, label: &str) -> Result<Value, ValidationError> {
        let value = value.normalize_sentinel();
        let canonical = self.check(&value, label)?;
        if value.is_nullish() {
            return Ok(value);
        }

        let cast = match self.kind {
            FieldKind::Enum => canonical.map_or(value, |v| Value::String(v.to_string())),
            FieldKind::String => match value {
                Value::String(_) => value,
                other => Value::String(other.to_text()),
            },
            FieldKind::Number => Value::Number(value.to_number()),
            FieldKind::Integer => Value::Number(value.to_number().trunc()),
            FieldKind::Date => match value {
                Value::Date(_) => value,
                other => Value::Date(to_date(&other).ok_or_else(|| date_error(label, &other))?),
            },
            FieldKind::Boolean => Value::Bool(match &value {
                Value::String(s) if s == "false" => false,
                other => other.is_truthy(),
            }),
            FieldKind::Any => value,
        };

        Ok(cast)
    }

    /// Validation rules for one item. Returns the declared casing of a matched enum value.
    fn check(&self, value: &Value, label: &str) -> Result<Option<&str>, ValidationError> {
        if value.is_nullish() {
            if self.required {
                return Err(failure(format!("'{label}' is required!"), label, None));
            }
            return Ok(None);
        }

        match self.kind {
            FieldKind::Date => match value {
                Value::Date(_) => {}
                Value::String(_) | Value::Number(_) => {
                    if to_date(value).is_none() {
                        return Err(date_error(label, value));
                    }
                }
                other => {
                    return Err(failure(
                        format!("'{label}' cannot be cast to a date"),
                        label,
                        Some(other),
                    ));
                }
            },
            kind if kind.is_numeric() => {
                if !value.to_number().is_finite() {
                    return Err(failure(
                        format!(
                            "'{label}': {} cannot be cast to a {}",
                            value.describe(),
                            self.kind
                        ),
                        label,
                        Some(value),
                    ));
                }
            }
            FieldKind::Enum => {
                let text = value.to_text();
                let values = self.values.as_deref().unwrap_or_default();
                return match values.iter().find(|v| coerce::base_eq(v, &text)) {
                    Some(found) => Ok(Some(found.as_str())),
                    None => Err(failure(
                        format!(
                            "'{label}': {} must be one of [{}]",
                            value.describe(),
                            values.join(",")
                        ),
                        label,
                        Some(value),
                    )),
                };
            }
            _ => {}
        }

        Ok(None)
    }
}

fn to_date(value: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
    match value {
        Value::Date(d) => Some(*d),
        Value::String(s) => coerce::parse_date(s),
        Value::Number(n) => coerce::date_from_millis(*n),
        _ => None,
    }
}

fn date_error(label: &str, value: &Value) -> ValidationError {
    failure(
        format!("'{label}': {} cannot be cast to a date", value.describe()),
        label,
        Some(value),
    )
}

fn failure(message: String, label: &str, value: Option<&Value>) -> ValidationError {
    tracing::debug!(field = label, %message, "validation failed");

    let err = ValidationError::new(message).with_field(label);
    match value.and_then(Value::to_json) {
        Some(json) => err.with_value(json),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn meta(name: &str, kind: &str, required: bool) -> FieldMeta {
        FieldMeta {
            name: name.to_string(),
            kind: kind.to_string(),
            required,
            ..Default::default()
        }
    }

    fn field(name: &str, kind: &str, required: bool) -> FieldDescriptor {
        FieldDescriptor::from_meta(meta(name, kind, required)).unwrap()
    }

    fn date(iso: &str) -> Value {
        Value::Date(DateTime::parse_from_rfc3339(iso).unwrap().with_timezone(&Utc))
    }

    fn cast_one(fd: &FieldDescriptor, raw: Value) -> Result<Value, ValidationError> {
        let mut record = Record::from([(fd.name().to_string(), raw)]);
        fd.cast(&mut record)?;
        Ok(record.get(fd.name()).cloned().unwrap_or_default())
    }

    #[test]
    fn test_from_code_required_string() {
        let fd = FieldDescriptor::from_code("name", 0b01001, None, None).unwrap();
        assert_eq!(fd.name(), "name");
        assert!(fd.required());
        assert!(!fd.is_array());
        assert_eq!(fd.kind(), FieldKind::String);
    }

    #[test]
    fn test_from_code_optional_integer() {
        let fd = FieldDescriptor::from_code("name", 0b00010, None, None).unwrap();
        assert!(!fd.required());
        assert_eq!(fd.kind(), FieldKind::Integer);
        assert_eq!(fd.ts_type(), "number");
    }

    #[test]
    fn test_from_code_required_override() {
        let fd = FieldDescriptor::from_code("name", 0b01001, None, Some(false)).unwrap();
        assert!(!fd.required());
        let fd = FieldDescriptor::from_code("name", 0b00001, None, Some(true)).unwrap();
        assert!(fd.required());
    }

    #[test]
    fn test_from_code_rejects_reserved_and_wide_codes() {
        assert!(matches!(
            FieldDescriptor::from_code("f", 0b01000, None, None),
            Err(SchemaError::InvalidCode { code: 0b01000, .. })
        ));
        assert!(matches!(
            FieldDescriptor::from_code("f", 0b100001, None, None),
            Err(SchemaError::InvalidCode { .. })
        ));
    }

    #[test]
    fn test_from_meta_keeps_all_attributes() {
        let mut m = FieldMeta::new("name", FieldKind::Date);
        m.set_required(true).set_array(true).set_comment("xpto");
        let fd = FieldDescriptor::from_meta(m.clone()).unwrap();

        assert_eq!(fd.comment(), Some("xpto"));
        assert!(fd.is_array());
        assert!(fd.required());
        assert_eq!(fd.to_meta(), m);
    }

    #[test]
    fn test_enum_without_values() {
        let mut m = meta("xpto", "enum", true);
        m.is_array = true;
        let err = FieldDescriptor::from_meta(m).unwrap_err();
        assert_eq!(err.to_string(), "Cannot define field 'xpto' as enum without values");

        let mut m = meta("xpto", "enum", true);
        m.values = Some(vec![]);
        assert!(FieldDescriptor::from_meta(m).is_err());
    }

    #[test]
    fn test_values_on_non_enum() {
        let mut m = meta("xpto", "string", true);
        m.set_values(["a"]);
        assert!(matches!(
            FieldDescriptor::from_meta(m),
            Err(SchemaError::UnexpectedValues { .. })
        ));
    }

    #[test]
    fn test_invalid_name() {
        assert_eq!(
            FieldDescriptor::from_code(" ", 1, None, None).unwrap_err(),
            SchemaError::InvalidName(" ".to_string())
        );
    }

    #[test]
    fn test_unknown_kind() {
        let err = FieldDescriptor::from_meta(meta("field1", "PitoStatus", true)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type 'PitoStatus'. Valid types: string,integer,number,boolean,date,any,enum"
        );
    }

    #[test]
    fn test_to_code_and_optional() {
        let fd = field("name", "integer", false);
        assert_eq!(fd.to_code(), FieldKind::Integer.code());
        assert_eq!(fd.optional(), "?");
        assert_eq!(field("name", "integer", true).optional(), "");
    }

    #[test]
    fn test_ts_type() {
        let mut m = meta("name", "date", true);
        m.is_array = true;
        assert_eq!(FieldDescriptor::from_meta(m).unwrap().ts_type(), "Date[]");

        let mut m = meta("name", "any", true);
        m.ts_type = Some("Record<string, unknown>".into());
        assert_eq!(
            FieldDescriptor::from_meta(m).unwrap().ts_type(),
            "Record<string, unknown>"
        );
    }

    #[test]
    fn test_required_string_validation() {
        let fd = field("name", "string", true);
        assert!(fd.validate(&Value::from(1.0)).is_ok());
        assert!(fd.validate(&date("2019-01-01T00:00:00Z")).is_ok());
        assert!(fd.validate(&Value::from(false)).is_ok());

        let err = fd.validate(&Value::Null).unwrap_err();
        assert_eq!(err.message, "'name' is required!");
        assert_eq!(err.field.as_deref(), Some("name"));
        assert!(fd.validate(&Value::Undefined).is_err());
    }

    #[test]
    fn test_required_date_validation() {
        let fd = field("birthdate", "date", true);
        assert!(fd.validate(&Value::from(1.0)).is_ok());
        assert!(fd.validate(&Value::from("2019-01-01")).is_ok());

        let err = fd.validate(&Value::from("abcde")).unwrap_err();
        assert_eq!(err.message, r#"'birthdate': "abcde" cannot be cast to a date"#);

        let err = fd.validate(&Value::from(false)).unwrap_err();
        assert_eq!(err.message, "'birthdate' cannot be cast to a date");

        assert!(fd.validate(&Value::Null).unwrap_err().message.ends_with("is required!"));
    }

    #[test]
    fn test_cast_to_string() {
        let fd = field("address", "string", true);
        let cases = [
            (Value::from("abcd"), "abcd"),
            (Value::from(12345.0), "12345"),
            (date("2019-01-01T00:00:00Z"), "2019-01-01T00:00:00.000Z"),
            (Value::from(true), "true"),
            (Value::from(vec![12.0, 345.0]), "12,345"),
            (Value::Object(Record::new()), "[object Object]"),
        ];

        for (raw, expected) in cases {
            assert_eq!(cast_one(&fd, raw).unwrap(), Value::from(expected));
        }
    }

    #[test]
    fn test_cast_to_enum() {
        let mut m = meta("sex", "enum", true);
        m.set_values(["male", "female"]);
        let fd = FieldDescriptor::from_meta(m).unwrap();

        assert_eq!(cast_one(&fd, Value::from("male")).unwrap(), Value::from("male"));
        assert_eq!(cast_one(&fd, Value::from("Male")).unwrap(), Value::from("male"));

        let err = cast_one(&fd, Value::from("Few")).unwrap_err();
        assert_eq!(err.message, r#"'sex': "Few" must be one of [male,female]"#);
        assert_eq!(err.value, Some(serde_json::json!("Few")));
    }

    #[test]
    fn test_cast_to_number() {
        let fd = field("weight", "number", true);
        assert_eq!(cast_one(&fd, Value::from("12345.67")).unwrap(), Value::from(12345.67));
        assert_eq!(
            cast_one(&fd, date("2019-01-01T00:00:00Z")).unwrap(),
            Value::from(1546300800000.0)
        );
        assert_eq!(cast_one(&fd, Value::from(true)).unwrap(), Value::from(1.0));

        for bad in [
            Value::from("abc"),
            Value::from(vec![12.0, 345.0]),
            Value::Object(Record::new()),
        ] {
            let err = cast_one(&fd, bad).unwrap_err();
            assert!(err.message.ends_with("cannot be cast to a number"), "{}", err.message);
        }
    }

    #[test]
    fn test_cast_to_integer() {
        let fd = field("age", "integer", true);
        assert_eq!(cast_one(&fd, Value::from(12345.67)).unwrap(), Value::from(12345.0));
        assert_eq!(cast_one(&fd, Value::from("12345.67")).unwrap(), Value::from(12345.0));
        assert_eq!(cast_one(&fd, Value::from(-3.9)).unwrap(), Value::from(-3.0));

        let err = cast_one(&fd, Value::from("abc")).unwrap_err();
        assert_eq!(err.message, r#"'age': "abc" cannot be cast to a integer"#);
    }

    #[test]
    fn test_cast_to_date() {
        let fd = field("birthdate", "date", false);
        let expected = date("1970-01-01T00:00:12.345Z");

        assert_eq!(cast_one(&fd, expected.clone()).unwrap(), expected);
        assert_eq!(cast_one(&fd, Value::from(12345.0)).unwrap(), expected);
        assert_eq!(
            cast_one(&fd, Value::from("2019-01-01")).unwrap(),
            date("2019-01-01T00:00:00Z")
        );
        assert_eq!(cast_one(&fd, Value::from("null")).unwrap(), Value::Null);

        for bad in [
            Value::from(true),
            Value::from(vec![12.0, 345.0]),
            Value::Object(Record::new()),
            Value::from("12/ab/2019"),
        ] {
            let err = cast_one(&fd, bad).unwrap_err();
            assert!(err.message.contains("cannot be cast to a date"), "{}", err.message);
        }
    }

    #[test]
    fn test_cast_to_date_at_range_edge() {
        let fd = field("d", "date", false);

        for millis in [coerce::MAX_DATE_MILLIS, -coerce::MAX_DATE_MILLIS] {
            assert!(matches!(cast_one(&fd, Value::from(millis)), Ok(Value::Date(_))));
        }

        let err = cast_one(&fd, Value::from(8.64e15)).unwrap_err();
        assert_eq!(err.message, "'d': 8640000000000000 cannot be cast to a date");
    }

    #[test]
    fn test_cast_undefined_removes_key() {
        let fd = field("birthdate", "date", false);
        let mut record = Record::from([("birthdate".to_string(), Value::from("undefined"))]);

        assert_eq!(fd.cast(&mut record).unwrap(), Value::Undefined);
        assert!(!record.contains_key("birthdate"));
    }

    #[test]
    fn test_cast_to_boolean() {
        let fd = field("isStudent", "boolean", true);
        let cases = [
            (Value::from(12345.67), true),
            (Value::from("abc"), true),
            (Value::from("false"), false),
            (Value::from("true"), true),
            (Value::from(0.0), false),
            (Value::from(vec![12.0, 345.0]), true),
        ];

        for (raw, expected) in cases {
            assert_eq!(cast_one(&fd, raw).unwrap(), Value::from(expected));
        }
    }

    #[test]
    fn test_cast_to_any() {
        let fd = field("tag", "any", true);
        for raw in [
            Value::from(12345.67),
            Value::from("abc"),
            Value::from(vec![12.0, 345.0]),
            Value::Object(Record::from([("a".to_string(), Value::from(1.0))])),
        ] {
            assert_eq!(cast_one(&fd, raw.clone()).unwrap(), raw);
        }
    }

    #[test]
    fn test_cast_to_date_array() {
        let mut m = meta("datearray", "date", true);
        m.is_array = true;
        let fd = FieldDescriptor::from_meta(m).unwrap();

        assert_eq!(
            cast_one(&fd, Value::from(12345.0)).unwrap(),
            Value::Array(vec![date("1970-01-01T00:00:12.345Z")])
        );
        assert_eq!(
            cast_one(&fd, Value::from(vec![12.0, 345.0])).unwrap(),
            Value::Array(vec![
                date("1970-01-01T00:00:00.012Z"),
                date("1970-01-01T00:00:00.345Z")
            ])
        );
        assert_eq!(
            cast_one(
                &fd,
                Value::Array(vec![
                    Value::from("2019-01-01"),
                    Value::from("2015-12-31"),
                    Value::from(12345.0)
                ])
            )
            .unwrap(),
            Value::Array(vec![
                date("2019-01-01T00:00:00Z"),
                date("2015-12-31T00:00:00Z"),
                date("1970-01-01T00:00:12.345Z")
            ])
        );

        let err = cast_one(&fd, Value::Array(vec![Value::from(1.0), Value::from(true)])).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("datearray[1]"));
    }

    #[test]
    fn test_failed_cast_leaves_container() {
        let fd = field("weight", "number", true);
        let mut record = Record::from([("weight".to_string(), Value::from("abc"))]);

        assert!(fd.cast(&mut record).is_err());
        assert_eq!(record.get("weight"), Some(&Value::from("abc")));
    }

    #[test]
    fn test_cast_is_idempotent_on_canonical_values() {
        let fd = field("weight", "number", true);
        let mut record = Record::from([("weight".to_string(), Value::from(12.5))]);

        fd.cast(&mut record).unwrap();
        fd.cast(&mut record).unwrap();
        assert_eq!(record.get("weight"), Some(&Value::from(12.5)));
    }
}
