//! # fieldpack
//!
//! Compact, self-describing field metadata for API payloads.
//!
//! A [TypeDescriptor](schema::TypeDescriptor) holds an ordered set of typed
//! fields (`string`, `integer`, `number`, `boolean`, `date`, `any`, `enum`,
//! scalar or array, required or optional). It renders to a packed wire form
//! of five bits per field, six fields per integer, reads that form back, and
//! casts incoming request parameters into canonical typed values.
//!
//! ## Example
//!
//! ```
//! use fieldpack::field::{FieldDescriptor, FieldMeta};
//! use fieldpack::constants::FieldKind;
//! use fieldpack::params::ApiParams;
//! use fieldpack::schema::TypeDescriptor;
//! use fieldpack::value::{Record, Value};
//!
//! let mut id = FieldMeta::new("id", FieldKind::Integer);
//! id.set_required(true);
//! let mut sex = FieldMeta::new("sex", FieldKind::Enum);
//! sex.set_values(["male", "female"]);
//!
//! let descriptor = TypeDescriptor::from_fields([
//!     FieldDescriptor::from_meta(id).unwrap(),
//!     FieldDescriptor::from_meta(sex).unwrap(),
//! ]);
//!
//! let packed = descriptor.render();
//! assert_eq!(packed.data, vec![0b00111_01010]);
//! let received = TypeDescriptor::from_packed(&packed).unwrap();
//!
//! let mut params = ApiParams {
//!     path: Some(Record::from([("id".to_string(), Value::from("42.9"))])),
//!     query: Some(Record::from([("sex".to_string(), Value::from("Female"))])),
//!     ..Default::default()
//! };
//! received.cast(&mut params).unwrap();
//!
//! assert_eq!(params.path.unwrap()["id"], Value::from(42.0));
//! assert_eq!(params.query.unwrap()["sex"], Value::from("female"));
//! ```

pub mod bits;
pub mod coerce;
pub mod constants;
pub mod errors;
pub mod field;
pub mod params;
pub mod schema;
pub mod value;
pub mod wire;

pub use constants::FieldKind;
pub use errors::{Error, LookupError, RestError, SchemaError, ValidationError};
pub use field::{FieldDescriptor, FieldMeta};
pub use params::{ApiParams, CastOptions};
pub use schema::TypeDescriptor;
pub use value::{Record, Value};
pub use wire::PackedSchema;
