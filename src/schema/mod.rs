//! Schema classes and typed value objects
//!
//! A [`SchemaClass`] is declared once with an ordered field table, a type
//! table and a [`ConversionPolicy`]. Instances coerce every supplied value
//! to its declared type:
//!
//! 1. a value that already satisfies the type is kept
//! 2. a decoder registered for the type converts it
//! 3. a constructible type builds it from the raw value
//! 4. a nested class is built from a mapping
//! 5. a converter function is called with it
//! 6. anything else is rejected
//!
//! Equality and hashing compare the human-readable form; JSON output runs
//! non-JSON values through the policy's encoders.

mod errors;
pub mod hierarchy;
mod instance;
pub mod iso;
mod loader;
mod policy;
mod registrar;
pub mod render;
mod slot;
mod types;
mod value;

pub use errors::{ConversionError, SchemaError, SchemaErrorCode, SchemaResult};
pub use instance::{Arguments, Instance};
pub use loader::{ClassDecl, EnumDecl, FieldEntry, PolicyDecl, RegistryDocument, SchemaRegistry};
pub use policy::{Codec, ConversionPolicy, ConversionPolicyBuilder, PolicyOption};
pub use registrar::{is_reserved_name, SchemaClass, SchemaClassBuilder};
pub use slot::{Slot, UNSET};
pub use types::{ConcreteType, ConvertFn, Converter, FieldDecl, TypeSpec};
pub use value::{EnumMember, EnumType, TypeKey, Value};
