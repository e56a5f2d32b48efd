//! Declarative entity definitions.
//!
//! Entities are described in YAML, their field types parsed from a small
//! type-expression language, and every form schema derived once when the
//! registry is built.

pub mod definition;
pub mod registry;
pub mod type_expr;

pub use definition::{EntityDef, EntityFile, FieldDef};
pub use registry::{
    Entity, EntityRegistry, FieldLink, RegistryError, RegistryOptions, UnsupportedFieldPolicy,
};
pub use type_expr::{parse_type, EnumTable, TypeExprError};
