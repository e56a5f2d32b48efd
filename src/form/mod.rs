//! Form schema derivation.
//!
//! Turns an entity's field metadata into renderer-agnostic widget
//! descriptors. The catalog is a static table; the deriver is a pure function
//! over its inputs. Reference options are filled in a separate, explicit
//! step ([`FormSchema::materialize`]).

pub mod catalog;
pub mod deriver;
pub mod error;
pub mod options;
pub mod types;

pub use catalog::{WidgetCatalog, WidgetTemplate};
pub use deriver::{derive, derive_field, reference_entity_name, REFERENCE_SUFFIX};
pub use error::SchemaError;
pub use options::OptionsProvider;
pub use types::{
    CatalogKey, CollectionKind, EnumType, FieldDescriptor, FieldMetadata, FormSchema,
    OptionsSource, Primitive, Relation, SemanticType, Validator, WidgetKind,
};
