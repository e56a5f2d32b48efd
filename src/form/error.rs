use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unsupported field type for '{field}': {ty}")]
    UnsupportedFieldType { field: String, ty: String },

    #[error("Ambiguous optional type for '{field}': expected exactly one non-null member, found {non_null}")]
    AmbiguousOptionalType { field: String, non_null: usize },
}

impl SchemaError {
    pub fn field(&self) -> &str {
        match self {
            SchemaError::UnsupportedFieldType { field, .. }
            | SchemaError::AmbiguousOptionalType { field, .. } => field,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::UnsupportedFieldType { .. } => "unsupported-field-type",
            SchemaError::AmbiguousOptionalType { .. } => "ambiguous-optional-type",
        }
    }
}
