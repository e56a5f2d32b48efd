use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scalar kinds with a direct widget mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    String,
    Text,
    Integer,
    Float,
    Decimal,
    Boolean,
    DateTime,
    Date,
    Time,
    Json,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::String => "str",
            Primitive::Text => "text",
            Primitive::Integer => "int",
            Primitive::Float => "float",
            Primitive::Decimal => "decimal",
            Primitive::Boolean => "bool",
            Primitive::DateTime => "datetime",
            Primitive::Date => "date",
            Primitive::Time => "time",
            Primitive::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    List,
    Set,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::List => "list",
            CollectionKind::Set => "set",
        }
    }
}

/// An integer-backed bounded enum. Members keep their declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<(String, i64)>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn member(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.push((name.into(), value));
        self
    }

    /// value -> member name, in declaration order
    pub fn options(&self) -> IndexMap<i64, String> {
        self.members
            .iter()
            .map(|(name, value)| (*value, name.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// The field's column holds the id of a `target` row
    Forward { target: String },
    /// Rows of `target` whose `column` references this entity
    Reverse { target: String, column: String },
}

impl Relation {
    pub fn target(&self) -> &str {
        match self {
            Relation::Forward { target } | Relation::Reverse { target, .. } => target,
        }
    }
}

/// Closed set of declared field types understood by the deriver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticType {
    Null,
    Primitive(Primitive),
    /// The generic enum base, as opposed to a concrete enum subtype
    IntEnum,
    Enum(Arc<EnumType>),
    Collection {
        kind: CollectionKind,
        item: Option<Box<SemanticType>>,
    },
    Union(Vec<SemanticType>),
    Relation(Relation),
    /// Anything the model layer declared that has no mapping
    Opaque(String),
}

/// Keys of the widget catalog. Only bare types have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKey {
    Primitive(Primitive),
    IntEnum,
    Collection(CollectionKind),
}

impl SemanticType {
    pub fn optional(inner: SemanticType) -> Self {
        match inner {
            SemanticType::Union(mut members) => {
                if !members.contains(&SemanticType::Null) {
                    members.push(SemanticType::Null);
                }
                SemanticType::Union(members)
            }
            other => SemanticType::Union(vec![other, SemanticType::Null]),
        }
    }

    pub fn list_of(item: SemanticType) -> Self {
        SemanticType::Collection {
            kind: CollectionKind::List,
            item: Some(Box::new(item)),
        }
    }

    pub fn catalog_key(&self) -> Option<CatalogKey> {
        match self {
            SemanticType::Primitive(p) => Some(CatalogKey::Primitive(*p)),
            SemanticType::IntEnum => Some(CatalogKey::IntEnum),
            SemanticType::Collection { kind, item: None } => Some(CatalogKey::Collection(*kind)),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, SemanticType::Primitive(Primitive::Integer))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, SemanticType::Union(members) if members.contains(&SemanticType::Null))
    }

    /// Members of a union other than `Null`
    pub fn non_null_members(&self) -> Vec<&SemanticType> {
        match self {
            SemanticType::Union(members) => members
                .iter()
                .filter(|m| **m != SemanticType::Null)
                .collect(),
            SemanticType::Null => Vec::new(),
            other => vec![other],
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Null => write!(f, "none"),
            SemanticType::Primitive(p) => write!(f, "{}", p.as_str()),
            SemanticType::IntEnum => write!(f, "intenum"),
            SemanticType::Enum(e) => write!(f, "{}", e.name),
            SemanticType::Collection { kind, item: None } => write!(f, "{}", kind.as_str()),
            SemanticType::Collection { kind, item: Some(item) } => {
                write!(f, "{}[{}]", kind.as_str(), item)
            }
            SemanticType::Union(members) => {
                let parts: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "{}", parts.join(" | "))
            }
            SemanticType::Relation(Relation::Forward { target }) => write!(f, "ref({})", target),
            SemanticType::Relation(Relation::Reverse { target, column }) => {
                write!(f, "rev({}.{})", target, column)
            }
            SemanticType::Opaque(name) => write!(f, "{}", name),
        }
    }
}

/// Validation hints passed through to the rendered input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    MaxLength(u32),
    MinLength(u32),
    Ge(f64),
    Le(f64),
    Pattern(String),
}

/// What the model layer knows about one field. Read-only input to the deriver.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    pub ty: SemanticType,
    pub title: String,
    pub validators: Vec<Validator>,
}

impl FieldMetadata {
    pub fn new(ty: SemanticType, title: impl Into<String>) -> Self {
        Self {
            ty,
            title: title.into(),
            validators: Vec::new(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.ty = SemanticType::optional(self.ty);
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    TextInput,
    NumericInput,
    Checkbox,
    Select,
    Textarea,
    MultiSelect,
    JsonBlob,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::TextInput => "text-input",
            WidgetKind::NumericInput => "numeric-input",
            WidgetKind::Checkbox => "checkbox",
            WidgetKind::Select => "select",
            WidgetKind::Textarea => "textarea",
            WidgetKind::MultiSelect => "multi-select",
            WidgetKind::JsonBlob => "json-blob",
        }
    }
}

/// Where a descriptor's `options` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionsSource {
    None,
    /// Filled from enum members at derivation time
    Enum,
    /// Left empty for the caller to populate
    Deferred,
    /// Populated by `FormSchema::materialize`
    Loaded,
}

/// Renderer-agnostic description of one entity field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub widget: WidgetKind,
    pub required: bool,
    pub display_name: String,
    pub options: IndexMap<i64, String>,
    pub options_source: OptionsSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_entity: Option<String>,
    pub extra_attrs: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl FieldDescriptor {
    pub fn is_multiple(&self) -> bool {
        self.extra_attrs.get("multiple").map(|v| v == "true").unwrap_or(false)
    }

    pub fn is_deferred(&self) -> bool {
        self.options_source == OptionsSource::Deferred
    }
}

/// Derived descriptors of one entity, in field declaration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSchema {
    pub entity: String,
    pub fields: IndexMap<String, FieldDescriptor>,
}

impl FormSchema {
    pub fn get(&self, field: &str) -> Option<&FieldDescriptor> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDescriptor)> {
        self.fields.iter()
    }

    /// Field name at a column position, as used by the datatable
    pub fn field_at(&self, index: usize) -> Option<(&String, &FieldDescriptor)> {
        self.fields.get_index(index)
    }
}
