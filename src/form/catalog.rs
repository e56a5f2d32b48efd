use indexmap::IndexMap;

use super::types::{CatalogKey, CollectionKind, Primitive, SemanticType, WidgetKind};

/// Base widget for a bare semantic type. Templates are never mutated;
/// descriptors copy what they need.
#[derive(Debug, PartialEq, Eq)]
pub struct WidgetTemplate {
    pub kind: WidgetKind,
    pub attrs: &'static [(&'static str, &'static str)],
}

impl WidgetTemplate {
    pub fn attrs(&self) -> IndexMap<String, String> {
        self.attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

const fn template(
    kind: WidgetKind,
    attrs: &'static [(&'static str, &'static str)],
) -> WidgetTemplate {
    WidgetTemplate { kind, attrs }
}

static STRING: WidgetTemplate = template(WidgetKind::TextInput, &[]);
static TEXT: WidgetTemplate = template(WidgetKind::Textarea, &[("rows", "2")]);
static INTEGER: WidgetTemplate = template(WidgetKind::NumericInput, &[("step", "1")]);
static FLOAT: WidgetTemplate = template(WidgetKind::NumericInput, &[("step", "0.001")]);
static DECIMAL: WidgetTemplate = template(WidgetKind::NumericInput, &[("step", "0.01")]);
static BOOLEAN: WidgetTemplate = template(WidgetKind::Checkbox, &[]);
static DATETIME: WidgetTemplate = template(WidgetKind::TextInput, &[("type", "datetime-local")]);
static DATE: WidgetTemplate = template(WidgetKind::TextInput, &[("type", "date")]);
static TIME: WidgetTemplate = template(WidgetKind::TextInput, &[("type", "time")]);
static JSON: WidgetTemplate = template(WidgetKind::JsonBlob, &[]);
static INT_ENUM: WidgetTemplate = template(WidgetKind::Select, &[]);
static LIST: WidgetTemplate = template(WidgetKind::MultiSelect, &[("multiple", "true")]);
static SET: WidgetTemplate = template(WidgetKind::MultiSelect, &[("multiple", "true")]);

/// Static type -> widget lookup
pub struct WidgetCatalog;

impl WidgetCatalog {
    /// Template for `ty`, or `None` when the type has no direct entry and the
    /// deriver has to fall back.
    pub fn lookup(ty: &SemanticType) -> Option<&'static WidgetTemplate> {
        ty.catalog_key().map(Self::by_key)
    }

    pub fn by_key(key: CatalogKey) -> &'static WidgetTemplate {
        match key {
            CatalogKey::Primitive(Primitive::String) => &STRING,
            CatalogKey::Primitive(Primitive::Text) => &TEXT,
            CatalogKey::Primitive(Primitive::Integer) => &INTEGER,
            CatalogKey::Primitive(Primitive::Float) => &FLOAT,
            CatalogKey::Primitive(Primitive::Decimal) => &DECIMAL,
            CatalogKey::Primitive(Primitive::Boolean) => &BOOLEAN,
            CatalogKey::Primitive(Primitive::DateTime) => &DATETIME,
            CatalogKey::Primitive(Primitive::Date) => &DATE,
            CatalogKey::Primitive(Primitive::Time) => &TIME,
            CatalogKey::Primitive(Primitive::Json) => &JSON,
            CatalogKey::IntEnum => &INT_ENUM,
            CatalogKey::Collection(CollectionKind::List) => &LIST,
            CatalogKey::Collection(CollectionKind::Set) => &SET,
        }
    }

    pub fn int_enum() -> &'static WidgetTemplate {
        &INT_ENUM
    }
}
