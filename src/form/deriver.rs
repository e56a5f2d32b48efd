use convert_case::{Case, Casing};
use indexmap::IndexMap;

use super::catalog::{WidgetCatalog, WidgetTemplate};
use super::error::SchemaError;
use super::types::{
    CatalogKey, CollectionKind, FieldDescriptor, FieldMetadata, FormSchema, OptionsSource, Relation,
    SemanticType,
};

/// Integer fields ending in this suffix are references by convention
pub const REFERENCE_SUFFIX: &str = "_id";

/// Derive descriptors for every field of an entity, preserving input order.
///
/// Fails on the first field that cannot be represented; no partial schema is
/// returned. Callers that prefer to skip such fields can drive
/// [`derive_field`] themselves.
pub fn derive<'a, I>(entity: &str, fields: I) -> Result<FormSchema, SchemaError>
where
    I: IntoIterator<Item = (&'a str, &'a FieldMetadata)>,
{
    let mut out = IndexMap::new();
    for (name, meta) in fields {
        let descriptor = derive_field(name, meta)?;
        out.insert(name.to_string(), descriptor);
    }
    Ok(FormSchema {
        entity: entity.to_string(),
        fields: out,
    })
}

/// Derive the descriptor of a single field.
///
/// Rules, first match wins:
/// 1. `<name>_id` with an integer (or optional integer) type is a reference
/// 2. direct catalog entry for the declared type
/// 3. optional wrapper: unwrap, mark not required, retry the catalog
/// 4. concrete enum: generic enum widget with the enum's members as options
/// 5. parameterized collection: bare collection widget (lists defer options)
/// 6. relations: select / multi-select against the target entity
pub fn derive_field(name: &str, meta: &FieldMetadata) -> Result<FieldDescriptor, SchemaError> {
    if let Some(descriptor) = reference_by_convention(name, meta) {
        return Ok(descriptor);
    }

    let mut ty = &meta.ty;
    let mut required = true;

    if let Some(template) = WidgetCatalog::lookup(ty) {
        return Ok(from_template(template, required, meta));
    }

    if let SemanticType::Union(_) = ty {
        let members = ty.non_null_members();
        if members.len() != 1 {
            return Err(SchemaError::AmbiguousOptionalType {
                field: name.to_string(),
                non_null: members.len(),
            });
        }
        required = !ty.is_optional();
        ty = members[0];

        if let Some(template) = WidgetCatalog::lookup(ty) {
            return Ok(from_template(template, required, meta));
        }
    }

    match ty {
        SemanticType::Enum(enum_type) => {
            let mut descriptor = from_template(WidgetCatalog::int_enum(), required, meta);
            descriptor.options = enum_type.options();
            descriptor.options_source = OptionsSource::Enum;
            Ok(descriptor)
        }
        SemanticType::Collection { kind, item: Some(_) } => {
            let bare = SemanticType::Collection { kind: *kind, item: None };
            let template = WidgetCatalog::lookup(&bare).ok_or_else(|| unsupported(name, meta))?;
            let mut descriptor = from_template(template, required, meta);
            if *kind == CollectionKind::List {
                descriptor.options_source = OptionsSource::Deferred;
            }
            Ok(descriptor)
        }
        SemanticType::Relation(relation) => {
            let template = match relation {
                Relation::Forward { .. } => WidgetCatalog::int_enum(),
                Relation::Reverse { .. } => {
                    WidgetCatalog::by_key(CatalogKey::Collection(CollectionKind::List))
                }
            };
            let mut descriptor = from_template(template, required, meta);
            descriptor.reference_entity = Some(relation.target().to_string());
            descriptor.options_source = OptionsSource::Deferred;
            Ok(descriptor)
        }
        _ => Err(unsupported(name, meta)),
    }
}

/// `author_id` -> `Author`, `blog_post_id` -> `BlogPost`
pub fn reference_entity_name(field: &str) -> Option<String> {
    field
        .strip_suffix(REFERENCE_SUFFIX)
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| prefix.to_case(Case::Pascal))
}

fn reference_by_convention(name: &str, meta: &FieldMetadata) -> Option<FieldDescriptor> {
    let target = reference_entity_name(name)?;

    let required = match &meta.ty {
        ty if ty.is_integer() => true,
        ty if ty.is_optional()
            && matches!(ty.non_null_members().as_slice(), [inner] if inner.is_integer()) =>
        {
            false
        }
        _ => return None,
    };

    let mut descriptor = from_template(WidgetCatalog::int_enum(), required, meta);
    descriptor.reference_entity = Some(target);
    descriptor.options_source = OptionsSource::Deferred;
    Some(descriptor)
}

fn from_template(template: &WidgetTemplate, required: bool, meta: &FieldMetadata) -> FieldDescriptor {
    FieldDescriptor {
        widget: template.kind,
        required,
        display_name: meta.title.clone(),
        options: IndexMap::new(),
        options_source: OptionsSource::None,
        reference_entity: None,
        extra_attrs: template.attrs(),
        validators: meta.validators.clone(),
    }
}

fn unsupported(name: &str, meta: &FieldMetadata) -> SchemaError {
    SchemaError::UnsupportedFieldType {
        field: name.to_string(),
        ty: meta.ty.to_string(),
    }
}
