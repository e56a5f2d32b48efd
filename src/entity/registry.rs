use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::definition::{EntityDef, EntityFile};
use super::type_expr::{EnumTable, TypeExprError};
use crate::database::manager::is_valid_identifier;
use crate::form::{
    derive_field, EnumType, FieldMetadata, FormSchema, Relation, SchemaError, SemanticType,
};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid entity file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid type for {entity}.{field}: {source}")]
    TypeExpr {
        entity: String,
        field: String,
        #[source]
        source: TypeExprError,
    },

    #[error("Cannot derive form for {entity}: {source}")]
    Schema {
        entity: String,
        #[source]
        source: SchemaError,
    },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Entity {0} is declared more than once")]
    DuplicateEntity(String),

    #[error("Field {entity}.{field} is declared more than once")]
    DuplicateField { entity: String, field: String },

    #[error("Entity {0} has no integer 'id' field")]
    MissingId(String),

    #[error("Entity {entity} has no field '{field}'")]
    UnknownField { entity: String, field: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// What to do with a field the deriver cannot represent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedFieldPolicy {
    #[default]
    Abort,
    Skip,
}

impl FromStr for UnsupportedFieldPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown unsupported-field policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    pub policy: UnsupportedFieldPolicy,
    pub excluded: Vec<String>,
}

/// A registered entity with its derived form schema
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub table: String,
    pub title: String,
    pub label: String,
    /// Every declared field, hidden ones included
    pub fields: IndexMap<String, FieldMetadata>,
    pub hidden: HashSet<String>,
    /// Derived descriptors of the visible fields
    pub schema: FormSchema,
}

/// How a schema column links to another entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLink<'a> {
    /// The column holds the id of a `target` row
    Reference { target: &'a str },
    /// Rows of `target` whose `column` holds this row's id
    Reverse { target: &'a str, column: &'a str },
}

impl Entity {
    pub fn link(&self, field: &str) -> Option<FieldLink<'_>> {
        let meta = self.fields.get(field)?;
        let descriptor = self.schema.get(field)?;

        for member in meta.ty.non_null_members() {
            if let SemanticType::Relation(Relation::Reverse { target, column }) = member {
                return Some(FieldLink::Reverse { target, column });
            }
        }
        match &descriptor.reference_entity {
            Some(target) if !descriptor.is_multiple() => Some(FieldLink::Reference { target }),
            _ => None,
        }
    }

    /// Whether the field is backed by a column of this entity's table
    pub fn is_stored(&self, field: &str) -> bool {
        self.fields.contains_key(field) && !matches!(self.link(field), Some(FieldLink::Reverse { .. }))
    }
}

/// All registered entities, derived once at load time
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: IndexMap<String, Arc<Entity>>,
    enums: EnumTable,
}

impl EntityRegistry {
    pub fn load(path: impl AsRef<Path>, options: &RegistryOptions) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_yaml(&source, options)?;
        info!(
            "Loaded {} entities from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn from_yaml(source: &str, options: &RegistryOptions) -> Result<Self, RegistryError> {
        Self::build(EntityFile::from_yaml(source)?, options)
    }

    pub fn build(file: EntityFile, options: &RegistryOptions) -> Result<Self, RegistryError> {
        let enums: EnumTable = file
            .enums
            .into_iter()
            .map(|(name, members)| {
                let enum_type = members
                    .into_iter()
                    .fold(EnumType::new(name.clone()), |e, (member, value)| e.member(member, value));
                (name, Arc::new(enum_type))
            })
            .collect();

        let mut registry = EntityRegistry {
            entities: IndexMap::new(),
            enums,
        };

        for def in &file.entities {
            if options.excluded.iter().any(|name| name == &def.name) {
                debug!("Entity {} excluded", def.name);
                continue;
            }
            if registry.entities.contains_key(&def.name) {
                return Err(RegistryError::DuplicateEntity(def.name.clone()));
            }
            let entity = registry.register(def, options.policy)?;
            registry
                .entities
                .insert(entity.name.clone(), Arc::new(entity));
        }

        registry.check_links()?;
        Ok(registry)
    }

    fn register(&self, def: &EntityDef, policy: UnsupportedFieldPolicy) -> Result<Entity, RegistryError> {
        let table = def.table_name();
        let label = def.label_field();
        for ident in [def.name.as_str(), table.as_str(), label.as_str()] {
            if !is_valid_identifier(ident) {
                return Err(RegistryError::InvalidIdentifier(ident.to_string()));
            }
        }

        let mut fields = IndexMap::new();
        let mut hidden = HashSet::new();
        for field in &def.fields {
            if !is_valid_identifier(&field.name) {
                return Err(RegistryError::InvalidIdentifier(field.name.clone()));
            }
            let meta = field
                .metadata(&self.enums)
                .map_err(|source| RegistryError::TypeExpr {
                    entity: def.name.clone(),
                    field: field.name.clone(),
                    source,
                })?;
            if fields.insert(field.name.clone(), meta).is_some() {
                return Err(RegistryError::DuplicateField {
                    entity: def.name.clone(),
                    field: field.name.clone(),
                });
            }
            if field.hidden {
                hidden.insert(field.name.clone());
            }
        }

        if !fields.get("id").map(|meta| meta.ty.is_integer()).unwrap_or(false) {
            return Err(RegistryError::MissingId(def.name.clone()));
        }
        if !fields.contains_key(&label) {
            return Err(RegistryError::UnknownField {
                entity: def.name.clone(),
                field: label,
            });
        }

        let mut schema = FormSchema {
            entity: def.name.clone(),
            fields: IndexMap::new(),
        };
        for (name, meta) in fields.iter().filter(|(name, _)| !hidden.contains(*name)) {
            match derive_field(name, meta) {
                Ok(descriptor) => {
                    schema.fields.insert(name.clone(), descriptor);
                }
                Err(source) if policy == UnsupportedFieldPolicy::Skip => {
                    warn!("Skipping {}.{}: {}", def.name, name, source);
                }
                Err(source) => {
                    return Err(RegistryError::Schema {
                        entity: def.name.clone(),
                        source,
                    })
                }
            }
        }

        Ok(Entity {
            name: def.name.clone(),
            table,
            title: def.display_title(),
            label,
            fields,
            hidden,
            schema,
        })
    }

    /// Explicit relations must point at registered entities; `_id`
    /// convention targets only warn.
    fn check_links(&self) -> Result<(), RegistryError> {
        for entity in self.entities.values() {
            for (field, meta) in &entity.fields {
                for member in meta.ty.non_null_members() {
                    let SemanticType::Relation(relation) = member else {
                        continue;
                    };
                    let target = self
                        .entities
                        .get(relation.target())
                        .ok_or_else(|| RegistryError::UnknownEntity(relation.target().to_string()))?;
                    if let Relation::Reverse { column, .. } = relation {
                        if !target.fields.contains_key(column) {
                            return Err(RegistryError::UnknownField {
                                entity: target.name.clone(),
                                field: column.clone(),
                            });
                        }
                    }
                }

                if let Some(reference) = entity
                    .schema
                    .get(field)
                    .and_then(|d| d.reference_entity.as_ref())
                {
                    if !self.entities.contains_key(reference) {
                        warn!(
                            "{}.{} refers to unregistered entity {}",
                            entity.name, field, reference
                        );
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Entity>> {
        self.entities.get(name)
    }

    pub fn entity(&self, name: &str) -> Result<&Arc<Entity>, RegistryError> {
        self.get(name)
            .ok_or_else(|| RegistryError::UnknownEntity(name.to_string()))
    }

    pub fn schema(&self, name: &str) -> Result<&FormSchema, RegistryError> {
        self.entity(name).map(|e| &e.schema)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.values()
    }

    pub fn enums(&self) -> &EnumTable {
        &self.enums
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
