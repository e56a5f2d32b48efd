use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::Deserialize;

use super::type_expr::{parse_type, EnumTable, TypeExprError};
use crate::form::{FieldMetadata, Validator};

/// Top-level shape of an entities YAML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityFile {
    /// Enum name -> (member name -> integer value)
    #[serde(default)]
    pub enums: IndexMap<String, IndexMap<String, i64>>,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDef {
    pub name: String,
    pub table: Option<String>,
    pub title: Option<String>,
    /// Field used as the human readable label of a row
    pub label: Option<String>,
    pub fields: Vec<FieldDef>,
}

impl EntityDef {
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| self.name.to_case(Case::Snake))
    }

    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.name.clone())
    }

    pub fn label_field(&self) -> String {
        self.label.clone().unwrap_or_else(|| "id".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub title: Option<String>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub validators: Vec<Validator>,
}

impl FieldDef {
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.name.to_case(Case::Title))
    }

    /// Resolve the declared type expression into deriver input
    pub fn metadata(&self, enums: &EnumTable) -> Result<FieldMetadata, TypeExprError> {
        let ty = parse_type(&self.ty, enums)?;
        let mut meta = FieldMetadata::new(ty, self.display_title());
        if self.nullable {
            meta = meta.nullable();
        }
        meta.validators = self.validators.clone();
        Ok(meta)
    }
}

impl EntityFile {
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Primitive, SemanticType};

    const SOURCE: &str = r#"
enums:
  Status:
    draft: 1
    live: 2
entities:
  - name: BlogPost
    label: title
    fields:
      - name: id
        type: int
      - name: title
        type: str
        validators:
          - max_length: 200
      - name: author_id
        type: int
        nullable: true
"#;

    #[test]
    fn parses_yaml_with_defaults() {
        let file = EntityFile::from_yaml(SOURCE).unwrap();
        assert_eq!(file.enums["Status"]["live"], 2);

        let post = &file.entities[0];
        assert_eq!(post.table_name(), "blog_post");
        assert_eq!(post.display_title(), "BlogPost");
        assert_eq!(post.label_field(), "title");
        assert_eq!(post.fields[2].display_title(), "Author Id");
        assert_eq!(post.fields[1].validators, vec![Validator::MaxLength(200)]);
    }

    #[test]
    fn nullable_flag_wraps_type() {
        let file = EntityFile::from_yaml(SOURCE).unwrap();
        let meta = file.entities[0].fields[2].metadata(&EnumTable::new()).unwrap();
        assert_eq!(
            meta.ty,
            SemanticType::optional(SemanticType::Primitive(Primitive::Integer))
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = EntityFile::from_yaml("entities:\n  - name: X\n    fields: []\n    colour: red\n");
        assert!(err.is_err());
    }
}
