use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;

use super::types::{FormSchema, OptionsSource};

/// Source of selectable rows for reference fields (id -> label).
#[async_trait]
pub trait OptionsProvider: Send + Sync {
    async fn reference_options(
        &self,
        entity: &str,
        offset: usize,
        limit: usize,
    ) -> anyhow::Result<IndexMap<i64, String>>;
}

impl FormSchema {
    /// Second phase of derivation: fill deferred reference options.
    ///
    /// Returns a new schema; `self` is left untouched. Fields whose lookup fails
    /// stay deferred with empty options. Deferred lists without a reference
    /// entity have nothing to look up and are returned as they are.
    pub async fn materialize(&self, provider: &dyn OptionsProvider, limit: usize) -> FormSchema {
        let pending: Vec<(String, String)> = self
            .fields
            .iter()
            .filter(|(_, d)| d.is_deferred())
            .filter_map(|(name, d)| {
                d.reference_entity
                    .as_ref()
                    .map(|entity| (name.clone(), entity.clone()))
            })
            .collect();

        let lookups = pending
            .iter()
            .map(|(_, entity)| provider.reference_options(entity, 0, limit));
        let results = join_all(lookups).await;

        let mut schema = self.clone();
        for ((field, entity), result) in pending.into_iter().zip(results) {
            let Some(descriptor) = schema.fields.get_mut(&field) else {
                continue;
            };
            match result {
                Ok(options) => {
                    descriptor.options = options;
                    descriptor.options_source = OptionsSource::Loaded;
                }
                Err(e) => {
                    tracing::warn!(
                        "Could not load options for {}.{} from {}: {}",
                        self.entity,
                        field,
                        entity,
                        e
                    );
                }
            }
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::deriver::derive;
    use crate::form::types::{FieldMetadata, Primitive, SemanticType};

    struct Authors;

    #[async_trait]
    impl OptionsProvider for Authors {
        async fn reference_options(
            &self,
            entity: &str,
            offset: usize,
            limit: usize,
        ) -> anyhow::Result<IndexMap<i64, String>> {
            match entity {
                "Author" => Ok((1..=3)
                    .skip(offset)
                    .take(limit)
                    .map(|id| (id, format!("author {}", id)))
                    .collect()),
                other => anyhow::bail!("no such entity: {}", other),
            }
        }
    }

    fn schema() -> FormSchema {
        let int = FieldMetadata::new(SemanticType::Primitive(Primitive::Integer), "Author");
        let editor = FieldMetadata::new(SemanticType::Primitive(Primitive::Integer), "Editor");
        let tags = FieldMetadata::new(
            SemanticType::list_of(SemanticType::Primitive(Primitive::String)),
            "Tags",
        );
        derive(
            "Post",
            [("author_id", &int), ("editor_id", &editor), ("tags", &tags)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fills_reference_options() {
        let derived = schema();
        let loaded = derived.materialize(&Authors, 2).await;

        let author = &loaded.fields["author_id"];
        assert_eq!(author.options_source, OptionsSource::Loaded);
        assert_eq!(
            author.options.values().cloned().collect::<Vec<_>>(),
            vec!["author 1", "author 2"]
        );
        // input schema untouched
        assert!(derived.fields["author_id"].options.is_empty());
    }

    #[tokio::test]
    async fn failed_lookup_stays_deferred() {
        let loaded = schema().materialize(&Authors, 10).await;
        let editor = &loaded.fields["editor_id"];
        assert!(editor.is_deferred());
        assert!(editor.options.is_empty());
    }

    #[tokio::test]
    async fn lists_without_reference_stay_empty() {
        let loaded = schema().materialize(&Authors, 10).await;
        let tags = &loaded.fields["tags"];
        assert!(tags.is_deferred());
        assert!(tags.options.is_empty());
    }
}
