use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::entity::{EntityRegistry, RegistryOptions, UnsupportedFieldPolicy};

/// Derive every entity with the strict policy; any failure is an error
pub fn handle(path: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let options = RegistryOptions {
        policy: UnsupportedFieldPolicy::Abort,
        excluded: config().admin.excluded_entities.clone(),
    };

    match EntityRegistry::load(path, &options) {
        Ok(registry) => {
            let names: Vec<&str> = registry.names().collect();
            output_success(
                &output_format,
                &format!("{} entities derived from {}", registry.len(), path),
                Some(json!({ "entities": names })),
            )
        }
        Err(e) => {
            output_error(&output_format, &e.to_string(), Some("ENTITY_CHECK_FAILED"))?;
            Err(e.into())
        }
    }
}
