use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{load_registry, OutputFormat};
use crate::form::FormSchema;

pub fn handle(path: &str, entity: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let registry = load_registry(path)?;
    let schema = registry.schema(entity)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            &format!("Schema of {}", schema.entity),
            Some(json!({ "schema": schema })),
        ),
        OutputFormat::Text => {
            print!("{}", describe_text(schema));
            Ok(())
        }
    }
}

/// One line per field: name, widget, required flag, then extras
pub fn describe_text(schema: &FormSchema) -> String {
    let mut out = format!("{}\n{:-<60}\n", schema.entity, "");
    for (name, field) in schema.iter() {
        out.push_str(&format!(
            "{:20} {:14} {:8} {}",
            name,
            field.widget.as_str(),
            if field.required { "required" } else { "" },
            field.display_name
        ));
        if let Some(target) = &field.reference_entity {
            out.push_str(&format!(" -> {}", target));
        }
        if !field.options.is_empty() {
            let options: Vec<String> = field.options.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            out.push_str(&format!(" [{}]", options.join(", ")));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityRegistry, RegistryOptions};

    #[test]
    fn text_lists_fields_in_order() {
        let yaml = "enums:\n  Role: { admin: 1, editor: 2 }\nentities:\n  - name: User\n    fields:\n      - { name: id, type: int }\n      - { name: role, type: Role }\n      - { name: team_id, type: int? }\n  - name: Team\n    fields:\n      - { name: id, type: int }\n";
        let registry = EntityRegistry::from_yaml(yaml, &RegistryOptions::default()).unwrap();
        let text = describe_text(registry.schema("User").unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "User");
        assert!(lines[2].starts_with("id"));
        assert!(lines[3].contains("[1=admin, 2=editor]"));
        assert!(lines[4].contains("-> Team"));
    }
}
