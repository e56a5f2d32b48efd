use serde_json::json;

use crate::app::{print_routes, ROUTES};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let routes: Vec<_> = ROUTES
                .iter()
                .map(|(method, path, desc)| json!({ "method": method, "path": path, "description": desc }))
                .collect();
            output_success(&output_format, "Routes", Some(json!({ "routes": routes })))
        }
        OutputFormat::Text => {
            print_routes();
            Ok(())
        }
    }
}
