pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::config;
use crate::entity::EntityRegistry;

#[derive(Parser)]
#[command(name = "femto")]
#[command(about = "Femto CLI - Inspect entity definitions and derived admin forms")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Entity definition file (defaults to FEMTO_ENTITIES)")]
    pub entities: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show the derived form schema of an entity")]
    Describe {
        #[arg(help = "Entity name")]
        entity: String,
    },

    #[command(about = "Derive every entity and report failures")]
    Check,

    #[command(about = "Hash a password for seeding the user table")]
    HashPassword {
        #[arg(help = "Plain text password")]
        password: String,
    },

    #[command(about = "List the HTTP routes")]
    Routes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Entity file named on the command line, else the configured one
pub fn entities_path(cli: &Cli) -> String {
    cli.entities
        .clone()
        .unwrap_or_else(|| config().admin.entities_path.clone())
}

pub fn load_registry(path: &str) -> anyhow::Result<EntityRegistry> {
    Ok(EntityRegistry::load(path, &config().registry_options())?)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let path = entities_path(&cli);

    match cli.command {
        Commands::Describe { entity } => commands::describe::handle(&path, &entity, output_format),
        Commands::Check => commands::check::handle(&path, output_format),
        Commands::HashPassword { password } => commands::password::handle(&password, output_format),
        Commands::Routes => commands::routes::handle(output_format),
    }
}
