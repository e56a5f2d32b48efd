use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::response::Html;
use tracing::{info, warn};

use crate::auth::{self, IdentityResolver};
use crate::config::AppConfig;
use crate::database::{
    DatabaseManager, EntityStore, MemoryEntityStore, MemoryUserStore, PgEntityStore, PgUserStore, StoreOptions,
    UserStore,
};
use crate::entity::EntityRegistry;
use crate::error::ApiError;
use crate::middleware::CurrentAdmin;
use crate::views::{HtmlRenderer, Layout, View, ViewRenderer};

/// Everything a request handler needs, shared behind an `Arc`
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<EntityRegistry>,
    pub store: Arc<dyn EntityStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn IdentityResolver>,
    pub renderer: Arc<dyn ViewRenderer>,
}

impl AppState {
    /// Load the entity registry and connect the stores named by `config`
    ///
    /// Without `database.url` rows and admins live in memory, optionally
    /// seeded from `database.seed_path`.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let registry = EntityRegistry::load(&config.admin.entities_path, &config.registry_options())
            .with_context(|| format!("loading entities from {}", config.admin.entities_path))?;
        info!("Registered {} entities", registry.len());
        let registry = Arc::new(registry);

        let (store, users): (Arc<dyn EntityStore>, Arc<dyn UserStore>) = match &config.database.url {
            Some(_) => {
                let pool = DatabaseManager::pool(&config.database).await?;
                (
                    Arc::new(PgEntityStore::new(pool.clone())),
                    Arc::new(PgUserStore::new(pool, &config.auth.user_table)?),
                )
            }
            None => {
                warn!("DATABASE_URL not set, using the in-memory store");
                let store = MemoryEntityStore::new();
                if let Some(path) = &config.database.seed_path {
                    let raw = std::fs::read_to_string(path).with_context(|| format!("reading seed {}", path))?;
                    let rows = store.seed(serde_json::from_str(&raw)?).await?;
                    info!("Seeded {} rows from {}", rows, path);
                }
                (Arc::new(store), Arc::new(MemoryUserStore::new()))
            }
        };

        let sessions = auth::resolver(&config.auth).context("session backend")?;

        Ok(Self {
            config,
            registry,
            store,
            users,
            sessions,
            renderer: Arc::new(HtmlRenderer::default()),
        })
    }

    pub fn layout(&self, subtitle: &str, admin: Option<&CurrentAdmin>) -> Layout {
        let mut layout = Layout::new(&self.config.server.title, &self.registry)
            .subtitle(subtitle)
            .user(admin.map(|a| a.username.clone()));
        layout.logo = self.config.server.logo.clone();
        layout.minify = !self.config.server.debug;
        layout
    }

    /// Reference options read through the entity store
    pub fn options(&self) -> StoreOptions {
        StoreOptions::new(Arc::clone(&self.registry), Arc::clone(&self.store))
    }

    pub fn render(&self, view: &View) -> Result<Html<String>, ApiError> {
        Ok(Html(self.renderer.render(view)?))
    }

    pub fn session_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            Duration::from_secs(self.config.auth.remember_me_ttl_secs)
        } else {
            Duration::from_secs(self.config.auth.session_ttl_secs)
        }
    }
}
