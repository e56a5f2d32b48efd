#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{redirect::Policy, Client, Response, StatusCode};

use femto_admin_rust::auth::{hash_password, MemorySessionResolver};
use femto_admin_rust::config::AppConfig;
use femto_admin_rust::database::{MemoryEntityStore, MemoryUserStore, UserStore};
use femto_admin_rust::entity::EntityRegistry;
use femto_admin_rust::views::HtmlRenderer;
use femto_admin_rust::{app, AppState};

pub const ENTITIES: &str = include_str!("../../demos/minimal/entities.yaml");
pub const SEED: &str = include_str!("../../demos/minimal/seed.json");

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse";

/// A router served on its own port, backed by in-memory stores
pub struct TestApp {
    pub port: u16,
    pub base_url: String,
    pub client: Client,
    pub state: Arc<AppState>,
}

impl TestApp {
    /// Spawn with the demo entities and seed rows, and no admin accounts
    pub async fn spawn() -> Result<Self> {
        let mut config = AppConfig::development();
        config.server.assets_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/statics").to_string();
        config.security.enable_cors = false;

        let registry = EntityRegistry::from_yaml(ENTITIES, &config.registry_options())?;
        let store = MemoryEntityStore::new();
        store.seed(serde_json::from_str(SEED)?).await?;

        let state = Arc::new(AppState {
            config,
            registry: Arc::new(registry),
            store: Arc::new(store),
            users: Arc::new(MemoryUserStore::new()),
            sessions: Arc::new(MemorySessionResolver::new()),
            renderer: Arc::new(HtmlRenderer::default()),
        });

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        let router = app(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()?;

        let app = Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            client,
            state,
        };
        app.wait_ready(Duration::from_secs(5)).await?;
        Ok(app)
    }

    /// Spawn, create the admin account and sign in
    pub async fn signed_in() -> Result<Self> {
        let app = Self::spawn().await?;
        app.create_admin().await?;
        let resp = app.login(ADMIN_USER, ADMIN_PASSWORD, false).await?;
        anyhow::ensure!(resp.status() == StatusCode::SEE_OTHER, "login failed: {}", resp.status());
        Ok(app)
    }

    pub async fn create_admin(&self) -> Result<()> {
        self.state
            .users
            .create(ADMIN_USER, &hash_password(ADMIN_PASSWORD))
            .await?;
        Ok(())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Response> {
        Ok(self.client.post(self.url(path)).form(form).send().await?)
    }

    pub async fn login(&self, username: &str, password: &str, remember_me: bool) -> Result<Response> {
        let mut form = vec![("username", username), ("password", password)];
        if remember_me {
            form.push(("remember_me", "on"));
        }
        self.post_form("/login", &form).await
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// `Location` header of a redirect
pub fn location(resp: &Response) -> Option<String> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Value of a cookie the response sets
pub fn set_cookie(resp: &Response, name: &str) -> Option<String> {
    resp.cookies()
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}
