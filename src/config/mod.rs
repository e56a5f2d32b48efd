use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::entity::UnsupportedFieldPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub title: String,
    /// Directory served under `/statics`
    pub assets_dir: String,
    /// Extra user directory served under `/{static_dir}`
    pub static_dir: Option<String>,
    pub logo: Option<String>,
    /// Serve unminified assets
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Absent means the in-memory demo store
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// JSON rows loaded into the in-memory store at startup
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Jwt,
    Memory,
}

impl FromStr for SessionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jwt" => Ok(Self::Jwt),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown session backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub cookie_name: String,
    pub session_ttl_secs: u64,
    pub remember_me_ttl_secs: u64,
    pub session_backend: SessionBackend,
    pub user_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub entities_path: String,
    pub excluded_entities: Vec<String>,
    pub unsupported_fields: UnsupportedFieldPolicy,
    pub reference_options_limit: usize,
    pub datatable_max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    /// Mark session cookies `Secure`
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("FEMTO_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("FEMTO_TITLE") {
            self.server.title = v;
        }
        if let Ok(v) = env::var("FEMTO_ASSETS_DIR") {
            self.server.assets_dir = v;
        }
        if let Ok(v) = env::var("FEMTO_STATIC_DIR") {
            self.server.static_dir = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("FEMTO_LOGO") {
            self.server.logo = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("FEMTO_DEBUG") {
            self.server.debug = v.parse().unwrap_or(self.server.debug);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("FEMTO_SEED") {
            self.database.seed_path = Some(v).filter(|s| !s.is_empty());
        }

        // Auth overrides
        if let Ok(v) = env::var("FEMTO_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = env::var("FEMTO_COOKIE_NAME") {
            self.auth.cookie_name = v;
        }
        if let Ok(v) = env::var("FEMTO_SESSION_TTL_SECS") {
            self.auth.session_ttl_secs = v.parse().unwrap_or(self.auth.session_ttl_secs);
        }
        if let Ok(v) = env::var("FEMTO_REMEMBER_ME_TTL_SECS") {
            self.auth.remember_me_ttl_secs = v.parse().unwrap_or(self.auth.remember_me_ttl_secs);
        }
        if let Ok(v) = env::var("FEMTO_SESSION_BACKEND") {
            self.auth.session_backend = v.parse().unwrap_or(self.auth.session_backend);
        }
        if let Ok(v) = env::var("FEMTO_USER_TABLE") {
            self.auth.user_table = v;
        }

        // Admin overrides
        if let Ok(v) = env::var("FEMTO_ENTITIES") {
            self.admin.entities_path = v;
        }
        if let Ok(v) = env::var("FEMTO_EXCLUDED_ENTITIES") {
            self.admin.excluded_entities = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("FEMTO_UNSUPPORTED_FIELDS") {
            self.admin.unsupported_fields = v.parse().unwrap_or(self.admin.unsupported_fields);
        }
        if let Ok(v) = env::var("FEMTO_REFERENCE_OPTIONS_LIMIT") {
            self.admin.reference_options_limit = v.parse().unwrap_or(self.admin.reference_options_limit);
        }
        if let Ok(v) = env::var("FEMTO_DATATABLE_MAX_LENGTH") {
            self.admin.datatable_max_length = v.parse().unwrap_or(self.admin.datatable_max_length);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                title: "Admin".to_string(),
                assets_dir: "statics".to_string(),
                static_dir: None,
                logo: None,
                debug: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                seed_path: Some("demos/minimal/seed.json".to_string()),
            },
            auth: AuthConfig {
                jwt_secret: "femto-development-secret".to_string(),
                cookie_name: "token".to_string(),
                session_ttl_secs: 3600,
                remember_me_ttl_secs: 3600 * 24 * 30,
                session_backend: SessionBackend::Memory,
                user_table: "users".to_string(),
            },
            admin: AdminConfig {
                entities_path: "demos/minimal/entities.yaml".to_string(),
                excluded_entities: Vec::new(),
                unsupported_fields: UnsupportedFieldPolicy::Skip,
                reference_options_limit: 100,
                datatable_max_length: 1000,
            },
            security: SecurityConfig {
                enable_cors: true,
                secure_cookies: false,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                title: "Admin".to_string(),
                assets_dir: "statics".to_string(),
                static_dir: None,
                logo: None,
                debug: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
                seed_path: None,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                cookie_name: "token".to_string(),
                session_ttl_secs: 3600,
                remember_me_ttl_secs: 3600 * 24 * 30,
                session_backend: SessionBackend::Jwt,
                user_table: "users".to_string(),
            },
            admin: AdminConfig {
                entities_path: "entities.yaml".to_string(),
                excluded_entities: Vec::new(),
                unsupported_fields: UnsupportedFieldPolicy::Abort,
                reference_options_limit: 100,
                datatable_max_length: 500,
            },
            security: SecurityConfig {
                enable_cors: true,
                secure_cookies: true,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                title: "Admin".to_string(),
                assets_dir: "statics".to_string(),
                static_dir: None,
                logo: None,
                debug: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
                seed_path: None,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                cookie_name: "token".to_string(),
                session_ttl_secs: 3600,
                remember_me_ttl_secs: 3600 * 24 * 30,
                session_backend: SessionBackend::Jwt,
                user_table: "users".to_string(),
            },
            admin: AdminConfig {
                entities_path: "entities.yaml".to_string(),
                excluded_entities: Vec::new(),
                unsupported_fields: UnsupportedFieldPolicy::Abort,
                reference_options_limit: 50,
                datatable_max_length: 100,
            },
            security: SecurityConfig {
                enable_cors: false,
                secure_cookies: true,
            },
        }
    }

    pub fn registry_options(&self) -> crate::entity::RegistryOptions {
        crate::entity::RegistryOptions {
            policy: self.admin.unsupported_fields,
            excluded: self.admin.excluded_entities.clone(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
