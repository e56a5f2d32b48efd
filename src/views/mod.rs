//! Page rendering.
//!
//! Handlers build a [`View`] and hand it to whatever [`ViewRenderer`] the
//! application was started with; [`HtmlRenderer`] is the built-in one.

pub mod html;
pub mod widgets;

use chrono::Datelike;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::entity::EntityRegistry;
use crate::form::FormSchema;

pub use html::HtmlRenderer;
pub use widgets::{escape, render_widget};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(String),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &View) -> Result<String, RenderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub name: String,
    pub title: String,
}

/// Page chrome shared by every view
#[derive(Debug, Clone)]
pub struct Layout {
    pub site_title: String,
    pub subtitle: String,
    pub entities: Vec<NavEntry>,
    pub user: Option<String>,
    pub logo: Option<String>,
    pub year: i32,
    pub version: &'static str,
    /// Reference minified vendor assets
    pub minify: bool,
}

impl Layout {
    pub fn new(site_title: &str, registry: &EntityRegistry) -> Self {
        Self {
            site_title: site_title.to_string(),
            subtitle: String::new(),
            entities: registry
                .iter()
                .map(|e| NavEntry {
                    name: e.name.clone(),
                    title: e.title.clone(),
                })
                .collect(),
            user: None,
            logo: None,
            year: chrono::Utc::now().year(),
            version: env!("CARGO_PKG_VERSION"),
            minify: true,
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }
}

/// A datatable column of an index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: String,
    pub title: String,
    pub orderable: bool,
}

#[derive(Debug, Clone)]
pub enum View {
    Login {
        layout: Layout,
        reason: Option<String>,
        username: Option<String>,
    },
    Init {
        layout: Layout,
        error: Option<String>,
    },
    Password {
        layout: Layout,
        error: Option<String>,
    },
    Dashboard {
        layout: Layout,
        counts: Vec<(NavEntry, u64)>,
    },
    Index {
        layout: Layout,
        entity: String,
        columns: Vec<Column>,
    },
    Edit {
        layout: Layout,
        entity: String,
        id: i64,
        schema: FormSchema,
        /// Current values keyed by field; reverse relations hold an id array
        values: IndexMap<String, Value>,
    },
}

impl View {
    pub fn layout(&self) -> &Layout {
        match self {
            View::Login { layout, .. }
            | View::Init { layout, .. }
            | View::Password { layout, .. }
            | View::Dashboard { layout, .. }
            | View::Index { layout, .. }
            | View::Edit { layout, .. } => layout,
        }
    }
}

/// Human readable text for the error codes the auth forms round-trip
pub fn error_message(code: &str) -> &str {
    match code {
        "username" => "No account with that username",
        "password" => "Wrong password",
        "confirm_password_different" => "Passwords do not match",
        "old_password_error" => "Current password is wrong",
        "new_password_different" => "New passwords do not match",
        other => other,
    }
}
