use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::require_admin;
use crate::state::AppState;

/// Every route the admin serves: method, path, description
pub const ROUTES: &[(&str, &str, &str)] = &[
    // Public
    ("GET", "/health", "Health check"),
    ("GET", "/login", "Login form"),
    ("POST", "/login", "Start a session"),
    ("GET", "/reg", "First admin form (no users yet)"),
    ("POST", "/reg", "Create the first admin"),
    ("GET", "/logout", "End the session"),
    ("GET", "/favicon.ico", "Redirect to the bundled icon"),
    ("GET", "/statics/*", "Bundled assets"),
    // Admin session required
    ("GET", "/", "Dashboard"),
    ("GET", "/password", "Change password form"),
    ("POST", "/password", "Change password"),
    ("GET", "/api/schema/:entity", "Derived form schema (?materialize=true)"),
    ("POST", "/dt/:entity", "DataTables server-side rows"),
    ("GET", "/:entity", "Entity list"),
    ("GET", "/:entity/:id", "Entity row form"),
];

pub fn print_routes() {
    println!("\nFemto Admin Routes:");
    println!("{:-<60}", "");
    for (method, path, desc) in ROUTES {
        println!("{:6} {:30} {}", method, path, desc);
    }
    println!();
}

pub fn app(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(Arc::clone(&state)))
        .nest_service("/statics", ServeDir::new(&state.config.server.assets_dir));

    if let Some(dir) = &state.config.server.static_dir {
        let prefix = format!("/{}", dir.trim_matches('/'));
        router = router.nest_service(&prefix, ServeDir::new(dir));
    }

    let mut router = router
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http());
    if state.config.security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(public::health))
        .route("/login", get(public::login_get).post(public::login_post))
        .route("/reg", get(public::reg_get).post(public::reg_post))
        .route("/logout", get(public::logout))
        .route("/favicon.ico", get(public::favicon))
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(protected::dashboard))
        .route(
            "/password",
            get(protected::password_get).post(protected::password_post),
        )
        .route("/api/schema/:entity", get(protected::schema_get))
        .route("/dt/:entity", post(protected::datatable))
        .route("/:entity", get(protected::entity_index))
        .route("/:entity/:id", get(protected::entity_edit))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
