// handlers/protected/mod.rs - Admin pages (session required)
//
// Every route here sits behind middleware::require_admin, which inserts
// the CurrentAdmin extension or redirects to /login.

pub mod dashboard;
pub mod datatable;
pub mod entity;
pub mod password;
pub mod schema;

pub use dashboard::dashboard;
pub use datatable::datatable;
pub use entity::{entity_edit, entity_index};
pub use password::{password_get, password_post};
pub use schema::schema_get;
