// handlers/public/mod.rs - Public handlers (no session required)
//
// Login, first-admin registration, logout, health and the favicon redirect.
// Security Level: None

pub mod favicon;
pub mod health;
pub mod login;
pub mod logout;
pub mod register;

pub use favicon::favicon;
pub use health::health;
pub use login::{login_get, login_post};
pub use logout::logout;
pub use register::{reg_get, reg_post};
