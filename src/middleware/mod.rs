pub mod auth;
pub mod response;

pub use auth::{clear_cookie, current_admin, flash_cookie, require_admin, session_cookie, CurrentAdmin};
pub use response::{ApiResponse, ApiResult};
