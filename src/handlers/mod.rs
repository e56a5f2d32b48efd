// handlers/mod.rs - Request handlers split by access tier
//
// Public (no session) → Protected (admin session required, see middleware::require_admin)

pub mod protected;
pub mod public;
