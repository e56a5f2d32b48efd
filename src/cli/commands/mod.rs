pub mod check;
pub mod describe;
pub mod password;
pub mod routes;
