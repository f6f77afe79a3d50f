pub mod handlers;
pub mod jwt;
pub mod models;
mod password;
pub mod service;

// Re-export handlers for use in main.rs
pub use handlers::{login, logout, me, refresh, register, update_profile};

// Re-export for use in extractors
pub use jwt::decode_token;
pub use models::{AuthSettings, Role};
