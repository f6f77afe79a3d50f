pub mod handlers;
pub mod models;
pub mod service;

// Re-export handlers for use in main.rs
pub use handlers::{change_password, delete_user, list_users, toggle_user_status, update_user};
