pub mod admin;
pub mod auth;
pub mod category;
pub mod config;
pub mod errors;
pub mod extractors;
pub mod models;
pub mod openapi;
pub mod stats;
pub mod transaction;
