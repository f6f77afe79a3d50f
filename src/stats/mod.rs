pub mod aggregator;
mod arith;
#[cfg(test)]
mod fixtures;
pub mod handlers;
pub mod models;
pub mod platform;
pub mod service;
pub mod share;
pub mod validation;

pub use handlers::{get_category_shares, get_platform_statistics, get_statistics};
