pub mod admin;
pub mod auth;
pub mod health;
pub mod marketplace;

pub use health::health_check;
