pub mod access_control;
pub mod database;
pub mod jwt;
pub mod password;
pub mod pricing;

pub use access_control::{AccessControl, AccessError, IdentityStore};
pub use database::MongoDb;
pub use jwt::{SessionClaims, TokenService};
