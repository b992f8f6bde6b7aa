pub mod auth;
pub mod config;
pub mod error;
pub mod types;

pub use auth::{hash_password, verify_password, AllowAll, Authenticator, DenyAll, PasswordAuthenticator, Principal};
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use types::{new_id, now, round2};
