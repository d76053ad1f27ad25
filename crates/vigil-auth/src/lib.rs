//! Vigil Auth — password authentication, session handling, opaque
//! secret generation, and principal resolution.

pub mod config;
pub mod error;
pub mod password;
pub mod resolver;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use resolver::PrincipalResolver;
pub use service::{AuthService, LoginOutput};
