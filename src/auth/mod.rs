//! Login subsystem.
//!
//! # Data Flow
//! ```text
//! login(username, password)
//!     → credentials.rs (verify; WrongCredentials stops here)
//!     → users::lookup (breaker-guarded fetch or fallback)
//!     → User
//! ```

pub mod credentials;
pub mod service;
pub mod types;

pub use credentials::{CredentialStore, StaticCredentialStore};
pub use service::UserService;
pub use types::{AuthError, AuthResult};
