//! User lookup subsystem.
//!
//! # Data Flow
//! ```text
//! lookup(username)
//!     → lookup.rs (ask the breaker)
//!         rejected → fallback.rs (table entry or synthesized record)
//!         admitted → remote.rs (GET /users/{username}, bounded by call timeout)
//!     → User
//! ```

pub mod fallback;
pub mod lookup;
pub mod model;
pub mod remote;

pub use fallback::FallbackTable;
pub use lookup::{ResilientLookup, UserSource};
pub use model::User;
pub use remote::{HttpUserFetch, RemoteUserFetch, UpstreamError};
