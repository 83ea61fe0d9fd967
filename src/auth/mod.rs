//! Authentication: password hashing, opaque session tokens, the session lifecycle and the
//! request gate that protects the task API.

pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod sweeper;
pub mod token;

pub use extractors::{presented_token, AuthenticatedUserId};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use session::SessionManager;
pub use sweeper::spawn_expiry_sweeper;
