//! Authentication and access control

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Credential, TokenCodec};
pub use middleware::{auth_middleware, require_admin, AuthState, ClientIp};
