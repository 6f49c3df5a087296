//! Domain models shared across crates

pub mod event;
pub mod movie;
pub mod user;

pub use event::{AnalyticsEvent, EventKind};
pub use movie::{Movie, MovieResponse, UpdateMovieRequest};
pub use user::{parse_roles, RegisterRequest, Role, User, UserResponse};
