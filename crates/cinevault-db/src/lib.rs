//! Database repositories for data access layer
//!
//! Each repository is responsible for a specific domain entity and provides
//! CRUD operations and specialized queries over the shared `PgPool`.

pub mod movies;
pub mod users;

pub use movies::MovieRepository;
pub use users::UserRepository;
