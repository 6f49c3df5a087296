pub mod account;
pub mod admin;
pub mod health;
pub mod movies;
pub mod streaming;
