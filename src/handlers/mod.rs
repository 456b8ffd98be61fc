//! HTTP handlers for entity CRUD and login.

pub mod auth;
pub mod entity;
pub use auth::login;
