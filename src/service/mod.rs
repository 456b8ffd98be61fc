//! CrudService: generic CRUD over a DataStore. AuthService: login.

mod auth;
mod crud;
mod validation;
pub use auth::{normalize_roles, AuthService, LoginRequest, LoginResponse};
pub use crud::CrudService;
pub use validation::{now_stamp, RequestValidator, WriteMode};
