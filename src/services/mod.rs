//! API services layer

pub mod auth_service;
pub mod resource;

pub use auth_service::AuthService;
pub use resource::{Resource, ResourceService};
