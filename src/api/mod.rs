// API routes and handlers

pub mod athlete;
pub mod auth;
pub mod directory;
pub mod health;
pub mod manager;
pub mod messages;
pub mod routes;
pub mod trainer;

pub use routes::{create_routes, AppState};
