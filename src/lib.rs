pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resources;
pub mod store;

#[cfg(test)]
pub mod testing;
