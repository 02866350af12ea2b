// handlers/mod.rs - HTTP handlers
//
// Public: signup, login, per-user listings, service info.
// Protected (bearer token): create, update and delete on each resource.
pub mod auth;
pub mod resource;
pub mod system;
