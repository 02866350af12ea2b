pub mod auth;
pub mod response;

pub use auth::require_principal;
pub use response::{ApiResult, Envelope};
