pub mod auth;
pub mod permission;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use permission::{authorize, CommandCode, FunctionCode};
