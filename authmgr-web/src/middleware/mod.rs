/// Auth Manager - Middleware module.
pub mod auth;
pub mod csrf;
pub mod flash;
pub mod security;

pub use auth::*;
pub use flash::*;
