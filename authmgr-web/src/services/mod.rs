/// Auth Manager - Services used by controllers and middleware.
pub mod csrf;
pub mod guard;
pub mod session;

pub use csrf::{CookieCsrf, CsrfService};
pub use guard::PermissionGuard;
