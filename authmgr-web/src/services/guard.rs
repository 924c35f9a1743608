/// Auth Manager - Permission checks for controller actions.
use crate::middleware::auth::AuthUser;

/// Permission that grants every other one.
pub const ADMIN_PERMISSION: &str = "admin";

/// Decides whether the current user may perform an action.
pub trait PermissionGuard {
    fn check_for_permission(&self, permission: &str) -> bool;
}

impl PermissionGuard for AuthUser {
    fn check_for_permission(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p == permission || p == ADMIN_PERMISSION)
    }
}
