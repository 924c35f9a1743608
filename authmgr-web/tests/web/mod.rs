/// Auth Manager - Web Page Tests.
///
/// Tests for the HTML pages, organized by functional area:
/// - groups_test: Group list, create, edit, remove and permission updates
/// - security_test: Login redirect, permission refusal, CSRF cookie, headers
pub mod groups_test;
pub mod security_test;
