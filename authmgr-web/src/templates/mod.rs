/// Auth Manager - Askama templates module.
///
/// Template structs for every page. Each page carries a `LayoutContext`
/// used by `base.html`.
pub mod base;
pub mod errors;
pub mod groups;

pub use base::{FlashView, LayoutContext, UserContext};
pub use errors::NotFoundTemplate;
pub use groups::{GroupFormTemplate, GroupListTemplate, GroupRemoveListTemplate};
