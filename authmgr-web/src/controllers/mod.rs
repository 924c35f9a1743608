/// Auth Manager - Controllers.
///
/// Controllers hold the per-action flow and return view values; the
/// handlers in `handlers` adapt them to HTTP.
pub mod groups;

pub use groups::GroupController;
