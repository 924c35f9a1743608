/// Auth Manager - Data models.
///
/// Row types use Diesel for compile-time verified queries; the entity types
/// are what controllers and templates work with.
pub mod group;
pub mod permission;

pub use group::*;
pub use permission::*;
