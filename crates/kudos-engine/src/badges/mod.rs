//! Badge unlock engine: criteria evaluation, the default catalog, and the
//! idempotent unlock path.

pub mod catalog;
pub mod criteria;
pub mod engine;

pub use catalog::default_catalog;
pub use engine::BadgeEngine;
