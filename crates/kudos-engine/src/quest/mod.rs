//! Week-7 exam-readiness quest.

pub mod evaluator;
pub mod lifecycle;

pub use evaluator::{apply_event, category_percent, compute_readiness, progress, Readiness};
pub use lifecycle::QuestService;
