//! The Analytics Engine: computed answers with tables and citations.

pub mod answer;
pub mod engine;
pub mod stats;

pub use answer::*;
pub use engine::*;
pub use stats::*;
