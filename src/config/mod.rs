//! Configuration loading for the Samarth service.

pub mod settings;

pub use settings::*;
