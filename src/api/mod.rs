//! REST API layer: routing, request validation, and error translation.

pub mod handlers;
pub mod rest;

pub use handlers::*;
pub use rest::*;
