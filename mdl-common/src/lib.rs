//! Shared types for the MDL music download service
//!
//! Holds the error/result types and the root-folder resolution logic used
//! by the service crates.

pub mod config;
pub mod error;

pub use error::{Error, Result};
