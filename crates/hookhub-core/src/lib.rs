//! # hookhub-core
//!
//! Core crate for HookHub. Contains the unified error system, typed
//! identifiers, the control-surface response envelope, and the
//! configuration schemas and loaders.
//!
//! This crate has **no** internal dependencies on other HookHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
