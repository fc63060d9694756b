//! Core type definitions used across the HookHub workspace.

pub mod id;
pub mod response;

pub use id::HookId;
pub use response::ApiResponse;
