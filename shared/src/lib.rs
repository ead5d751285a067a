//! Shared types and models for the Shop Ops Platform
//!
//! This crate contains the domain models and pure domain logic shared
//! between the backend services and their tests. It deliberately has no
//! database or HTTP dependencies.

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
