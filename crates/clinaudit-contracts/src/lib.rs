//! # clinaudit-contracts
//!
//! Shared types, settings, and error contracts for the clinaudit audit trail.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, settings parsing, and error types.

pub mod classification;
pub mod disclosure;
pub mod error;
pub mod event;
pub mod query;
pub mod settings;
