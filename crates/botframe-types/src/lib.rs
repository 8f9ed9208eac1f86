//! Shared domain types for botframe.
//!
//! This crate contains the types passed between the runtime support layer and
//! the plugins it hosts: plugin categories, connection states, lifecycle
//! events, validation paths, global configuration, and every error enum.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod plugin;
pub mod validation;
