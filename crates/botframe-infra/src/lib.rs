//! Infrastructure layer for botframe.
//!
//! Concrete implementations of the contracts defined in `botframe-core`: the
//! `memory` and `file` storage plugins, the `null` chat backend, builtin
//! registration, and the `config.toml` loader.

pub mod backend;
pub mod builtins;
pub mod config;
pub mod storage;
