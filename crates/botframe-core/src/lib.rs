//! Runtime support layer for botframe.
//!
//! This crate defines the "ports" that infrastructure plugins implement
//! (storage plugins, chat backends) together with the logic that is shared by
//! every implementation: the plugin registry, the persistent mapping facade,
//! the structure validator, version ordering, the connection lifecycle, and a
//! few text helpers.
//! It depends only on `botframe-types` -- never on `botframe-infra`.

pub mod backend;
pub mod event;
pub mod plugin;
pub mod storage;
pub mod structure;
pub mod text;
pub mod version;
