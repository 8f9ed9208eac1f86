use thiserror::Error;

use crate::plugin::PluginCategory;
use crate::validation::ValidationPath;

/// Errors from plugin registration and lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no {category} plugin named '{name}'")]
    NotFound {
        category: PluginCategory,
        name: String,
    },

    #[error("{category} plugin '{name}' is already registered")]
    Duplicate {
        category: PluginCategory,
        name: String,
    },
}

/// Errors from storage backends and the persistent mapping facade.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not bound: call open_storage first")]
    NotBound,

    #[error("illegal state: storage already bound to namespace '{namespace}'")]
    AlreadyBound { namespace: String },

    #[error("key not found: '{0}'")]
    KeyNotFound(String),

    #[error("invalid namespace: '{0}'")]
    InvalidNamespace(String),

    #[error("storage handle is closed")]
    Closed,

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A candidate value does not have the shape of its reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("structure mismatch at {path}: expected {expected}, found {found}")]
pub struct StructureValidationError {
    pub path: ValidationPath,
    pub expected: String,
    pub found: String,
}

/// Errors from version parsing and compatibility gating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version '{input}': {reason}")]
    Format { input: String, reason: String },

    #[error("version {running} is incompatible: {constraint}")]
    Incompatible { running: String, constraint: String },
}

/// Reading a persisted value that must also match a declared shape.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Invalid(#[from] StructureValidationError),
}

/// Errors raised while a backend is connecting or serving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServeError {
    /// External interrupt (Ctrl+C, SIGTERM) observed by the backend.
    #[error("interrupted")]
    Interrupted,

    /// The backend's input stream ended.
    #[error("end of input")]
    EndOfInput,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl ServeError {
    /// Whether this is an ordinary request to stop serving rather than a failure.
    pub fn is_termination(&self) -> bool {
        matches!(self, ServeError::Interrupted | ServeError::EndOfInput)
    }
}
