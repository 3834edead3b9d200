//! Error types for state engine operations

use thiserror::Error;

/// Result type alias for state engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every way a `load`, `save` or `clear` can fail.
///
/// Messages from the JSON parser and serializer are carried through verbatim
/// so callers see the same diagnostic serde_json produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No store is installed in the slot the engine is bound to
    #[error("localStorage is not defined")]
    StoreUnavailable,

    /// The stored text is not valid JSON (or does not fit the requested type)
    #[error("{message}")]
    Parse { message: String },

    /// The state could not be turned into JSON
    #[error("{message}")]
    Serialization { message: String },

    /// The store itself failed to read or write
    #[error("storage backend error: {message}")]
    Backend { message: String },

    /// The engine configuration is unreadable or names an unknown backend
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Error::Parse { message: msg.into() }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Error::Serialization { message: msg.into() }
    }

    /// Create a backend error from any store failure, keeping its context chain
    pub fn backend(err: anyhow::Error) -> Self {
        Error::Backend {
            message: format!("{:#}", err),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config { message: msg.into() }
    }

    /// Check whether no store was installed
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable)
    }

    /// Check whether the stored text failed to parse
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }

    /// Check whether the state failed to serialize
    pub fn is_serialization(&self) -> bool {
        matches!(self, Error::Serialization { .. })
    }
}
