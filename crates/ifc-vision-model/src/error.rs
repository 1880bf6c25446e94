// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for model acquisition
//!
//! Errors are layered: engines produce [`EngineError`], source adapters produce
//! [`ResolveError`], the loader wraps both I/O and engine failures in
//! [`LoaderError`], and the load controller reports everything as [`LoadError`].

use crate::EntityId;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by a geometry engine while building a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Payload is not a STEP physical file
    #[error("Invalid IFC format: {0}")]
    InvalidFormat(String),

    /// Failed to parse header section
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Unsupported IFC schema version
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchema(String),

    /// Failed to parse entity
    #[error("Failed to parse entity {0}: {1}")]
    EntityParse(EntityId, String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        EngineError::InvalidFormat(msg.into())
    }

    /// Create a new header error
    pub fn header(msg: impl Into<String>) -> Self {
        EngineError::InvalidHeader(msg.into())
    }

    /// Create a new entity parse error
    pub fn entity_parse(id: EntityId, msg: impl Into<String>) -> Self {
        EngineError::EntityParse(id, msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        EngineError::Other(msg.into())
    }
}

/// Errors raised while a source adapter resolves its payload
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The user dismissed the picker without choosing a file
    #[error("selection cancelled")]
    Cancelled,

    /// The payload could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The picker backend is unavailable or reported an error
    #[error("Picker error: {0}")]
    Chooser(String),
}

/// Errors raised by the loader while fetching and building a model
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Fetching or reading the payload failed
    #[error("IO error: {0}")]
    Io(String),

    /// The engine rejected the payload
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl LoaderError {
    /// Create a new I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        LoaderError::Io(msg.into())
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(err.to_string())
    }
}

/// Errors raised by a scene handle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// `attach` was called while a model is still attached
    #[error("scene already holds model '{0}'")]
    Occupied(String),
}

/// Errors reported at the load controller boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// A load session is already in flight
    #[error("a model is already being loaded")]
    Busy,

    /// The user dismissed the source selection
    #[error("source selection cancelled")]
    ResolutionCancelled,

    /// The payload could not be obtained (I/O, network, picker)
    #[error("{0}")]
    ResolutionFailed(String),

    /// The engine could not build a model from the payload
    #[error("{0}")]
    ParseFailed(String),
}

impl LoadError {
    /// Whether this error should be surfaced to the user as a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            LoadError::ResolutionFailed(_) | LoadError::ParseFailed(_)
        )
    }
}

impl From<ResolveError> for LoadError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Cancelled => LoadError::ResolutionCancelled,
            other => LoadError::ResolutionFailed(other.to_string()),
        }
    }
}

impl From<LoaderError> for LoadError {
    fn from(err: LoaderError) -> Self {
        match err {
            LoaderError::Io(msg) => LoadError::ResolutionFailed(msg),
            LoaderError::Engine(e) => LoadError::ParseFailed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_maps_to_resolution_cancelled() {
        let err: LoadError = ResolveError::Cancelled.into();
        assert_eq!(err, LoadError::ResolutionCancelled);
        assert!(!err.is_failure());
    }

    #[test]
    fn test_io_maps_to_resolution_failed() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.ifc");
        let err: LoadError = ResolveError::from(io).into();
        assert!(matches!(err, LoadError::ResolutionFailed(ref m) if m.contains("missing.ifc")));
        assert!(err.is_failure());

        let err: LoadError = LoaderError::io("connection reset").into();
        assert_eq!(err, LoadError::ResolutionFailed("connection reset".to_string()));
    }

    #[test]
    fn test_engine_error_maps_to_parse_failed() {
        let err: LoadError = LoaderError::from(EngineError::UnsupportedSchema("IFC1".into())).into();
        assert_eq!(
            err,
            LoadError::ParseFailed("Unsupported schema version: IFC1".to_string())
        );
        assert!(err.is_failure());
    }

    #[test]
    fn test_scene_error_names_model() {
        let err = SceneError::Occupied("IFCModel".to_string());
        assert_eq!(err.to_string(), "scene already holds model 'IFCModel'");
    }

    #[test]
    fn test_busy_is_not_a_failure() {
        assert!(!LoadError::Busy.is_failure());
    }
}
