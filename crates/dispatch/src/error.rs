use std::fmt;

use meshbridge_geometry::GeometryError;
use serde::Serialize;
use thiserror::Error;

use crate::{ConstructError, ParameterBag};

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Misuse of the run/collect protocol of a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("operation has already run")]
    AlreadyRun,

    #[error("operation has not run yet")]
    NotRun,

    #[error("operation failed, there is no result")]
    RunFailed,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    #[error("{operation}: malformed mesh: {source}")]
    MalformedMesh {
        operation: String,
        source: ConstructError,
    },

    #[error("{operation}: invalid parameters {parameters}: {source}")]
    InvalidParameters {
        operation: String,
        parameters: ParameterBag,
        source: ConstructError,
    },

    #[error("{operation}: geometry failure with parameters {parameters}: {source}")]
    GeometryFailure {
        operation: String,
        parameters: ParameterBag,
        source: GeometryError,
    },

    #[error("{operation}: {source}")]
    DispatcherState {
        operation: String,
        source: StateError,
    },
}

impl DispatchError {
    pub(crate) fn construct(
        operation: &str,
        parameters: &ParameterBag,
        source: ConstructError,
    ) -> Self {
        match source {
            ConstructError::Parameters(_) => DispatchError::InvalidParameters {
                operation: operation.to_string(),
                parameters: parameters.clone(),
                source,
            },
            ConstructError::Mesh(_) | ConstructError::MissingMesh => DispatchError::MalformedMesh {
                operation: operation.to_string(),
                source,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            DispatchError::MalformedMesh { .. } => ErrorKind::MalformedMesh,
            DispatchError::InvalidParameters { .. } => ErrorKind::InvalidParameters,
            DispatchError::GeometryFailure { .. } => ErrorKind::GeometryFailure,
            DispatchError::DispatcherState { .. } => ErrorKind::DispatcherState,
        }
    }

    /// The requested operation name.
    pub fn operation(&self) -> &str {
        match self {
            DispatchError::UnknownOperation(operation)
            | DispatchError::MalformedMesh { operation, .. }
            | DispatchError::InvalidParameters { operation, .. }
            | DispatchError::GeometryFailure { operation, .. }
            | DispatchError::DispatcherState { operation, .. } => operation,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownOperation,
    MalformedMesh,
    InvalidParameters,
    GeometryFailure,
    DispatcherState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::UnknownOperation => "unknown_operation",
            ErrorKind::MalformedMesh => "malformed_mesh",
            ErrorKind::InvalidParameters => "invalid_parameters",
            ErrorKind::GeometryFailure => "geometry_failure",
            ErrorKind::DispatcherState => "dispatcher_state",
        };
        f.write_str(s)
    }
}

/// What the host receives instead of a result when a request fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}
