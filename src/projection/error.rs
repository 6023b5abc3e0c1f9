//! Error types for projection.

use thiserror::Error;

use crate::base::{DeclRef, OperationId, PropertyId};
use crate::diagnostics::{codes, Diagnostic};

/// Structural problems that stop the projection of one method.
///
/// The method is skipped and the error is reported as a diagnostic; the
/// rest of the package is still produced. Only [`ProjectionError::Invariant`]
/// aborts the whole run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectionError {
    /// Wire parameter without a path, query, header or body location.
    #[error("parameter '{param}' of operation '{operation}' has no wire location")]
    UnclassifiedParameter {
        operation: String,
        param: String,
        property: PropertyId,
    },

    /// A parameter resolved to a different kind than its position requires.
    #[error("parameter '{param}' was expected to be {expected}, found {found}")]
    UnexpectedParameterKind {
        param: String,
        expected: &'static str,
        found: &'static str,
        property: PropertyId,
    },

    /// Some, but not all, members of a spread body found their method parameter.
    #[error("spread body of '{operation}' resolved {found} of {expected} members to method parameters")]
    SpreadNotResolved {
        operation: String,
        expected: usize,
        found: usize,
        target: OperationId,
    },

    #[error("wire parameter '{param}' of '{operation}' has no corresponding method parameter")]
    NoCorrespondingMethodParam {
        operation: String,
        param: String,
        target: OperationId,
    },

    #[error("operation '{operation}' declares bodies of different types")]
    DivergentBodyTypes { operation: String, target: OperationId },

    /// Internal consistency check failed.
    #[error("projection invariant violated: {0}")]
    Invariant(String),
}

impl ProjectionError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::UnclassifiedParameter { .. } | Self::UnexpectedParameterKind { .. } => {
                codes::UNEXPECTED_HTTP_PARAM_TYPE
            }
            Self::SpreadNotResolved { .. } => codes::SPREAD_NOT_RESOLVED,
            Self::NoCorrespondingMethodParam { .. } => codes::NO_CORRESPONDING_METHOD_PARAM,
            Self::DivergentBodyTypes { .. } => codes::MULTIPLE_BODY_TYPES,
            Self::Invariant(_) => codes::PROJECTION_INVARIANT,
        }
    }

    pub fn target(&self) -> Option<DeclRef> {
        match self {
            Self::UnclassifiedParameter { property, .. }
            | Self::UnexpectedParameterKind { property, .. } => Some(DeclRef::Property(*property)),
            Self::SpreadNotResolved { target, .. }
            | Self::NoCorrespondingMethodParam { target, .. }
            | Self::DivergentBodyTypes { target, .. } => Some(DeclRef::Operation(*target)),
            Self::Invariant(_) => None,
        }
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.target(), self.to_string()).with_code(self.code())
    }
}
