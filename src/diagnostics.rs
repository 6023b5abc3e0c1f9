//! Diagnostics for projection problems.
//!
//! Projection never aborts on a problem it can localize to one method or one
//! declaration. Those problems become a [`Diagnostic`] pinned to the
//! offending declaration and the rest of the package is still produced.

use std::sync::Arc;

use crate::base::DeclRef;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

/// A diagnostic message attached to an input declaration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    /// The declaration this diagnostic is about, if any.
    pub target: Option<DeclRef>,
    /// Severity level.
    pub severity: Severity,
    /// Stable code, see [`codes`].
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
    /// Optional related information.
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RelatedInfo {
    pub target: DeclRef,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(target: impl Into<Option<DeclRef>>, message: impl Into<Arc<str>>) -> Self {
        Self::new(target.into(), Severity::Error, message.into())
    }

    /// Create a new warning diagnostic.
    pub fn warning(target: impl Into<Option<DeclRef>>, message: impl Into<Arc<str>>) -> Self {
        Self::new(target.into(), Severity::Warning, message.into())
    }

    fn new(target: Option<DeclRef>, severity: Severity, message: Arc<str>) -> Self {
        Self {
            target,
            severity,
            code: None,
            message,
            related: Vec::new(),
        }
    }

    /// Set the diagnostic code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add related information.
    pub fn with_related(mut self, target: impl Into<DeclRef>, message: impl Into<Arc<str>>) -> Self {
        self.related.push(RelatedInfo {
            target: target.into(),
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.severity.as_str())?;
        if let Some(code) = &self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(target) = &self.target {
            write!(f, " ({})", target)?;
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Stable diagnostic codes.
pub mod codes {
    // ========================================================================
    // STRUCTURAL (per method)
    // ========================================================================

    /// A wire parameter is not path, query, header or body.
    pub const UNEXPECTED_HTTP_PARAM_TYPE: &str = "unexpected-http-param-type";
    /// A wire parameter has no method-level counterpart.
    pub const NO_CORRESPONDING_METHOD_PARAM: &str = "no-corresponding-method-param";
    /// A spread body only partially resolved to method parameters.
    pub const SPREAD_NOT_RESOLVED: &str = "spread-not-resolved";
    /// Declared bodies disagree on their type.
    pub const MULTIPLE_BODY_TYPES: &str = "multiple-body-types";
    /// Responses sharing a status code disagree on their type.
    pub const MULTIPLE_RESPONSE_TYPES: &str = "multiple-response-types";
    /// An internal consistency check failed.
    pub const PROJECTION_INVARIANT: &str = "projection-invariant";

    // ========================================================================
    // CLIENT CONFIGURATION
    // ========================================================================

    /// Root client marked parent-initialized, or a sub-client without the parent bit.
    pub const INVALID_INITIALIZED_BY: &str = "invalid-initialized-by";
    /// A server template argument is bound to something other than the path.
    pub const SERVER_PARAM_NOT_PATH: &str = "server-param-not-path";

    // ========================================================================
    // LONG-RUNNING OPERATIONS
    // ========================================================================

    pub const OPERATION_LINK_PARAMETER_INVALID_TARGET: &str =
        "operation-link-parameter-invalid-target";
    pub const REQUEST_PARAMETER_INVALID: &str = "request-parameter-invalid";
    pub const RESPONSE_PROPERTY_INVALID: &str = "response-property-invalid";
    pub const CONFLICTING_PARAMETER_MAPPING: &str = "conflicting-parameter-mapping";
    pub const LRO_STATUS_MISSING: &str = "lro-status-missing";
    pub const LRO_INVALID_LINK: &str = "lro-invalid-link";

    // ========================================================================
    // TYPES
    // ========================================================================

    /// A model is used both as multipart and as non-multipart body.
    pub const CONFLICTING_MULTIPART_USAGE: &str = "conflicting-multipart-usage";
    /// A discriminated subtype does not pin the discriminator to a constant.
    pub const DISCRIMINATOR_NOT_CONSTANT: &str = "discriminator-not-constant";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during a projection run.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            "[DIAG] {} {:?}: {}",
            diagnostic.severity.as_str(),
            diagnostic.code,
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    /// Add an error with a code.
    pub fn error(&mut self, target: impl Into<Option<DeclRef>>, code: &str, message: impl Into<Arc<str>>) {
        self.add(Diagnostic::error(target, message).with_code(code));
    }

    /// Add a warning with a code.
    pub fn warning(
        &mut self,
        target: impl Into<Option<DeclRef>>,
        code: &str,
        message: impl Into<Arc<str>>,
    ) {
        self.add(Diagnostic::warning(target, message).with_code(code));
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get diagnostics for a specific declaration.
    pub fn diagnostics_for(&self, target: DeclRef) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.target == Some(target))
            .collect()
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Consume the collector, dropping exact duplicates while keeping order.
    pub fn finish(self) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = Vec::with_capacity(self.diagnostics.len());
        for diagnostic in self.diagnostics {
            if !out.contains(&diagnostic) {
                out.push(diagnostic);
            }
        }
        out
    }
}
