//! # clientgen-base
//!
//! Core library projecting a resolved service-definition graph into a
//! language-agnostic SDK client model.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! projection  → Type catalogue, usage/access, operations, methods, clients, LRO
//!   ↓
//! model       → Output SDK model (SdkType arena, properties, methods, clients)
//!   ↓
//! graph       → Consumed service graph, scoped overrides, GraphBuilder
//!   ↓
//! diagnostics → Diagnostic, Severity, codes, DiagnosticCollector
//!   ↓
//! base        → Primitives (typed ids, usage/initialization flags, text utils)
//! ```
//!
//! ## Example
//!
//! ```
//! use clientgen::graph::{GraphBuilder, HttpBinding, ServiceDecl, Verb};
//! use clientgen::{project_package, ProjectionOptions};
//!
//! let mut builder = GraphBuilder::new();
//! let ns = builder.namespace("Contoso", None);
//! builder.set_service(ns, ServiceDecl::default());
//! let string = builder.scalar("string");
//! let op = builder.operation(ns, "getWidget", Verb::Get, "/widgets/{name}");
//! builder.parameter(op, "name", string, HttpBinding::Path("name".into()));
//! let graph = builder.finish();
//!
//! let package = project_package(&graph, &ProjectionOptions::default()).unwrap();
//! let client = package.client("ContosoClient").unwrap();
//! assert!(client.method("getWidget").is_some());
//! ```

// ============================================================================
// MODULES (dependency order: base → diagnostics → graph → model → projection)
// ============================================================================

/// Foundation types: typed ids, bit-flag sets, naming helpers
pub mod base;

/// Diagnostics accumulated during a projection run
pub mod diagnostics;

/// The consumed service graph and its customizations
pub mod graph;

/// The produced SDK model
pub mod model;

/// Graph → model projection
pub mod projection;

// Re-export the entry point and the types every caller touches
pub use diagnostics::{Diagnostic, Severity};
pub use graph::{Graph, GraphBuilder};
pub use model::SdkPackage;
pub use projection::{project_package, ApiVersionSelection, ProjectionError, ProjectionOptions};
