//! Projection tests
//!
//! End-to-end runs of `project_package` over small service graphs:
//! - Type catalogue identity, generated names, discriminators
//! - Usage and access propagation
//! - Operation projection and parameter correspondence
//! - Client tree, initialization parameters, customizations
//! - Long-running operation metadata
//! - JSON export (`serde` feature)

pub mod tests_export;
pub mod tests_lro;
pub mod tests_operations;
pub mod tests_usage;
