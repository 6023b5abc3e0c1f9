//! Shared helpers for integration tests.
//!
//! - `graph_fixtures`: service graphs built with `GraphBuilder`
//! - `package_assertions`: projection runners and assertions on `SdkPackage`

pub mod graph_fixtures;
