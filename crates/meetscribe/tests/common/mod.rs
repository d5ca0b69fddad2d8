//! Shared test utilities for meetscribe integration tests.
//!
//! This module provides:
//! - `TestHarness` for orchestrator runs against a temp directory and in-memory database
//! - Builders for pipelines and test artifacts
//! - Stub providers that record every call

pub mod builders;
pub mod harness;
pub mod stubs;

pub use builders::*;
pub use harness::TestHarness;
pub use stubs::*;
