//! Shared test utilities for papocr integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated parses with a scripted OCR engine
//! - Builders for PDF and image fixtures

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{EngineOutcome, FakeEngine, TestHarness};
