//! Common test utilities for covenant integration tests
//!
//! Builds agreement texts with known line positions and study-record
//! collections with known defects.

#![allow(dead_code)]

pub mod agreement;
pub mod records;

pub use agreement::{AgreementFixture, FixtureArticle};
pub use records::{defective_collection, drafting_question};
