//! CLI library components for the assessment ingestion tool.

#![allow(missing_docs)]

pub mod fixtures;
pub mod input;
pub mod logging;
pub mod workspace;
