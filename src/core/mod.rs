//! Core types for the Allotment validation engine.
//!
//! This module contains the foundational pieces every check builds on:
//! - Table rows, entities and required columns
//! - Tolerant cell parsers
//! - Constraint rules
//! - The dataset and its parsed validation context
//! - Options and error types

pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod fields;
pub mod rule;
pub mod types;

// Re-export commonly used types
pub use config::ValidationOptions;
pub use context::ValidationContext;
pub use dataset::Dataset;
pub use error::{
    AllotmentError, ConfigError, ErrorCategory, FieldError, FindingKind, InputError,
    ValidationError, ValidationReport,
};
pub use rule::{GroupKind, Rule, TaskIdList};
pub use types::{Entity, Record, Table};
