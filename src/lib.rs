//! # Allotment - Consistency Validation for Scheduling Problems
//!
//! Allotment checks a resource-allocation problem statement (clients,
//! workers, tasks and constraint rules) for internal consistency before it
//! is handed to a scheduler.
//!
//! ## Features
//!
//! - **Tolerant cell parsing**: list cells may be JSON arrays or comma lists
//! - **Independent stages**: every check reads one immutable snapshot and returns its own findings
//! - **Rule graph analysis**: co-run cycles and phase-window conflicts
//! - **Capacity analysis**: worker overload, phase saturation, skill coverage, concurrency feasibility
//! - **Parallel execution**: stages can run on the rayon pool with unchanged output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use allotment::prelude::*;
//!
//! let dataset = Dataset::from_json(&std::fs::read_to_string("problem.json")?)?;
//!
//! let pipeline = ValidationPipeline::default_pipeline();
//! let report = pipeline.validate(&dataset);
//!
//! println!("{}", report.summary());
//! for line in report.detailed_errors() {
//!     println!("{}", line);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Rows, cell parsers, rules, dataset, options and error types
//! - [`graph`]: Co-run graph and phase-window analysis
//! - [`validation`]: Validation stages and the pipeline that orders them

#![warn(clippy::all)]

pub mod core;
pub mod graph;
pub mod validation;

use crate::core::dataset::Dataset;
use crate::core::error::{InputError, ValidationError};
use crate::validation::pipeline::ValidationPipeline;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use allotment::prelude::*;
/// ```
pub mod prelude {
    // Data
    pub use crate::core::dataset::Dataset;
    pub use crate::core::rule::{GroupKind, Rule, TaskIdList};
    pub use crate::core::types::{Entity, Record, Table};

    // Options and context
    pub use crate::core::config::ValidationOptions;
    pub use crate::core::context::ValidationContext;

    // Errors and findings
    pub use crate::core::error::{
        AllotmentError, ConfigError, ErrorCategory, FieldError, FindingKind, InputError,
        ValidationError, ValidationReport,
    };

    // Graph
    pub use crate::graph::{CoRunGraph, PhaseWindows};

    // Validation
    pub use crate::validation::pipeline::ValidationPipeline;
    pub use crate::validation::stages::ValidationStage;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Run the standard checks with default options.
///
/// An empty list means the problem statement is consistent.
pub fn validate(dataset: &Dataset) -> Vec<ValidationError> {
    ValidationPipeline::default_pipeline().run(dataset)
}

/// Parse a `{clients, workers, tasks, rules}` document and validate it.
///
/// Fails only when the document does not have that shape.
pub fn validate_json(input: &str) -> Result<Vec<ValidationError>, InputError> {
    let dataset = Dataset::from_json(input)?;
    Ok(validate(&dataset))
}
