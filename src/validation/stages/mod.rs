//! Individual validation stages.
//!
//! Each stage checks for one category of problem and returns its own list of
//! findings. Stages only read the shared [`ValidationContext`], so any subset
//! can run in any order (or concurrently) and produce the same findings.

use crate::core::context::ValidationContext;
use crate::core::error::ValidationError;

pub mod capacity;
pub mod integrity;
pub mod references;
pub mod rules;
pub mod schema;

pub use capacity::{
    ConcurrencyValidation, OverloadValidation, PhaseSaturationValidation, SkillCoverageValidation,
};
pub use integrity::{
    AttributesJsonValidation, DuplicateIdValidation, MalformedListValidation,
    NumericRangeValidation, PhaseSpecValidation,
};
pub use references::ReferenceValidation;
pub use rules::{
    CoRunCycleValidation, LoadLimitFeasibility, PhaseWindowConflictValidation,
    RuleIntegrityValidation, SlotRestrictionFeasibility,
};
pub use schema::SchemaValidation;

/// Trait for validation stages.
pub trait ValidationStage: Send + Sync {
    /// Name of this validation stage.
    fn name(&self) -> &str;

    /// Check the snapshot. An empty list means this stage found nothing.
    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationError>;
}
