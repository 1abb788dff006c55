//! Validation module for checking a problem statement before scheduling.
//!
//! The pipeline runs independent stages over one parsed snapshot and
//! concatenates their findings.

pub mod pipeline;
pub mod stages;

pub use pipeline::ValidationPipeline;
pub use stages::{
    AttributesJsonValidation, CoRunCycleValidation, ConcurrencyValidation, DuplicateIdValidation,
    LoadLimitFeasibility, MalformedListValidation, NumericRangeValidation, OverloadValidation,
    PhaseSaturationValidation, PhaseSpecValidation, PhaseWindowConflictValidation,
    ReferenceValidation, RuleIntegrityValidation, SchemaValidation, SkillCoverageValidation,
    SlotRestrictionFeasibility, ValidationStage,
};
