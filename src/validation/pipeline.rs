//! Validation pipeline implementation.

use crate::core::config::ValidationOptions;
use crate::core::context::ValidationContext;
use crate::core::dataset::Dataset;
use crate::core::error::{ValidationError, ValidationReport};
use crate::core::rule::Rule;
use crate::validation::stages::{
    AttributesJsonValidation, CoRunCycleValidation, ConcurrencyValidation, DuplicateIdValidation,
    LoadLimitFeasibility, MalformedListValidation, NumericRangeValidation, OverloadValidation,
    PhaseSaturationValidation, PhaseSpecValidation, PhaseWindowConflictValidation,
    ReferenceValidation, RuleIntegrityValidation, SchemaValidation, SkillCoverageValidation,
    SlotRestrictionFeasibility, ValidationStage,
};
use rayon::prelude::*;
use std::time::Instant;

/// Multi-stage validation pipeline.
///
/// Runs a series of stages over one dataset snapshot and concatenates their
/// findings in stage order. No stage can stop a later one from running.
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
    options: ValidationOptions,
}

impl ValidationPipeline {
    /// Create a new pipeline with the given stages.
    pub fn new(stages: Vec<Box<dyn ValidationStage>>) -> Self {
        Self {
            stages,
            options: ValidationOptions::default(),
        }
    }

    fn canonical_stages() -> Vec<Box<dyn ValidationStage>> {
        vec![
            Box::new(SchemaValidation),
            Box::new(DuplicateIdValidation),
            Box::new(MalformedListValidation),
            Box::new(NumericRangeValidation),
            Box::new(AttributesJsonValidation),
            Box::new(ReferenceValidation),
            Box::new(CoRunCycleValidation),
            Box::new(PhaseWindowConflictValidation),
            Box::new(OverloadValidation),
            Box::new(PhaseSaturationValidation),
            Box::new(SkillCoverageValidation),
            Box::new(ConcurrencyValidation),
        ]
    }

    /// The twelve standard checks, in canonical order.
    pub fn default_pipeline() -> Self {
        Self::new(Self::canonical_stages())
    }

    /// The standard checks followed by preferred-phase, rule-integrity and
    /// group-feasibility checks.
    pub fn extended_pipeline() -> Self {
        let mut pipeline = Self::default_pipeline();
        pipeline.add_stage(Box::new(PhaseSpecValidation));
        pipeline.add_stage(Box::new(RuleIntegrityValidation));
        pipeline.add_stage(Box::new(LoadLimitFeasibility));
        pipeline.add_stage(Box::new(SlotRestrictionFeasibility));
        pipeline
    }

    /// Pick the default or extended stage list from `options.extended_checks`.
    pub fn from_options(options: ValidationOptions) -> Self {
        let pipeline = if options.extended_checks {
            Self::extended_pipeline()
        } else {
            Self::default_pipeline()
        };
        pipeline.with_options(options)
    }

    /// Replace the run options. The stage list is left as is.
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Add a custom validation stage.
    pub fn add_stage(&mut self, stage: Box<dyn ValidationStage>) {
        self.stages.push(stage);
    }

    /// Stage names in run order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    fn run_stage(stage: &dyn ValidationStage, ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
        let start = Instant::now();
        let errors = stage.validate(ctx);
        log::debug!(
            "{}: {} finding(s) in {:?}",
            stage.name(),
            errors.len(),
            start.elapsed()
        );
        errors
    }

    /// Run every stage and return the findings, in stage order.
    pub fn run(&self, dataset: &Dataset) -> Vec<ValidationError> {
        let ctx = ValidationContext::new(dataset, &self.options);

        let ignored = dataset
            .rules
            .iter()
            .filter(|rule| matches!(rule, Rule::Unknown))
            .count();
        if ignored > 0 {
            log::warn!("Ignoring {} rule(s) of unknown type", ignored);
        }

        let per_stage: Vec<Vec<ValidationError>> = if self.options.parallel {
            self.stages
                .par_iter()
                .map(|stage| Self::run_stage(stage.as_ref(), &ctx))
                .collect()
        } else {
            self.stages
                .iter()
                .map(|stage| Self::run_stage(stage.as_ref(), &ctx))
                .collect()
        };

        per_stage.into_iter().flatten().collect()
    }

    /// Validate a dataset through all stages.
    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        let start = Instant::now();
        let mut report = ValidationReport::new();
        report.extend(self.run(dataset));
        report.duration_ms = start.elapsed().as_millis() as u64;

        log::info!(
            "Validated {} client(s), {} worker(s), {} task(s), {} rule(s) with {} stage(s): {} finding(s)",
            dataset.clients.len(),
            dataset.workers.len(),
            dataset.tasks.len(),
            dataset.rules.len(),
            self.stages.len(),
            report.errors.len()
        );
        report
    }

    /// Quick validation - whether the dataset has no findings at all.
    pub fn is_valid(&self, dataset: &Dataset) -> bool {
        self.run(dataset).is_empty()
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Record;

    fn sample() -> Dataset {
        Dataset::new(
            vec![Record::new()
                .with("ClientID", "C1")
                .with("PriorityLevel", "9")
                .with("RequestedTaskIDs", "T1,T9")
                .with("AttributesJSON", "")],
            vec![Record::new()
                .with("WorkerID", "W1")
                .with("AvailableSlots", "[1,2]")
                .with("Skills", "a")
                .with("MaxLoadPerPhase", "3")],
            vec![Record::new()
                .with("TaskID", "T1")
                .with("Duration", "2")
                .with("RequiredSkills", "a,b")
                .with("MaxConcurrent", "1")
                .with("PreferredPhases", "9-1")],
            vec![Rule::co_run(["T1", "T1"]), Rule::load_limit("", 1)],
        )
    }

    #[test]
    fn test_stage_order() {
        let pipeline = ValidationPipeline::default_pipeline();
        let names = pipeline.stage_names();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "Schema Validation");
        assert_eq!(names[11], "Concurrency Feasibility Validation");

        let extended = ValidationPipeline::extended_pipeline();
        assert_eq!(extended.stage_names().len(), 16);
        assert_eq!(&extended.stage_names()[..12], &names[..]);
    }

    #[test]
    fn test_findings_follow_stage_order() {
        let report = ValidationPipeline::default_pipeline().validate(&sample());
        let kinds: Vec<_> = report.errors.iter().map(|e| e.row_id.as_str()).collect();

        // priority, unknown T9, cycle on T1, overload W1, skill b, concurrency T1
        assert_eq!(kinds, vec!["C1", "C1", "T1", "W1", "skill_coverage", "T1"]);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_extended_checks_append_after_canonical() {
        let dataset = sample();
        let canonical = ValidationPipeline::default_pipeline().run(&dataset);
        let extended = ValidationPipeline::from_options(
            ValidationOptions::default().with_extended_checks(true),
        )
        .run(&dataset);

        assert_eq!(&extended[..canonical.len()], &canonical[..]);
        let extra: Vec<_> = extended[canonical.len()..]
            .iter()
            .map(|e| e.row_id.as_str())
            .collect();
        assert_eq!(extra, vec!["T1", "rule_1"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dataset = sample();
        let sequential = ValidationPipeline::extended_pipeline().run(&dataset);
        let parallel = ValidationPipeline::extended_pipeline()
            .with_options(ValidationOptions::default().with_parallel(true))
            .run(&dataset);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_custom_stage() {
        struct Nothing;
        impl ValidationStage for Nothing {
            fn name(&self) -> &str {
                "Nothing"
            }
            fn validate(&self, _ctx: &ValidationContext<'_>) -> Vec<ValidationError> {
                Vec::new()
            }
        }

        let mut pipeline = ValidationPipeline::new(Vec::new());
        pipeline.add_stage(Box::new(Nothing));
        assert_eq!(pipeline.stage_names(), vec!["Nothing"]);
        assert!(pipeline.is_valid(&Dataset::default()));
    }
}
