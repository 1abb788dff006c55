//! Validation options.

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of phases supply is computed for when nothing else is configured.
pub const DEFAULT_PHASE_COUNT: u32 = 5;

/// Knobs for a validation run.
///
/// Loadable from TOML:
///
/// ```toml
/// phase_count = 5
/// parallel = false
/// extended_checks = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Worker supply is accumulated for phases `1..=phase_count`.
    pub phase_count: u32,
    /// Run stages on the rayon pool. Output order is unaffected.
    pub parallel: bool,
    /// Append rule-feasibility and phase-spec checks after the standard ones.
    pub extended_checks: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            phase_count: DEFAULT_PHASE_COUNT,
            parallel: false,
            extended_checks: false,
        }
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phase_count(mut self, phase_count: u32) -> Self {
        self.phase_count = phase_count;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_extended_checks(mut self, extended: bool) -> Self {
        self.extended_checks = extended;
        self
    }

    /// Parse options from TOML text; absent keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(text)?;
        if options.phase_count == 0 {
            return Err(ConfigError::ZeroPhaseCount);
        }
        Ok(options)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Phases that receive worker supply.
    pub fn phases(&self) -> std::ops::RangeInclusive<u32> {
        1..=self.phase_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = ValidationOptions::default();
        assert_eq!(options.phase_count, 5);
        assert!(!options.parallel);
        assert!(!options.extended_checks);
        assert_eq!(options.phases().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let options = ValidationOptions::from_toml_str("parallel = true").unwrap();
        assert!(options.parallel);
        assert_eq!(options.phase_count, DEFAULT_PHASE_COUNT);
    }

    #[test]
    fn test_rejects_zero_phases_and_bad_toml() {
        assert!(matches!(
            ValidationOptions::from_toml_str("phase_count = 0"),
            Err(ConfigError::ZeroPhaseCount)
        ));
        assert!(matches!(
            ValidationOptions::from_toml_str("phase_count = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "phase_count = 8\nextended_checks = true").unwrap();

        let options = ValidationOptions::from_file(file.path()).unwrap();
        assert_eq!(options, ValidationOptions::new().with_phase_count(8).with_extended_checks(true));

        let missing = ValidationOptions::from_file("/nonexistent/allotment.toml");
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
