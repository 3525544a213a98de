use serde::{Deserialize, Serialize};

/// Outcome of verifying a credential or presentation.
///
/// A document is verified when the report holds no errors. Checks list what
/// passed, warnings what was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub checks: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl VerificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, check: impl Into<String>) {
        self.checks.push(check.into());
    }

    pub fn error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Folds the report of a nested document into this one.
    ///
    /// Errors and warnings of the nested report are prefixed to name their origin.
    pub fn merge_nested(&mut self, prefix: &str, nested: VerificationReport) {
        self.errors.extend(nested.errors.into_iter().map(|error| format!("{prefix}: {error}")));
        self.warnings.extend(nested.warnings.into_iter().map(|warning| format!("{prefix}: {warning}")));
    }

    /// Seals the report, deriving `verified` from the collected errors.
    pub fn finish(mut self) -> Self {
        self.verified = self.errors.is_empty();
        self
    }
}
