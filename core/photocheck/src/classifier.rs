use serde::Serialize;

use crate::analyzer::{CheckResult, CheckStatus};

/// Aggregate status of a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// Every check passed.
    Pass,
    /// No critical failure, at least one warning.
    Warn,
    /// At least one critical failure.
    Fail,
}

/// Result counts of a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    /// Number of results.
    pub total: usize,
    /// Critical failures.
    pub critical: usize,
    /// Failures of any kind.
    pub failures: usize,
    /// Warnings.
    pub warnings: usize,
    /// Passes.
    pub passes: usize,
}

/// Ordered check results plus their aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    /// Results in battery order.
    pub results: Vec<CheckResult>,
    /// Counts over `results`.
    pub summary: Summary,
    /// Aggregate status.
    pub overall: OverallStatus,
}

impl Verdict {
    /// Whether any critical failure exists.
    pub fn has_critical_issues(&self) -> bool {
        self.summary.critical > 0
    }

    /// Whether any warning exists.
    pub fn has_warnings(&self) -> bool {
        self.summary.warnings > 0
    }

    /// No failures of any kind. Warnings are allowed.
    pub fn is_valid(&self) -> bool {
        self.summary.failures == 0
    }
}

/// Fold results into a verdict: any critical failure fails, otherwise any
/// warning warns, otherwise pass.
pub fn aggregate(results: Vec<CheckResult>) -> Verdict {
    let mut summary = Summary {
        total: results.len(),
        ..Summary::default()
    };
    for result in &results {
        match result.status {
            CheckStatus::Pass => summary.passes += 1,
            CheckStatus::Warn => summary.warnings += 1,
            CheckStatus::Fail => {
                summary.failures += 1;
                if result.critical {
                    summary.critical += 1;
                }
            }
        }
    }

    let overall = if summary.critical > 0 {
        OverallStatus::Fail
    } else if summary.warnings > 0 {
        OverallStatus::Warn
    } else {
        OverallStatus::Pass
    };

    Verdict {
        results,
        summary,
        overall,
    }
}
