//! Run statistics.
//!
//! One `RunStats` exists per run. Phase 1 writes it sequentially; phase 2
//! writes it only from the collector after every deployment unit finished.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub packages_processed: usize,
    pub packages_with_errors: usize,
    pub artifacts_processed: usize,
    pub artifacts_configured: usize,
    pub artifacts_failed: usize,
    pub parameters_updated: usize,
    pub parameters_failed: usize,
    pub batch_requests_executed: usize,
    pub individual_requests_used: usize,
    pub deployment_tasks_queued: usize,
    pub deployment_tasks_succeeded: usize,
    pub deployment_tasks_failed: usize,
    pub artifacts_deployed: usize,
}

impl RunStats {
    /// A run fails when any artifact or deployment task failed.
    pub fn has_failures(&self) -> bool {
        self.artifacts_failed > 0 || self.deployment_tasks_failed > 0
    }

    /// Human-readable summary block.
    pub fn summary(&self, dry_run: bool) -> Summary<'_> {
        Summary { stats: self, dry_run }
    }
}

/// Display adapter for the end-of-run summary.
pub struct Summary<'a> {
    stats: &'a RunStats,
    dry_run: bool,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.stats;
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "{}", if self.dry_run { "DRY RUN SUMMARY" } else { "CONFIGURATION SUMMARY" })?;
        writeln!(f, "{rule}")?;
        row(f, "Packages processed", s.packages_processed)?;
        row(f, "Packages with errors", s.packages_with_errors)?;
        row(f, "Artifacts processed", s.artifacts_processed)?;
        row(f, "Artifacts configured", s.artifacts_configured)?;
        row(f, "Artifacts failed", s.artifacts_failed)?;
        row(f, "Parameters updated", s.parameters_updated)?;
        row(f, "Parameters failed", s.parameters_failed)?;

        if !self.dry_run {
            writeln!(f)?;
            writeln!(f, "Performance:")?;
            row(f, "Batch requests executed", s.batch_requests_executed)?;
            row(f, "Individual requests used", s.individual_requests_used)?;
        }

        if s.deployment_tasks_queued > 0 {
            writeln!(f)?;
            writeln!(f, "Deployment:")?;
            row(f, "Deployment tasks queued", s.deployment_tasks_queued)?;
            if !self.dry_run {
                row(f, "Deployments successful", s.deployment_tasks_succeeded)?;
                row(f, "Deployments failed", s.deployment_tasks_failed)?;
                row(f, "Artifacts deployed", s.artifacts_deployed)?;
            }
        }

        writeln!(f, "{rule}")?;
        let verdict = if s.has_failures() {
            "Configuration/deployment completed with errors"
        } else if self.dry_run {
            "Dry run completed successfully"
        } else {
            "Configuration/deployment completed successfully"
        };
        write!(f, "{verdict}")
    }
}

fn row(f: &mut fmt::Formatter<'_>, label: &str, value: usize) -> fmt::Result {
    writeln!(f, "{:<29}{}", format!("{label}:"), value)
}
