// Output formatting and styling

use bindsync_sync::{
    ApplyReport, ItemOutcome, Operation, Outcome, PlanItem, PlanStats, SchemaReport,
};
use colored::Colorize;

use crate::logging::VerbosityLevel;

/// Output styling configuration
pub struct OutputStyle {
    pub use_colors: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl OutputStyle {
    /// Plain text, for pipes and tests
    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    /// Format success message
    pub fn success(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✓".green().bold(), msg)
        } else {
            format!("✓ {}", msg)
        }
    }

    /// Format error message
    pub fn error(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✗".red().bold(), msg)
        } else {
            format!("✗ {}", msg)
        }
    }

    /// Format warning message
    pub fn warning(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "⚠".yellow(), msg)
        } else {
            format!("⚠ {}", msg)
        }
    }

    /// Format info message
    pub fn info(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "ℹ".blue(), msg)
        } else {
            format!("ℹ {}", msg)
        }
    }

    /// Format a section header
    pub fn section(&self, title: &str) -> String {
        if self.use_colors {
            format!(
                "\n{}\n{}",
                title.bold().underline(),
                "─".repeat(title.chars().count())
            )
        } else {
            format!("\n{}\n{}", title, "─".repeat(title.chars().count()))
        }
    }

    /// Format a key-value pair
    pub fn key_value(&self, key: &str, value: &str) -> String {
        if self.use_colors {
            format!("  {}: {}", key.bold(), value)
        } else {
            format!("  {}: {}", key, value)
        }
    }

    /// Operation name padded to a fixed column and colored by kind
    pub fn operation(&self, operation: Operation) -> String {
        let label = format!("{:<13}", operation.as_str());
        if !self.use_colors {
            return label;
        }
        match operation {
            Operation::Create => label.green().bold().to_string(),
            Operation::Update => label.yellow().bold().to_string(),
            Operation::Rebind => label.magenta().bold().to_string(),
            Operation::SkipNoMatch => label.red().to_string(),
            Operation::SkipSame | Operation::SkipBuiltin => label.dimmed().to_string(),
        }
    }

    /// One plan line: operation, key sequence, name and match provenance
    pub fn plan_item(&self, item: &PlanItem) -> String {
        let mut line = format!(
            "  {} {:<20} {}",
            self.operation(item.operation),
            item.row.lhs_normalized,
            item.row.display_name
        );
        if let (Some(id), Some(via)) = (&item.matched_remote_id, item.matched_via) {
            line.push_str(&format!("  [{} via {}]", id, via));
        }
        line
    }

    pub fn plan_stats(&self, stats: &PlanStats) -> String {
        [
            ("create", stats.create),
            ("update", stats.update),
            ("rebind", stats.rebind),
            ("skip_same", stats.skip_same),
            ("skip_builtin", stats.skip_builtin),
            ("skip_no_match", stats.skip_no_match),
        ]
        .iter()
        .map(|(k, v)| self.key_value(k, &v.to_string()))
        .collect::<Vec<_>>()
        .join("\n")
    }

    /// Render a plan; skip lines are left out unless `show_skips`
    pub fn plan(&self, plan: &[PlanItem], stats: &PlanStats, show_skips: bool) -> String {
        let mut out = vec![self.section("Plan")];
        out.extend(
            plan.iter()
                .filter(|i| show_skips || !matches!(i.operation, Operation::SkipSame | Operation::SkipBuiltin))
                .map(|i| self.plan_item(i)),
        );
        out.push(self.section("Summary"));
        out.push(self.plan_stats(stats));
        out.join("\n")
    }

    /// One per-row result line during execution
    pub fn outcome(&self, item: &ItemOutcome) -> String {
        let text = format!("{} {} ({})", item.lhs, item.display_name, item.outcome);
        match &item.outcome {
            Outcome::Created { .. } | Outcome::Updated { .. } | Outcome::Rebound { .. } => {
                self.success(&text)
            }
            Outcome::Failed { .. } => self.error(&text),
            Outcome::Duplicate | Outcome::NotRun => self.warning(&text),
            Outcome::Skipped { .. } => self.info(&text),
        }
    }

    pub fn report(&self, report: &ApplyReport) -> String {
        let mut out = vec![
            self.section("Result"),
            self.key_value("created", &report.created.to_string()),
            self.key_value("updated", &report.updated.to_string()),
            self.key_value("rebound", &report.rebound.to_string()),
            self.key_value("skipped", &report.skipped.to_string()),
            self.key_value("duplicates", &report.duplicates.to_string()),
            self.key_value("failed", &report.failed.to_string()),
        ];
        if report.aborted {
            out.push(self.warning(&format!(
                "Aborted: {} items not run",
                report.not_run
            )));
        }
        out.join("\n")
    }

    pub fn schema(&self, report: &SchemaReport) -> String {
        let mut out = vec![self.section(&format!("Database: {}", report.database_title))];
        for property in &report.properties {
            let line = format!("{} -> {}", property.field, property.label);
            out.push(match &property.remote_type {
                Some(kind) => self.success(&format!("{} ({})", line, kind)),
                None => self.warning(&format!("{} (missing)", line)),
            });
        }
        if !report.is_usable() {
            out.push(self.error(&format!(
                "Sync is blocked until these properties exist: {}",
                report.missing_required().join(", ")
            )));
        }
        out.join("\n")
    }
}

/// Print formatted output
pub fn print_success(msg: &str) {
    if VerbosityLevel::Normal.should_output() {
        println!("{}", OutputStyle::default().success(msg));
    }
}

pub fn print_error(msg: &str) {
    eprintln!("{}", OutputStyle::default().error(msg));
}

pub fn print_warning(msg: &str) {
    eprintln!("{}", OutputStyle::default().warning(msg));
}

pub fn print_info(msg: &str) {
    if VerbosityLevel::Normal.should_output() {
        println!("{}", OutputStyle::default().info(msg));
    }
}
