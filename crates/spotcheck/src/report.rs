//! Pass/fail results of a grading run.

use std::fmt::Write as _;

use owo_colors::OwoColorize;

/// Result of one named check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: String,
    pub failures: Vec<String>,
}

impl CheckOutcome {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failures: Vec::new(),
        }
    }

    /// Record a failed assertion. The check keeps going.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// All outcomes of a run, in the order the checks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub outcomes: Vec<CheckOutcome>,
}

impl Report {
    pub fn push(&mut self, outcome: CheckOutcome) {
        self.outcomes.push(outcome);
    }

    /// True when every check passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(CheckOutcome::passed)
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn get(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Human-readable summary, one line per check plus indented failures.
    pub fn render(&self, color: bool) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let mark = match (outcome.passed(), color) {
                (true, true) => "✓".green().to_string(),
                (false, true) => "✗".red().to_string(),
                (true, false) => "✓".to_string(),
                (false, false) => "✗".to_string(),
            };
            let _ = writeln!(out, "{mark} {}", outcome.name);
            for failure in &outcome.failures {
                let _ = writeln!(out, "    - {failure}");
            }
        }

        let summary = format!(
            "{}/{} checks passed",
            self.passed_count(),
            self.outcomes.len()
        );
        if color {
            let _ = writeln!(out, "{}", summary.bold());
        } else {
            let _ = writeln!(out, "{summary}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        let mut report = Report::default();
        report.push(CheckOutcome::new("plans"));

        let mut history = CheckOutcome::new("reproduction history");
        history.fail("historico_reproducao has 13 row(s), expected 14");
        history.fail("primary key of historico_reproducao is not composite: [id]");
        report.push(history);
        report
    }

    #[test]
    fn empty_report_passes() {
        assert!(Report::default().passed());
    }

    #[test]
    fn one_failure_fails_the_run() {
        let report = sample();
        assert!(!report.passed());
        assert_eq!(report.passed_count(), 1);
        assert!(report.get("plans").unwrap().passed());
    }

    #[test]
    fn renders_plain_summary() {
        insta::assert_snapshot!(sample().render(false), @r"
        ✓ plans
        ✗ reproduction history
            - historico_reproducao has 13 row(s), expected 14
            - primary key of historico_reproducao is not composite: [id]
        1/2 checks passed
        ");
    }
}
