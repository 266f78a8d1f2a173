//! Validation accumulator: issues raised by validators reduce to one
//! [`ValidationResult`] per pipeline run.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    Safe,
    Warning,
    Unsafe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Risk {
    None,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    Injection,
    Tautology,
    MissingWhere,
    DisallowedDdl,
    RiskyDml,
    SuspiciousKeyword,
    ExcessiveJoins,
    CartesianProduct,
    ProcessorFailure,
    UnparsableStatement,
}

#[derive(Debug, Clone)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Verdict,
    pub risk: Risk,
    pub message: String,
    pub processor: &'static str,
    pub span: Option<(usize, usize)>,
}

impl Issue {
    #[must_use]
    pub fn new(
        kind: IssueKind,
        severity: Verdict,
        risk: Risk,
        processor: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            risk,
            message: message.into(),
            processor,
            span: None,
        }
    }

    #[must_use]
    pub const fn with_span(mut self, span: (usize, usize)) -> Self {
        self.span = Some(span);
        self
    }
}

/// Reduces to a [`ValidationResult`] by monotone maximum: the final verdict
/// and risk are never lower than any contributing issue's.
#[derive(Debug, Clone, Default)]
pub struct ValidationAccumulator {
    issues: Vec<Issue>,
}

impl ValidationAccumulator {
    #[must_use]
    pub const fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    #[must_use]
    pub fn reduce(self) -> ValidationResult {
        let verdict = self
            .issues
            .iter()
            .map(|i| i.severity)
            .max()
            .unwrap_or(Verdict::Safe);
        let risk = self.issues.iter().map(|i| i.risk).max().unwrap_or(Risk::None);
        ValidationResult {
            verdict,
            risk,
            issues: self.issues,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub verdict: Verdict,
    pub risk: Risk,
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    #[must_use]
    pub fn safe() -> Self {
        Self {
            verdict: Verdict::Safe,
            risk: Risk::None,
            issues: Vec::new(),
        }
    }

    /// Merges another result's issues in, recomputing the monotone max.
    /// Used when additional validators contribute beyond one reduce pass.
    pub fn merge(&mut self, other: Self) {
        self.verdict = self.verdict.max(other.verdict);
        self.risk = self.risk.max(other.risk);
        self.issues.extend(other.issues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_takes_monotone_maximum() {
        let mut acc = ValidationAccumulator::new();
        acc.push(Issue::new(
            IssueKind::MissingWhere,
            Verdict::Warning,
            Risk::Medium,
            "RiskyDML",
            "no where clause",
        ));
        acc.push(Issue::new(
            IssueKind::Tautology,
            Verdict::Unsafe,
            Risk::High,
            "TautologyDetector",
            "1=1",
        ));
        let result = acc.reduce();
        assert_eq!(result.verdict, Verdict::Unsafe);
        assert_eq!(result.risk, Risk::High);
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn empty_accumulator_is_safe() {
        let result = ValidationAccumulator::new().reduce();
        assert_eq!(result.verdict, Verdict::Safe);
    }

    #[test]
    fn adding_issues_never_decreases_verdict() {
        let base = ValidationAccumulator::new().reduce();
        let mut with_warning = ValidationAccumulator::new();
        with_warning.push(Issue::new(
            IssueKind::SuspiciousKeyword,
            Verdict::Warning,
            Risk::Low,
            "SuspiciousKeywords",
            "xp_cmdshell",
        ));
        let after = with_warning.reduce();
        assert!(after.verdict >= base.verdict);
    }
}
