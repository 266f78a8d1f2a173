//! Built-in validators. Each inspects the fully-transformed AST and pushes
//! zero or more `Issue`s onto `ctx.validation`; none mutate the AST.

use logging::debug;

use crate::ast::AstNode;
use crate::context::ProcessingContext;
use crate::validation::{Issue, IssueKind, Risk, Verdict};

use super::{ProcessorOutcome, Validator};

/// Flags obvious injection patterns: unbalanced quoting in the raw source,
/// a stacked second statement where only one was expected, or textual
/// concatenation markers (`||`, `+`) feeding into a predicate. Operates on
/// `ctx.raw_sql` rather than the AST, since a successfully parsed AST can
/// by construction never contain unbalanced quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectionDetector;

impl InjectionDetector {
    fn unbalanced_quotes(sql: &str) -> bool {
        let mut in_single = false;
        let bytes = sql.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if in_single && bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                in_single = !in_single;
            }
            i += 1;
        }
        in_single
    }

    fn concatenation_marker(sql: &str) -> bool {
        sql.contains("||") || sql.to_ascii_uppercase().contains("CONCAT(")
    }
}

impl Validator for InjectionDetector {
    fn name(&self) -> &'static str {
        "InjectionDetector"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        let Some(raw) = ctx.raw_sql.as_deref() else {
            return ProcessorOutcome::Skipped("no raw SQL to inspect");
        };

        let mut flagged = false;
        if Self::unbalanced_quotes(raw) {
            debug!("InjectionDetector: unbalanced quoting detected");
            ctx.validation.push(Issue::new(
                IssueKind::Injection,
                Verdict::Unsafe,
                Risk::Critical,
                self.name(),
                "unbalanced string quoting in source SQL",
            ));
            flagged = true;
        }
        if !ctx.is_many && !ctx.is_script && ctx.current_ast.as_ref().is_some_and(AstNode::is_script) {
            debug!("InjectionDetector: stacked statements in a single-statement context");
            ctx.validation.push(Issue::new(
                IssueKind::Injection,
                Verdict::Unsafe,
                Risk::Critical,
                self.name(),
                "multiple statements found where exactly one was expected",
            ));
            flagged = true;
        }
        if Self::concatenation_marker(raw) {
            ctx.validation.push(Issue::new(
                IssueKind::Injection,
                Verdict::Warning,
                Risk::Medium,
                self.name(),
                "string concatenation marker found in source SQL",
            ));
            flagged = true;
        }

        if flagged {
            ProcessorOutcome::Ok
        } else {
            ProcessorOutcome::Skipped("no injection indicators found")
        }
    }
}

/// Flags `WHERE`/`ON` predicates that reduce to a constant truth. Severity
/// tracks `strict_mode`: `Unsafe` when strict, `Warning` otherwise — per
/// end-to-end scenario 3, where a strict-mode tautology raises
/// `ValidationFailure`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TautologyDetector;

impl Validator for TautologyDetector {
    fn name(&self) -> &'static str {
        "TautologyDetector"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        let Some(ast) = ctx.current_ast.as_ref() else {
            return ProcessorOutcome::Skipped("no AST");
        };
        if !ast.selection_is_tautology() {
            return ProcessorOutcome::Skipped("no tautological predicate found");
        }
        let severity = if ctx.config.strict_mode {
            Verdict::Unsafe
        } else {
            Verdict::Warning
        };
        ctx.validation.push(Issue::new(
            IssueKind::Tautology,
            severity,
            Risk::High,
            self.name(),
            "predicate reduces to a constant truth",
        ));
        ProcessorOutcome::Ok
    }
}

/// Emits `Unsafe` for DDL statement kinds unless explicitly allow-listed.
/// The allow-list is granular by `ddl_subkind` tag (e.g. permit
/// `create_index` while still rejecting `drop`).
#[derive(Debug, Clone, Default)]
pub struct PreventDDL {
    pub allowed_subkinds: Vec<String>,
}

impl PreventDDL {
    #[must_use]
    pub fn allowing(subkinds: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed_subkinds: subkinds.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for PreventDDL {
    fn name(&self) -> &'static str {
        "PreventDDL"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        let Some(ast) = ctx.current_ast.as_ref() else {
            return ProcessorOutcome::Skipped("no AST");
        };
        let Some(subkind) = ast.ddl_subkind() else {
            return ProcessorOutcome::Skipped("not a DDL statement");
        };
        if self.allowed_subkinds.iter().any(|a| a == subkind) {
            return ProcessorOutcome::Skipped("DDL subkind is allow-listed");
        }
        debug!("PreventDDL: disallowed DDL subkind {subkind}");
        ctx.validation.push(Issue::new(
            IssueKind::DisallowedDdl,
            Verdict::Unsafe,
            Risk::High,
            self.name(),
            format!("DDL operation `{subkind}` is not allow-listed"),
        ));
        ProcessorOutcome::Ok
    }
}

/// Emits a `MissingWhere`/`Tautology` issue for `Update`/`Delete` without a
/// usable `WHERE` clause. Severity tracks `strict_mode` like
/// `TautologyDetector`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskyDml;

impl Validator for RiskyDml {
    fn name(&self) -> &'static str {
        "RiskyDML"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        let Some(ast) = ctx.current_ast.as_ref() else {
            return ProcessorOutcome::Skipped("no AST");
        };
        let severity = if ctx.config.strict_mode {
            Verdict::Unsafe
        } else {
            Verdict::Warning
        };

        if ast.dml_missing_where() {
            ctx.validation.push(Issue::new(
                IssueKind::MissingWhere,
                severity,
                Risk::Medium,
                self.name(),
                "UPDATE/DELETE statement has no WHERE clause",
            ));
            return ProcessorOutcome::Ok;
        }
        if ast.selection_is_tautology() {
            ctx.validation.push(Issue::new(
                IssueKind::RiskyDml,
                severity,
                Risk::Medium,
                self.name(),
                "UPDATE/DELETE predicate reduces to a constant truth",
            ));
            return ProcessorOutcome::Ok;
        }
        ProcessorOutcome::Skipped("no risky DML pattern found")
    }
}

/// Flags file I/O, system functions, and information-schema probing —
/// a dialect-configurable keyword list, matched case-insensitively over
/// each `WHERE`/join-`ON` predicate's rendered text.
#[derive(Debug, Clone)]
pub struct SuspiciousKeywords {
    pub keywords: Vec<String>,
}

impl Default for SuspiciousKeywords {
    fn default() -> Self {
        Self {
            keywords: [
                "LOAD_FILE",
                "INTO OUTFILE",
                "XP_CMDSHELL",
                "INFORMATION_SCHEMA",
                "PG_READ_FILE",
                "UTL_FILE",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

impl Validator for SuspiciousKeywords {
    fn name(&self) -> &'static str {
        "SuspiciousKeywords"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        let Some(ast) = ctx.current_ast.as_ref() else {
            return ProcessorOutcome::Skipped("no AST");
        };
        let haystack = ast.where_conditions().join(" ").to_ascii_uppercase();
        let raw = ctx
            .raw_sql
            .as_deref()
            .map(str::to_ascii_uppercase)
            .unwrap_or_default();

        let hit = self
            .keywords
            .iter()
            .find(|kw| haystack.contains(kw.as_str()) || raw.contains(kw.as_str()));

        let Some(kw) = hit else {
            return ProcessorOutcome::Skipped("no suspicious keyword found");
        };
        ctx.validation.push(Issue::new(
            IssueKind::SuspiciousKeyword,
            Verdict::Warning,
            Risk::Medium,
            self.name(),
            format!("suspicious keyword `{kw}` found in statement"),
        ));
        ProcessorOutcome::Ok
    }
}

/// Emits `Warning` once join count reaches `warn_at`, `Unsafe` once it
/// exceeds `hard_ceiling`.
#[derive(Debug, Clone, Copy)]
pub struct ExcessiveJoins {
    pub warn_at: usize,
    pub hard_ceiling: usize,
}

impl Default for ExcessiveJoins {
    fn default() -> Self {
        Self {
            warn_at: 5,
            hard_ceiling: 10,
        }
    }
}

impl Validator for ExcessiveJoins {
    fn name(&self) -> &'static str {
        "ExcessiveJoins"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        let Some(ast) = ctx.current_ast.as_ref() else {
            return ProcessorOutcome::Skipped("no AST");
        };
        let count = ast.joins().len();
        if count > self.hard_ceiling {
            ctx.validation.push(Issue::new(
                IssueKind::ExcessiveJoins,
                Verdict::Unsafe,
                Risk::High,
                self.name(),
                format!("{count} joins exceeds hard ceiling of {}", self.hard_ceiling),
            ));
            ProcessorOutcome::Ok
        } else if count >= self.warn_at {
            ctx.validation.push(Issue::new(
                IssueKind::ExcessiveJoins,
                Verdict::Warning,
                Risk::Low,
                self.name(),
                format!("{count} joins reaches warning threshold of {}", self.warn_at),
            ));
            ProcessorOutcome::Ok
        } else {
            ProcessorOutcome::Skipped("join count below warning threshold")
        }
    }
}

/// Emits `Warning` when two or more tables appear in `FROM` without any
/// predicate linking them, or an explicit `CROSS JOIN` once the total
/// table count exceeds a configurable threshold.
#[derive(Debug, Clone, Copy)]
pub struct CartesianProductDetector {
    pub cross_join_threshold: usize,
}

impl Default for CartesianProductDetector {
    fn default() -> Self {
        Self {
            cross_join_threshold: 3,
        }
    }
}

impl Validator for CartesianProductDetector {
    fn name(&self) -> &'static str {
        "CartesianProductDetector"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        let Some(ast) = ctx.current_ast.as_ref() else {
            return ProcessorOutcome::Skipped("no AST");
        };
        if !ast.cartesian_risk(self.cross_join_threshold) {
            return ProcessorOutcome::Skipped("no unlinked table combination found");
        }
        ctx.validation.push(Issue::new(
            IssueKind::CartesianProduct,
            Verdict::Warning,
            Risk::Medium,
            self.name(),
            "tables appear in FROM without a linking predicate",
        ));
        ProcessorOutcome::Ok
    }
}
