//! Thin, dialect-aware facade over `sqlparser`. The rest of the pipeline
//! depends on this module's tree shape, never on `sqlparser` directly.

mod dialect;
mod walk;

pub use dialect::DialectTag;

use std::collections::HashSet;

use logging::{debug, warn};
use sqlparser::ast::{
    BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr, Join,
    JoinOperator, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
    Value as SqlValue,
};
use sqlparser::parser::Parser;

use crate::error::{SqlSpecError, SqlSpecResult};
use crate::params::{ParamBag, PlaceholderStyle};
use crate::value::Value;

/// Coarse statement classification, used throughout validation/analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Ddl,
    Script,
    Other,
}

/// Owned wrapper around one or more parsed `sqlparser` statements. A
/// length-1 parse result is the normal case; length > 1 only happens for
/// statements explicitly flagged `is_script`.
#[derive(Debug, Clone)]
pub struct AstNode {
    statements: Vec<Statement>,
    is_script: bool,
}

/// One occurrence of a scalar literal found in an expression position,
/// returned by [`AstNode::literals`] for diagnostics/analysis purposes.
#[derive(Debug, Clone)]
pub struct LiteralOccurrence {
    pub rendered: String,
    pub is_null: bool,
}

/// One join found by [`AstNode::joins`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Other,
}

#[derive(Debug, Clone)]
pub struct JoinInfo {
    pub kind: JoinKind,
    pub has_constraint: bool,
}

/// One subquery found by [`AstNode::subqueries`].
#[derive(Debug, Clone)]
pub struct SubqueryInfo {
    pub depth: u32,
    pub correlated: bool,
}

impl AstNode {
    /// Parses `sql` under `dialect`. Empty input, or input that reduces to
    /// nothing (whitespace/comments only), is a `ParseError`.
    pub fn parse(sql: &str, dialect: DialectTag) -> SqlSpecResult<Self> {
        let parser_dialect = dialect.parser_dialect();
        let statements = Parser::parse_sql(&*parser_dialect, sql).map_err(|e| {
            debug!("parse failure for dialect {dialect:?}: {e}");
            SqlSpecError::ParseError {
                reason: e.to_string(),
            }
        })?;

        if statements.is_empty() {
            return Err(SqlSpecError::ParseError {
                reason: "input contains no statements".to_string(),
            });
        }

        let is_script = statements.len() > 1;
        Ok(Self {
            statements,
            is_script,
        })
    }

    #[must_use]
    pub fn is_script(&self) -> bool {
        self.is_script
    }

    /// Wraps a bare `sqlparser` statement assembled outside of
    /// [`AstNode::parse`] — the query builder's entry point into the rest
    /// of the facade. Always single-statement: a builder never produces a
    /// script.
    #[must_use]
    pub fn from_statement(stmt: Statement) -> Self {
        Self {
            statements: vec![stmt],
            is_script: false,
        }
    }

    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut [Statement] {
        &mut self.statements
    }

    /// Renders the AST back to SQL text under `target_style`. `Static`
    /// requires `params` so literal values can be inlined; other styles
    /// ignore it.
    pub fn render(&self, target_style: PlaceholderStyle, params: Option<&ParamBag>) -> String {
        let mut rendered = self.clone();
        let mut counter = 0usize;

        for stmt in rendered.statements.iter_mut() {
            walk::visit_exprs_mut(stmt, &mut |expr| {
                if let Expr::Value(v) = expr {
                    if let Some(raw) = placeholder_raw(&v.value) {
                        counter += 1;
                        let name = placeholder_name(raw);
                        *expr = render_placeholder(target_style, counter, name.as_deref(), params);
                    }
                }
            });
        }

        rendered
            .statements
            .iter()
            .map(std::string::ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Pre-order walk over every statement's top-level node, giving callers
    /// a chance to inspect/replace each `Statement` wholesale. Finer-grained
    /// expression rewriting goes through the dedicated transformer helpers
    /// below rather than through a generic visitor, to keep the exposed
    /// surface small.
    pub fn walk_statements_mut(&mut self, mut action: impl FnMut(&mut Statement)) {
        for stmt in &mut self.statements {
            action(stmt);
        }
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        if self.is_script {
            return StatementKind::Script;
        }
        self.statements
            .first()
            .map_or(StatementKind::Other, statement_kind)
    }

    #[must_use]
    pub fn tables(&self) -> HashSet<String> {
        let mut out = HashSet::new();
        for stmt in &self.statements {
            collect_tables_statement(stmt, &mut out);
        }
        out
    }

    #[must_use]
    pub fn joins(&self) -> Vec<JoinInfo> {
        let mut out = Vec::new();
        for stmt in &self.statements {
            if let Some(select) = select_of(stmt) {
                for twj in &select.from {
                    for join in &twj.joins {
                        out.push(join_info(join));
                    }
                }
            }
        }
        out
    }

    #[must_use]
    pub fn subqueries(&self) -> Vec<SubqueryInfo> {
        let mut out = Vec::new();
        for stmt in &self.statements {
            if let Some(select) = select_of(stmt) {
                let outer_tables = table_aliases(select);
                collect_subqueries_select(select, 1, &outer_tables, &mut out);
            }
        }
        out
    }

    #[must_use]
    pub fn literals(&self) -> Vec<LiteralOccurrence> {
        let mut out = Vec::new();
        let mut clone = self.clone();
        for stmt in &mut clone.statements {
            walk::visit_exprs_mut(stmt, &mut |expr| {
                if let Expr::Value(v) = expr {
                    if placeholder_raw(&v.value).is_none() {
                        out.push(LiteralOccurrence {
                            rendered: expr.to_string(),
                            is_null: matches!(v.value, SqlValue::Null),
                        });
                    }
                }
            });
        }
        out
    }

    /// Returns the textual rendering of every `WHERE`/join-`ON` predicate
    /// in the AST, for validators that need to inspect raw conditions
    /// (tautology/injection heuristics).
    #[must_use]
    pub fn where_conditions(&self) -> Vec<String> {
        let mut out = Vec::new();
        for stmt in &self.statements {
            match stmt {
                Statement::Query(_) => {
                    if let Some(select) = select_of(stmt) {
                        if let Some(sel) = &select.selection {
                            out.push(sel.to_string());
                        }
                    }
                }
                Statement::Update { selection, .. } => {
                    if let Some(sel) = selection {
                        out.push(sel.to_string());
                    }
                }
                Statement::Delete(d) => {
                    if let Some(sel) = &d.selection {
                        out.push(sel.to_string());
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// All top-level `SELECT` bodies reachable from set operations (not
    /// descending into derived-table subqueries) — the scope
    /// `CartesianProductDetector`/`ExcessiveJoins` operate over.
    #[must_use]
    pub fn selects(&self) -> Vec<&Select> {
        let mut out = Vec::new();
        for stmt in &self.statements {
            if let Statement::Query(q) = stmt {
                collect_selects_set_expr(&q.body, &mut out);
            }
        }
        out
    }

    /// The specific DDL operation, when `kind()` is `Ddl`. Used by
    /// `PreventDDL`'s allow-list, which is granular (e.g. allow
    /// `CreateIndex` but not `Drop`).
    #[must_use]
    pub fn ddl_subkind(&self) -> Option<&'static str> {
        self.statements.first().and_then(|stmt| match stmt {
            Statement::CreateTable(_) => Some("create_table"),
            Statement::CreateView { .. } => Some("create_view"),
            Statement::CreateIndex(_) => Some("create_index"),
            Statement::CreateSchema { .. } => Some("create_schema"),
            Statement::CreateDatabase { .. } => Some("create_database"),
            Statement::AlterTable { .. } => Some("alter_table"),
            Statement::Drop { .. } => Some("drop"),
            Statement::Truncate { .. } => Some("truncate"),
            _ => None,
        })
    }

    /// Whether the top-level statement's `WHERE`/selection predicate
    /// reduces to a constant truth (`1=1`, `'a'='a'`, `TRUE OR ...`).
    #[must_use]
    pub fn selection_is_tautology(&self) -> bool {
        self.statements.first().is_some_and(|stmt| {
            let selection = match stmt {
                Statement::Query(_) => select_of(stmt).and_then(|s| s.selection.as_ref()),
                Statement::Update { selection, .. } => selection.as_ref(),
                Statement::Delete(d) => d.selection.as_ref(),
                _ => None,
            };
            selection.is_some_and(expr_is_constant_true)
        })
    }

    /// Whether the top-level statement is an `UPDATE`/`DELETE` without a
    /// `WHERE` clause.
    #[must_use]
    pub fn dml_missing_where(&self) -> bool {
        self.statements.first().is_some_and(|stmt| match stmt {
            Statement::Update { selection, .. } => selection.is_none(),
            Statement::Delete(d) => d.selection.is_none(),
            _ => false,
        })
    }

    /// Whether the statement carries a `RETURNING` clause.
    #[must_use]
    pub fn has_returning(&self) -> bool {
        self.statements.first().is_some_and(|stmt| match stmt {
            Statement::Insert(ins) => ins.returning.is_some(),
            Statement::Update { returning, .. } => returning.is_some(),
            Statement::Delete(d) => d.returning.is_some(),
            _ => false,
        })
    }

    /// Replaces every literal scalar in an expression position (outside
    /// DDL) with a fresh named placeholder, returning the extracted values
    /// in encounter order. `NULL` literals are left untouched, per the
    /// transformer contract.
    pub fn replace_literals_with_placeholders(&mut self, name_prefix: &str) -> Vec<(String, Value)> {
        let mut extracted = Vec::new();
        let mut counter = 0usize;

        for stmt in &mut self.statements {
            if !is_literal_rewrite_target(stmt) {
                continue;
            }
            walk::visit_exprs_mut(stmt, &mut |expr| {
                if let Expr::Value(v) = expr {
                    if placeholder_raw(&v.value).is_some() {
                        return;
                    }
                    if matches!(v.value, SqlValue::Null) {
                        return;
                    }
                    if let Some(value) = sql_value_to_value(&v.value) {
                        counter += 1;
                        let name = format!("{name_prefix}_{counter}");
                        extracted.push((name.clone(), value));
                        *expr = Expr::Value(sqlparser::ast::ValueWithSpan {
                            value: SqlValue::Placeholder(format!(":{name}")),
                            span: sqlparser::tokenizer::Span::empty(),
                        });
                    }
                }
            });
        }

        extracted
    }

    /// Heuristic cartesian-product risk: two or more tables in a `FROM`
    /// list with no equality predicate linking any pair of them, or an
    /// explicit `CROSS JOIN` once the total table count exceeds
    /// `cross_join_threshold`. Like [`Self::subqueries`]'s correlation
    /// flag, this is a structural approximation, not semantic binding
    /// analysis.
    #[must_use]
    pub fn cartesian_risk(&self, cross_join_threshold: usize) -> bool {
        self.statements.iter().any(|stmt| {
            select_of(stmt).is_some_and(|select| {
                comma_join_cartesian(select) || explicit_cross_join_over_threshold(select, cross_join_threshold)
            })
        })
    }

    /// Every function-call name found in a projection, `WHERE`, `HAVING`,
    /// or `GROUP BY` position of a top-level select (or an `UPDATE`/
    /// `DELETE` predicate/assignment), upper-cased, in encounter order and
    /// not deduplicated. Does not descend into derived-table or scalar
    /// subqueries, matching [`Self::selects`]'s scope.
    #[must_use]
    pub fn function_names(&self) -> Vec<String> {
        self.flattened_root_exprs()
            .into_iter()
            .filter_map(|e| match e {
                Expr::Function(f) => Some(f.name.to_string().to_ascii_uppercase()),
                _ => None,
            })
            .collect()
    }

    /// Every column reference found in the same scope as
    /// [`Self::function_names`]: `(qualifier, name)`, where `qualifier` is
    /// `None` for an unqualified identifier.
    #[must_use]
    pub fn column_refs(&self) -> Vec<(Option<String>, String)> {
        self.flattened_root_exprs()
            .into_iter()
            .filter_map(|e| match e {
                Expr::Identifier(id) => Some((None, id.value.clone())),
                Expr::CompoundIdentifier(parts) if parts.len() >= 2 => Some((
                    Some(parts[0].value.clone()),
                    parts[parts.len() - 1].value.clone(),
                )),
                _ => None,
            })
            .collect()
    }

    fn flattened_root_exprs(&self) -> Vec<&Expr> {
        let mut roots = Vec::new();
        for select in self.selects() {
            select_root_exprs(select, &mut roots);
        }
        for stmt in &self.statements {
            match stmt {
                Statement::Update {
                    assignments,
                    selection,
                    ..
                } => {
                    for a in assignments {
                        roots.push(&a.value);
                    }
                    if let Some(s) = selection {
                        roots.push(s);
                    }
                }
                Statement::Delete(d) => {
                    if let Some(s) = &d.selection {
                        roots.push(s);
                    }
                }
                _ => {}
            }
        }
        let mut flattened = Vec::new();
        for r in roots {
            flatten_expr(r, &mut flattened);
        }
        flattened
    }

    /// Sets (or overwrites) the top-level query's `LIMIT`/`OFFSET`. A
    /// second call overwrites the first — last-write-wins, per the
    /// Open Question 4 resolution for duplicate `LimitOffset` filters.
    /// No-op on a non-`Query` statement.
    pub fn set_limit_offset(&mut self, limit: Option<i64>, offset: Option<i64>) {
        let Some(Statement::Query(q)) = self.statements.first_mut() else {
            return;
        };
        q.limit = limit.map(|n| Expr::Value(sqlparser::ast::ValueWithSpan {
            value: SqlValue::Number(n.to_string(), false),
            span: sqlparser::tokenizer::Span::empty(),
        }));
        q.offset = offset.map(|n| sqlparser::ast::Offset {
            value: Expr::Value(sqlparser::ast::ValueWithSpan {
                value: SqlValue::Number(n.to_string(), false),
                span: sqlparser::tokenizer::Span::empty(),
            }),
            rows: sqlparser::ast::OffsetRows::None,
        });
    }

    /// Appends one `ORDER BY` clause to the top-level query. Non-idempotent
    /// by design: applying twice accumulates two clauses. No-op on a
    /// non-`Query` statement.
    pub fn add_order_by(&mut self, column: &str, descending: bool) {
        let Some(Statement::Query(q)) = self.statements.first_mut() else {
            return;
        };
        let clause = sqlparser::ast::OrderByExpr {
            expr: identifier_expr(column),
            asc: Some(!descending),
            nulls_first: None,
            with_fill: None,
        };
        match &mut q.order_by {
            Some(ob) => match &mut ob.kind {
                sqlparser::ast::OrderByKind::Expressions(exprs) => exprs.push(clause),
                sqlparser::ast::OrderByKind::All(_) => {}
            },
            None => {
                q.order_by = Some(sqlparser::ast::OrderBy {
                    kind: sqlparser::ast::OrderByKind::Expressions(vec![clause]),
                    interpolate: None,
                });
            }
        }
    }

    /// ANDs an `ILIKE`/`LIKE column <placeholder>` predicate onto the
    /// top-level query's `WHERE` clause, for the builder/filter facade's
    /// `Search` filter. Returns `false` (no-op) on a non-`Query` statement.
    /// Non-idempotent: applying twice adds two conditions, per the Open
    /// Question 4 resolution.
    pub fn add_search_predicate(&mut self, column: &str, placeholder_name: &str, case_insensitive: bool) -> bool {
        let Some(Statement::Query(q)) = self.statements.first_mut() else {
            return false;
        };
        let Some(select) = set_expr_select_mut(&mut q.body) else {
            return false;
        };
        let pattern = Expr::Value(sqlparser::ast::ValueWithSpan {
            value: SqlValue::Placeholder(format!(":{placeholder_name}")),
            span: sqlparser::tokenizer::Span::empty(),
        });
        let predicate = if case_insensitive {
            Expr::ILike {
                negated: false,
                expr: Box::new(identifier_expr(column)),
                pattern: Box::new(pattern),
                escape_char: None,
                any: false,
            }
        } else {
            Expr::Like {
                negated: false,
                expr: Box::new(identifier_expr(column)),
                pattern: Box::new(pattern),
                escape_char: None,
                any: false,
            }
        };
        select.selection = Some(match select.selection.take() {
            Some(existing) => Expr::BinaryOp {
                left: Box::new(existing),
                op: BinaryOperator::And,
                right: Box::new(predicate),
            },
            None => predicate,
        });
        true
    }

    /// ANDs an arbitrary predicate onto the top-level query's `WHERE`
    /// clause. Exposed for the query builder's `where_eq`/`where_in`/
    /// `where_between`/`where_exists`. Returns `false` on a non-`Query`
    /// statement.
    pub fn add_predicate(&mut self, expr: Expr) -> bool {
        let Some(Statement::Query(q)) = self.statements.first_mut() else {
            return false;
        };
        let Some(select) = set_expr_select_mut(&mut q.body) else {
            return false;
        };
        select.selection = Some(match select.selection.take() {
            Some(existing) => Expr::BinaryOp {
                left: Box::new(existing),
                op: BinaryOperator::And,
                right: Box::new(expr),
            },
            None => expr,
        });
        true
    }

    /// ANDs an arbitrary predicate onto the top-level query's `HAVING`
    /// clause. Returns `false` on a non-`Query` statement.
    pub fn add_having(&mut self, expr: Expr) -> bool {
        let Some(Statement::Query(q)) = self.statements.first_mut() else {
            return false;
        };
        let Some(select) = set_expr_select_mut(&mut q.body) else {
            return false;
        };
        select.having = Some(match select.having.take() {
            Some(existing) => Expr::BinaryOp {
                left: Box::new(existing),
                op: BinaryOperator::And,
                right: Box::new(expr),
            },
            None => expr,
        });
        true
    }

    /// Overwrites the top-level query's projection list. Returns `false`
    /// on a non-`Query` statement.
    pub fn set_projection(&mut self, columns: &[String]) -> bool {
        let Some(Statement::Query(q)) = self.statements.first_mut() else {
            return false;
        };
        let Some(select) = set_expr_select_mut(&mut q.body) else {
            return false;
        };
        select.projection = columns
            .iter()
            .map(|c| SelectItem::UnnamedExpr(identifier_expr(c)))
            .collect();
        true
    }

    /// Overwrites the top-level query's `GROUP BY` column list. Returns
    /// `false` on a non-`Query` statement.
    pub fn set_group_by(&mut self, columns: &[String]) -> bool {
        let Some(Statement::Query(q)) = self.statements.first_mut() else {
            return false;
        };
        let Some(select) = set_expr_select_mut(&mut q.body) else {
            return false;
        };
        select.group_by = GroupByExpr::Expressions(
            columns.iter().map(|c| identifier_expr(c)).collect(),
            Vec::new(),
        );
        true
    }

    /// Appends a join to the top-level query's first `FROM` item. The
    /// joined table's relation is harvested by parsing a one-table
    /// skeleton under `dialect` rather than hand-assembling
    /// `TableFactor::Table`'s long, version-sensitive field list — a
    /// "parse a trivial fixed shape, then splice" discipline used
    /// elsewhere in this crate (see `sqlspec-builder`'s `from_`/
    /// `where_exists`, which parse their own skeletons the same way)
    /// wherever a fragment would otherwise need to be hand-assembled node
    /// by node. Returns `false` on a non-`Query` statement or if the
    /// skeleton fails to parse.
    pub fn add_join(&mut self, table: &str, kind: JoinKind, on: Expr, dialect: DialectTag) -> bool {
        let Some(Statement::Query(q)) = self.statements.first_mut() else {
            return false;
        };
        let Some(select) = set_expr_select_mut(&mut q.body) else {
            return false;
        };
        let Some(first_from) = select.from.first_mut() else {
            return false;
        };
        let skeleton = format!("SELECT * FROM a JOIN {table} ON 1 = 1");
        let Ok(harvested) = AstNode::parse(&skeleton, dialect) else {
            return false;
        };
        let Some(Statement::Query(hq)) = harvested.statements.first() else {
            return false;
        };
        let Some(SetExpr::Select(hselect)) = Some(hq.body.as_ref()) else {
            return false;
        };
        let Some(mut join) = hselect.from.first().and_then(|f| f.joins.first().cloned()) else {
            return false;
        };
        let constraint = sqlparser::ast::JoinConstraint::On(on);
        join.join_operator = match kind {
            JoinKind::Inner | JoinKind::Other => JoinOperator::Inner(constraint),
            JoinKind::Left => JoinOperator::LeftOuter(constraint),
            JoinKind::Right => JoinOperator::RightOuter(constraint),
            JoinKind::Full => JoinOperator::FullOuter(constraint),
            JoinKind::Cross => JoinOperator::CrossJoin,
        };
        first_from.joins.push(join);
        true
    }

    /// Wraps `subquery` as an `EXISTS (...)` expression for the query
    /// builder's `where_exists`. `subquery` must be a single `Query`
    /// statement; any other shape yields `None`.
    #[must_use]
    pub fn into_exists_expr(self, negated: bool) -> Option<Expr> {
        let Statement::Query(q) = self.statements.into_iter().next()? else {
            return None;
        };
        Some(Expr::Exists { subquery: q, negated })
    }

    /// Strips SQL comments from the rendered text. `sqlparser` does not
    /// retain comment trivia on the AST, so removal happens by re-parsing
    /// a comment-stripped copy of the source text; callers that only ever
    /// go through the facade (never touch raw source after parsing) get
    /// comments removed for free on first render.
    #[must_use]
    pub fn strip_comments(sql: &str) -> String {
        strip_comments_text(sql)
    }

    /// Renames every `:old`/`@old`-shaped placeholder to `new`, keeping the
    /// original sigil. Used by the query builder to resolve a subquery's
    /// parameter names against the parent's registry when the two collide
    /// (re-allocating names on conflict) without
    /// re-parsing anything.
    pub fn rename_placeholder(&mut self, old: &str, new: &str) {
        for stmt in &mut self.statements {
            walk::visit_exprs_mut(stmt, &mut |expr| {
                if let Expr::Value(sqlparser::ast::ValueWithSpan {
                    value: SqlValue::Placeholder(raw),
                    ..
                }) = expr
                {
                    if let Some(renamed) = renamed_placeholder_raw(raw, old, new) {
                        *raw = renamed;
                    }
                }
            });
        }
    }
}

/// Returns the renamed raw placeholder text (`:new`/`@new`) if `raw` is a
/// named placeholder for `old`, preserving whichever sigil `raw` used.
fn renamed_placeholder_raw(raw: &str, old: &str, new: &str) -> Option<String> {
    for sigil in [':', '@'] {
        if raw.strip_prefix(sigil) == Some(old) {
            return Some(format!("{sigil}{new}"));
        }
    }
    None
}

fn is_literal_rewrite_target(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::Query(_) | Statement::Insert(_) | Statement::Update { .. } | Statement::Delete(_)
    )
}

fn placeholder_raw(v: &SqlValue) -> Option<&str> {
    match v {
        SqlValue::Placeholder(raw) => Some(raw),
        _ => None,
    }
}

fn placeholder_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim_start_matches([':', '@']);
    if trimmed == raw || trimmed.is_empty() {
        None
    } else if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn render_placeholder(
    style: PlaceholderStyle,
    counter: usize,
    name: Option<&str>,
    params: Option<&ParamBag>,
) -> Expr {
    let fallback_name = || name.map_or_else(|| counter.to_string(), str::to_string);
    let raw = match style {
        PlaceholderStyle::Qmark => "?".to_string(),
        PlaceholderStyle::NumericDollar => format!("${counter}"),
        PlaceholderStyle::NumericColon => format!(":{counter}"),
        PlaceholderStyle::NamedColon => format!(":{}", fallback_name()),
        PlaceholderStyle::NamedAt => format!("@{}", fallback_name()),
        PlaceholderStyle::PyformatPositional => "%s".to_string(),
        PlaceholderStyle::PyformatNamed => format!("%({})s", fallback_name()),
        PlaceholderStyle::Static => {
            let value = params.and_then(|p| {
                name.and_then(|n| p.by_name(n))
                    .or_else(|| p.by_position(counter))
            });
            let literal = value.map_or_else(
                || SqlValue::Null,
                |slot| value_to_sql_value(&slot.value),
            );
            return Expr::Value(sqlparser::ast::ValueWithSpan {
                value: literal,
                span: sqlparser::tokenizer::Span::empty(),
            });
        }
    };
    Expr::Value(sqlparser::ast::ValueWithSpan {
        value: SqlValue::Placeholder(raw),
        span: sqlparser::tokenizer::Span::empty(),
    })
}

/// Builds a placeholder expression for a freshly-minted parameter slot.
/// Named slots render as `:name`-shaped placeholders so a later style
/// conversion recovers the name; unnamed slots render as bare `?`.
/// Exposed for the query builder, which assembles AST fragments directly
/// instead of going through [`AstNode::parse`].
#[must_use]
pub fn placeholder_expr(name: Option<&str>) -> Expr {
    let raw = name.map_or_else(|| "?".to_string(), |n| format!(":{n}"));
    Expr::Value(sqlparser::ast::ValueWithSpan {
        value: SqlValue::Placeholder(raw),
        span: sqlparser::tokenizer::Span::empty(),
    })
}

/// Builds a column reference expression, splitting on `.` for qualified
/// columns. Exposed for the query builder.
#[must_use]
pub fn column_expr(column: &str) -> Expr {
    identifier_expr(column)
}

/// Builds a literal value expression. Exposed for the query builder,
/// which never emits literals for bound values but does need them for
/// structural pieces (e.g. the upper bound of a generated range).
#[must_use]
pub fn literal_expr(value: &Value) -> Expr {
    Expr::Value(sqlparser::ast::ValueWithSpan {
        value: value_to_sql_value(value),
        span: sqlparser::tokenizer::Span::empty(),
    })
}

fn value_to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Boolean(*b),
        Value::Int(i) => SqlValue::Number(i.to_string(), false),
        Value::Float(f) => SqlValue::Number(f.to_string(), false),
        Value::Decimal(d) => SqlValue::Number(d.to_string(), false),
        Value::String(s) => SqlValue::SingleQuotedString(s.clone()),
        Value::Bytes(b) => SqlValue::HexStringLiteral(b.iter().map(|x| format!("{x:02x}")).collect()),
        Value::DateTime(dt) => SqlValue::SingleQuotedString(dt.to_string()),
        Value::Date(d) => SqlValue::SingleQuotedString(d.to_string()),
        Value::Time(t) => SqlValue::SingleQuotedString(t.to_string()),
        Value::Uuid(u) => SqlValue::SingleQuotedString(u.to_string()),
        Value::Json(j) => SqlValue::SingleQuotedString(j.to_string()),
    }
}

fn sql_value_to_value(v: &SqlValue) -> Option<Value> {
    match v {
        SqlValue::Null => Some(Value::Null),
        SqlValue::Boolean(b) => Some(Value::Bool(*b)),
        SqlValue::Number(n, _) => {
            if let Ok(i) = n.parse::<i64>() {
                Some(Value::Int(i))
            } else {
                n.parse::<f64>().ok().map(Value::Float)
            }
        }
        SqlValue::SingleQuotedString(s)
        | SqlValue::DoubleQuotedString(s)
        | SqlValue::EscapedStringLiteral(s)
        | SqlValue::NationalStringLiteral(s) => Some(Value::String(s.clone())),
        _ => None,
    }
}

fn statement_kind(stmt: &Statement) -> StatementKind {
    match stmt {
        Statement::Query(_) => StatementKind::Select,
        Statement::Insert(_) => StatementKind::Insert,
        Statement::Update { .. } => StatementKind::Update,
        Statement::Delete(_) => StatementKind::Delete,
        Statement::Merge { .. } => StatementKind::Merge,
        Statement::CreateTable(_)
        | Statement::CreateView { .. }
        | Statement::CreateIndex(_)
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::AlterTable { .. }
        | Statement::Drop { .. }
        | Statement::Truncate { .. } => StatementKind::Ddl,
        _ => StatementKind::Other,
    }
}

fn collect_selects_set_expr<'a>(se: &'a SetExpr, out: &mut Vec<&'a Select>) {
    match se {
        SetExpr::Select(s) => out.push(s),
        SetExpr::Query(q) => collect_selects_set_expr(&q.body, out),
        SetExpr::SetOperation { left, right, .. } => {
            collect_selects_set_expr(left, out);
            collect_selects_set_expr(right, out);
        }
        _ => {}
    }
}

/// Recursive tautology check: constant-`TRUE` literal, an equality between
/// two syntactically identical operands, or a disjunction where either
/// side is already constant-true.
fn expr_is_constant_true(expr: &Expr) -> bool {
    match expr {
        Expr::Value(v) => matches!(v.value, SqlValue::Boolean(true)),
        Expr::Nested(inner) => expr_is_constant_true(inner),
        Expr::BinaryOp { left, op, right } => match op {
            BinaryOperator::Eq => left.to_string() == right.to_string(),
            BinaryOperator::Or => expr_is_constant_true(left) || expr_is_constant_true(right),
            _ => false,
        },
        _ => false,
    }
}

fn comma_join_cartesian(select: &Select) -> bool {
    if select.from.len() < 2 {
        return false;
    }
    let tables = table_aliases(select);
    if tables.len() < 2 {
        return false;
    }
    let mut clauses = Vec::new();
    if let Some(sel) = &select.selection {
        collect_and_clauses(sel, &mut clauses);
    }
    !clauses.iter().any(|c| is_cross_table_equality(c, &tables))
}

fn collect_and_clauses<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    if let Expr::BinaryOp {
        left,
        op: BinaryOperator::And,
        right,
    } = expr
    {
        collect_and_clauses(left, out);
        collect_and_clauses(right, out);
    } else {
        out.push(expr);
    }
}

fn is_cross_table_equality(expr: &Expr, tables: &HashSet<String>) -> bool {
    let Expr::BinaryOp {
        left,
        op: BinaryOperator::Eq,
        right,
    } = expr
    else {
        return false;
    };
    let (Expr::CompoundIdentifier(l), Expr::CompoundIdentifier(r)) = (left.as_ref(), right.as_ref()) else {
        return false;
    };
    if l.len() < 2 || r.len() < 2 {
        return false;
    }
    let lq = &l[0].value;
    let rq = &r[0].value;
    lq != rq && tables.contains(lq) && tables.contains(rq)
}

fn explicit_cross_join_over_threshold(select: &Select, threshold: usize) -> bool {
    let total_tables =
        select.from.len() + select.from.iter().map(|t| t.joins.len()).sum::<usize>();
    let has_cross = select
        .from
        .iter()
        .any(|twj| twj.joins.iter().any(|j| matches!(j.join_operator, JoinOperator::CrossJoin)));
    has_cross && total_tables > threshold
}

fn select_root_exprs<'a>(select: &'a Select, out: &mut Vec<&'a Expr>) {
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => out.push(e),
            _ => {}
        }
    }
    if let Some(sel) = &select.selection {
        out.push(sel);
    }
    if let Some(having) = &select.having {
        out.push(having);
    }
    if let GroupByExpr::Expressions(exprs, _) = &select.group_by {
        for e in exprs {
            out.push(e);
        }
    }
}

/// Pre-order flattening of one expression tree, covering the same
/// recursive shapes as `walk::visit_expr_mut` but read-only and including
/// every node (not just `Expr::Value`), since callers here need to inspect
/// function calls and identifiers rather than rewrite literals.
fn flatten_expr<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    out.push(expr);
    match expr {
        Expr::BinaryOp { left, right, .. } => {
            flatten_expr(left, out);
            flatten_expr(right, out);
        }
        Expr::UnaryOp { expr: e, .. } | Expr::Nested(e) | Expr::Cast { expr: e, .. } => {
            flatten_expr(e, out);
        }
        Expr::Between {
            expr: e, low, high, ..
        } => {
            flatten_expr(e, out);
            flatten_expr(low, out);
            flatten_expr(high, out);
        }
        Expr::InList { expr: e, list, .. } => {
            flatten_expr(e, out);
            for x in list {
                flatten_expr(x, out);
            }
        }
        Expr::Like {
            expr: e, pattern, ..
        }
        | Expr::ILike {
            expr: e, pattern, ..
        } => {
            flatten_expr(e, out);
            flatten_expr(pattern, out);
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(o) = operand {
                flatten_expr(o, out);
            }
            for case_when in conditions {
                flatten_expr(&case_when.condition, out);
                flatten_expr(&case_when.result, out);
            }
            if let Some(e) = else_result {
                flatten_expr(e, out);
            }
        }
        Expr::Function(func) => {
            if let FunctionArguments::List(list) = &func.args {
                for arg in &list.args {
                    let e = match arg {
                        FunctionArg::Named {
                            arg: FunctionArgExpr::Expr(e),
                            ..
                        }
                        | FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => Some(e),
                        _ => None,
                    };
                    if let Some(e) = e {
                        flatten_expr(e, out);
                    }
                }
            }
        }
        Expr::Tuple(items) => {
            for e in items {
                flatten_expr(e, out);
            }
        }
        _ => {}
    }
}

fn select_of(stmt: &Statement) -> Option<&Select> {
    let Statement::Query(q) = stmt else {
        return None;
    };
    set_expr_select(&q.body)
}

fn set_expr_select(se: &SetExpr) -> Option<&Select> {
    match se {
        SetExpr::Select(s) => Some(s),
        SetExpr::Query(q) => set_expr_select(&q.body),
        _ => None,
    }
}

fn set_expr_select_mut(se: &mut SetExpr) -> Option<&mut Select> {
    match se {
        SetExpr::Select(s) => Some(s),
        SetExpr::Query(q) => set_expr_select_mut(&mut q.body),
        _ => None,
    }
}

fn identifier_expr(column: &str) -> Expr {
    if let Some((qualifier, name)) = column.split_once('.') {
        Expr::CompoundIdentifier(vec![
            sqlparser::ast::Ident::new(qualifier),
            sqlparser::ast::Ident::new(name),
        ])
    } else {
        Expr::Identifier(sqlparser::ast::Ident::new(column))
    }
}

fn join_info(join: &Join) -> JoinInfo {
    let (kind, has_constraint) = match &join.join_operator {
        JoinOperator::Inner(c) => (JoinKind::Inner, constraint_present(c)),
        JoinOperator::LeftOuter(c) => (JoinKind::Left, constraint_present(c)),
        JoinOperator::RightOuter(c) => (JoinKind::Right, constraint_present(c)),
        JoinOperator::FullOuter(c) => (JoinKind::Full, constraint_present(c)),
        JoinOperator::CrossJoin => (JoinKind::Cross, false),
        _ => (JoinKind::Other, false),
    };
    JoinInfo { kind, has_constraint }
}

fn constraint_present(c: &sqlparser::ast::JoinConstraint) -> bool {
    !matches!(c, sqlparser::ast::JoinConstraint::None)
}

fn collect_tables_statement(stmt: &Statement, out: &mut HashSet<String>) {
    match stmt {
        Statement::Query(q) => collect_tables_query(q, out),
        Statement::Insert(ins) => {
            out.insert(ins.table_name.to_string());
            if let Some(q) = &ins.source {
                collect_tables_query(q, out);
            }
        }
        Statement::Update { table, from, .. } => {
            collect_tables_factor(&table.relation, out);
            if let Some(from) = from {
                for twj in from_kind_ref(from) {
                    collect_tables_twj(twj, out);
                }
            }
        }
        Statement::Delete(d) => {
            for t in &d.tables {
                out.insert(t.to_string());
            }
            if let sqlparser::ast::FromTable::WithFromKeyword(twjs)
            | sqlparser::ast::FromTable::WithoutKeyword(twjs) = &d.from
            {
                for twj in twjs {
                    collect_tables_twj(twj, out);
                }
            }
        }
        _ => {}
    }
}

fn from_kind_ref(from: &sqlparser::ast::UpdateTableFromKind) -> &Vec<TableWithJoins> {
    match from {
        sqlparser::ast::UpdateTableFromKind::BeforeSet(v)
        | sqlparser::ast::UpdateTableFromKind::AfterSet(v) => v,
    }
}

fn collect_tables_query(q: &sqlparser::ast::Query, out: &mut HashSet<String>) {
    if let Some(with) = &q.with {
        for cte in &with.cte_tables {
            collect_tables_query(&cte.query, out);
        }
    }
    collect_tables_set_expr(&q.body, out);
}

fn collect_tables_set_expr(se: &SetExpr, out: &mut HashSet<String>) {
    match se {
        SetExpr::Select(s) => {
            for twj in &s.from {
                collect_tables_twj(twj, out);
            }
        }
        SetExpr::Query(q) => collect_tables_query(q, out),
        SetExpr::SetOperation { left, right, .. } => {
            collect_tables_set_expr(left, out);
            collect_tables_set_expr(right, out);
        }
        _ => {}
    }
}

fn collect_tables_twj(twj: &TableWithJoins, out: &mut HashSet<String>) {
    collect_tables_factor(&twj.relation, out);
    for j in &twj.joins {
        collect_tables_factor(&j.relation, out);
    }
}

fn collect_tables_factor(tf: &TableFactor, out: &mut HashSet<String>) {
    match tf {
        TableFactor::Table { name, .. } => {
            out.insert(name.to_string());
        }
        TableFactor::Derived { subquery, .. } => collect_tables_query(subquery, out),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => collect_tables_twj(table_with_joins, out),
        _ => {}
    }
}

fn table_aliases(select: &Select) -> HashSet<String> {
    let mut out = HashSet::new();
    for twj in &select.from {
        alias_of(&twj.relation, &mut out);
        for j in &twj.joins {
            alias_of(&j.relation, &mut out);
        }
    }
    out
}

fn alias_of(tf: &TableFactor, out: &mut HashSet<String>) {
    match tf {
        TableFactor::Table { name, alias, .. } => {
            out.insert(alias.as_ref().map_or_else(|| name.to_string(), |a| a.name.value.clone()));
        }
        TableFactor::Derived { alias, .. } => {
            if let Some(a) = alias {
                out.insert(a.name.value.clone());
            }
        }
        _ => {}
    }
}

fn collect_subqueries_select(
    select: &Select,
    depth: u32,
    outer_tables: &HashSet<String>,
    out: &mut Vec<SubqueryInfo>,
) {
    for item in &select.projection {
        let expr = match item {
            SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => Some(e),
            _ => None,
        };
        if let Some(e) = expr {
            collect_subqueries_expr(e, depth, outer_tables, out);
        }
    }
    if let Some(sel) = &select.selection {
        collect_subqueries_expr(sel, depth, outer_tables, out);
    }
    if let Some(having) = &select.having {
        collect_subqueries_expr(having, depth, outer_tables, out);
    }
    for twj in &select.from {
        if let TableFactor::Derived { subquery, .. } = &twj.relation {
            if let Some(inner) = set_expr_select(&subquery.body) {
                let inner_tables = table_aliases(inner);
                let correlated = references_outer(inner, outer_tables);
                out.push(SubqueryInfo {
                    depth,
                    correlated,
                });
                collect_subqueries_select(inner, depth + 1, &inner_tables, out);
            }
        }
    }
}

fn collect_subqueries_expr(
    expr: &Expr,
    depth: u32,
    outer_tables: &HashSet<String>,
    out: &mut Vec<SubqueryInfo>,
) {
    match expr {
        Expr::Subquery(q) | Expr::InSubquery { subquery: q, .. } | Expr::Exists { subquery: q, .. } => {
            if let Some(inner) = set_expr_select(&q.body) {
                let correlated = references_outer(inner, outer_tables);
                out.push(SubqueryInfo { depth, correlated });
                let inner_tables = table_aliases(inner);
                collect_subqueries_select(inner, depth + 1, &inner_tables, out);
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_subqueries_expr(left, depth, outer_tables, out);
            collect_subqueries_expr(right, depth, outer_tables, out);
        }
        Expr::Nested(e) | Expr::UnaryOp { expr: e, .. } => {
            collect_subqueries_expr(e, depth, outer_tables, out);
        }
        _ => {}
    }
}

/// Heuristic correlation check: does the subquery's `WHERE` reference a
/// qualified column whose table isn't one of the subquery's own tables?
/// This is an approximation, not full semantic binding resolution — the
/// pipeline explicitly delegates full correctness to the parser/engine.
fn references_outer(select: &Select, outer_tables: &HashSet<String>) -> bool {
    let own_tables = table_aliases(select);
    let mut found = false;
    if let Some(sel) = &select.selection {
        find_qualified_outer_ref(sel, &own_tables, outer_tables, &mut found);
    }
    found
}

fn find_qualified_outer_ref(
    expr: &Expr,
    own_tables: &HashSet<String>,
    outer_tables: &HashSet<String>,
    found: &mut bool,
) {
    match expr {
        Expr::CompoundIdentifier(parts) if parts.len() >= 2 => {
            let qualifier = parts[0].value.clone();
            if outer_tables.contains(&qualifier) && !own_tables.contains(&qualifier) {
                *found = true;
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            find_qualified_outer_ref(left, own_tables, outer_tables, found);
            find_qualified_outer_ref(right, own_tables, outer_tables, found);
        }
        Expr::Nested(e) | Expr::UnaryOp { expr: e, .. } => {
            find_qualified_outer_ref(e, own_tables, outer_tables, found);
        }
        _ => {}
    }
}

/// Comment-stripping used by the `CommentRemover` transformer. Honors
/// quoting so `--`/`/* */` inside string literals is preserved.
fn strip_comments_text(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0usize;

    #[derive(PartialEq)]
    enum Mode {
        Code,
        SingleQuoted,
        DoubleQuoted,
        LineComment,
        BlockComment,
    }
    let mut mode = Mode::Code;

    while i < bytes.len() {
        let c = bytes[i];
        match mode {
            Mode::SingleQuoted => {
                out.push(c as char);
                if c == b'\'' {
                    if bytes.get(i + 1) == Some(&b'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    mode = Mode::Code;
                }
                i += 1;
            }
            Mode::DoubleQuoted => {
                out.push(c as char);
                if c == b'"' {
                    mode = Mode::Code;
                }
                i += 1;
            }
            Mode::LineComment => {
                if c == b'\n' {
                    mode = Mode::Code;
                    out.push('\n');
                }
                i += 1;
            }
            Mode::BlockComment => {
                if c == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    i += 2;
                    mode = Mode::Code;
                } else {
                    i += 1;
                }
            }
            Mode::Code => {
                if c == b'\'' {
                    mode = Mode::SingleQuoted;
                    out.push('\'');
                    i += 1;
                } else if c == b'"' {
                    mode = Mode::DoubleQuoted;
                    out.push('"');
                    i += 1;
                } else if c == b'-' && bytes.get(i + 1) == Some(&b'-') {
                    mode = Mode::LineComment;
                    i += 2;
                } else if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
                    mode = Mode::BlockComment;
                    i += 2;
                } else {
                    out.push(c as char);
                    i += 1;
                }
            }
        }
    }
    if mode == Mode::BlockComment {
        warn!("unterminated block comment while stripping comments");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamSlot;
    use crate::params::ParamOrigin;

    #[test]
    fn parses_simple_select() {
        let ast = AstNode::parse("SELECT 1", DialectTag::Postgres).unwrap();
        assert_eq!(ast.kind(), StatementKind::Select);
        assert!(!ast.is_script());
    }

    #[test]
    fn empty_sql_is_parse_error() {
        assert!(AstNode::parse("", DialectTag::Postgres).is_err());
        assert!(AstNode::parse("   ", DialectTag::Postgres).is_err());
    }

    #[test]
    fn whitespace_and_comment_only_is_parse_error() {
        assert!(AstNode::parse("-- just a comment\n  ", DialectTag::Postgres).is_err());
    }

    #[test]
    fn tables_extracts_from_clause() {
        let ast = AstNode::parse(
            "SELECT * FROM users u JOIN orders o ON u.id = o.user_id",
            DialectTag::Postgres,
        )
        .unwrap();
        let tables = ast.tables();
        assert!(tables.contains("users"));
        assert!(tables.contains("orders"));
    }

    #[test]
    fn cartesian_join_has_no_constraint() {
        let ast = AstNode::parse("SELECT * FROM a, b WHERE a.x = 1", DialectTag::Postgres).unwrap();
        // comma join surfaces as two from-items, not a `Join`; exercised
        // fully by the CartesianProductDetector validator tests instead.
        assert!(ast.joins().is_empty());
    }

    #[test]
    fn cartesian_risk_flags_unlinked_comma_join() {
        let ast = AstNode::parse("SELECT * FROM a, b WHERE a.x = 1", DialectTag::Postgres).unwrap();
        assert!(ast.cartesian_risk(10));
    }

    #[test]
    fn cartesian_risk_clears_with_linking_predicate() {
        let ast =
            AstNode::parse("SELECT * FROM a, b WHERE a.id = b.a_id", DialectTag::Postgres).unwrap();
        assert!(!ast.cartesian_risk(10));
    }

    #[test]
    fn literal_extraction_round_trips_values() {
        let mut ast =
            AstNode::parse("SELECT * FROM users WHERE id = 7 AND name = 'Ada'", DialectTag::Postgres)
                .unwrap();
        let extracted = ast.replace_literals_with_placeholders("p");
        assert_eq!(extracted.len(), 2);
        assert_eq!(extracted[0].1, Value::Int(7));
        assert_eq!(extracted[1].1, Value::String("Ada".to_string()));
    }

    #[test]
    fn null_literal_is_not_extracted() {
        let mut ast =
            AstNode::parse("SELECT * FROM t WHERE deleted_at IS NULL", DialectTag::Postgres).unwrap();
        let extracted = ast.replace_literals_with_placeholders("p");
        assert!(extracted.is_empty());
    }

    #[test]
    fn render_static_inlines_values() {
        let ast = AstNode::parse("SELECT * FROM t WHERE id = :id", DialectTag::Postgres).unwrap();
        let mut bag = ParamBag::new();
        bag.push(ParamSlot::new(
            Some("id".to_string()),
            1,
            Value::Int(42),
            ParamOrigin::User,
        ));
        let rendered = ast.render(PlaceholderStyle::Static, Some(&bag));
        assert!(rendered.contains("42"));
    }

    #[test]
    fn render_numeric_dollar_numbers_sequentially() {
        let ast = AstNode::parse(
            "SELECT * FROM t WHERE a = ? AND b = ?",
            DialectTag::Postgres,
        )
        .unwrap();
        let rendered = ast.render(PlaceholderStyle::NumericDollar, None);
        assert!(rendered.contains("$1"));
        assert!(rendered.contains("$2"));
    }

    #[test]
    fn rename_placeholder_preserves_sigil() {
        let mut ast = AstNode::parse("SELECT * FROM t WHERE a = :id", DialectTag::Postgres).unwrap();
        ast.rename_placeholder("id", "id_1");
        let rendered = ast.render(PlaceholderStyle::NamedColon, None);
        assert!(rendered.contains(":id_1"));
        assert!(!rendered.contains(":id "));
    }

    #[test]
    fn rename_placeholder_ignores_non_matching_names() {
        let mut ast = AstNode::parse("SELECT * FROM t WHERE a = :id", DialectTag::Postgres).unwrap();
        ast.rename_placeholder("other", "other_1");
        let rendered = ast.render(PlaceholderStyle::NamedColon, None);
        assert!(rendered.contains(":id"));
    }
}
