//! Fluent construction of `Select` AST fragments, grounded in the same
//! "parse a trivial fixed shape, then splice" discipline `AstNode::add_join`
//! already uses for comment removal and join harvesting: a builder never
//! hand-assembles `sqlparser`'s long, version-sensitive table/select field
//! lists, it parses a one-table skeleton and rewrites it through the AST
//! facade from there.

use std::collections::HashSet;
use std::sync::Arc;

use logging::warn;
use sqlparser::ast::{BinaryOperator, Expr};

use sqlspec_core::ast::{self, AstNode, DialectTag, JoinKind};
use sqlspec_core::config::StatementConfig;
use sqlspec_core::error::{SqlSpecError, SqlSpecResult};
use sqlspec_core::filter::OrderClause;
use sqlspec_core::params::{ParamBag, ParamOrigin, ParamSlot, allocate};
use sqlspec_core::statement::Statement;
use sqlspec_core::value::Value;

/// An AST rewrite recorded before a `FROM` target exists yet, so method
/// order (`where_eq` before `from_`, say) doesn't matter. Drained onto the
/// real AST as soon as `from_` establishes one.
enum PendingOp {
    Predicate(Expr),
    Having(Expr),
    Join {
        table: String,
        kind: JoinKind,
        on: Expr,
    },
}

fn apply_pending(ast: &mut AstNode, op: PendingOp, dialect: DialectTag) {
    match op {
        PendingOp::Predicate(expr) => {
            ast.add_predicate(expr);
        }
        PendingOp::Having(expr) => {
            ast.add_having(expr);
        }
        PendingOp::Join { table, kind, on } => {
            ast.add_join(&table, kind, on, dialect);
        }
    }
}

/// Fluent query builder. Operates on a private AST-in-progress
/// and a private parameter registry; `build()` materializes a
/// [`Statement`] whose `ast_seed` is the constructed AST, skipping the
/// parse stage entirely.
pub struct QueryBuilder {
    dialect: DialectTag,
    projection: Vec<String>,
    ast: Option<AstNode>,
    pending: Vec<PendingOp>,
    group_by: Vec<String>,
    order_by: Vec<OrderClause>,
    limit: Option<i64>,
    offset: Option<i64>,
    params: ParamBag,
    taken: HashSet<String>,
    config: Arc<StatementConfig>,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(dialect: DialectTag) -> Self {
        Self {
            dialect,
            projection: Vec::new(),
            ast: None,
            pending: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            params: ParamBag::new(),
            taken: HashSet::new(),
            config: Arc::new(StatementConfig::with_builtin_defaults()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Arc<StatementConfig>) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = columns.into_iter().map(Into::into).collect();
        if let Some(ast) = self.ast.as_mut() {
            ast.set_projection(&self.projection);
        }
        self
    }

    /// Establishes the query's `FROM` target. Parses a `SELECT <cols> FROM
    /// <table>` skeleton under the builder's dialect and replays any
    /// predicate/join calls made before this one. A malformed table
    /// reference is logged and leaves the builder without an AST, so
    /// `build()` surfaces the failure instead of panicking mid-chain.
    #[must_use]
    pub fn from_(mut self, table: impl Into<String>) -> Self {
        let table = table.into();
        let proj = if self.projection.is_empty() {
            "*".to_string()
        } else {
            self.projection.join(", ")
        };
        let skeleton = format!("SELECT {proj} FROM {table}");
        match AstNode::parse(&skeleton, self.dialect) {
            Ok(mut ast) => {
                for op in self.pending.drain(..) {
                    apply_pending(&mut ast, op, self.dialect);
                }
                self.ast = Some(ast);
            }
            Err(e) => {
                warn!("sqlspec-builder: could not build base query over `{table}`: {e}");
            }
        }
        self
    }

    fn alloc_name(&mut self, prefix: &str) -> String {
        let name = allocate(prefix, &self.taken);
        self.taken.insert(name.clone());
        name
    }

    fn push_param(&mut self, name: Option<String>, value: Value) {
        let position = self.params.len() + 1;
        self.params
            .push(ParamSlot::new(name, position, value, ParamOrigin::User));
    }

    fn apply_or_queue(&mut self, op: PendingOp) {
        match self.ast.as_mut() {
            Some(ast) => apply_pending(ast, op, self.dialect),
            None => self.pending.push(op),
        }
    }

    #[must_use]
    pub fn where_eq(mut self, column: impl Into<String>, value: Value) -> Self {
        let column = column.into();
        let name = self.alloc_name(&format!("{column}_eq"));
        let expr = Expr::BinaryOp {
            left: Box::new(ast::column_expr(&column)),
            op: BinaryOperator::Eq,
            right: Box::new(ast::placeholder_expr(Some(&name))),
        };
        self.push_param(Some(name), value);
        self.apply_or_queue(PendingOp::Predicate(expr));
        self
    }

    /// Allocates one placeholder per element of `values`.
    #[must_use]
    pub fn where_in(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        let column = column.into();
        let mut list = Vec::with_capacity(values.len());
        for value in values {
            let name = self.alloc_name(&format!("{column}_in"));
            list.push(ast::placeholder_expr(Some(&name)));
            self.push_param(Some(name), value);
        }
        let expr = Expr::InList {
            expr: Box::new(ast::column_expr(&column)),
            list,
            negated: false,
        };
        self.apply_or_queue(PendingOp::Predicate(expr));
        self
    }

    #[must_use]
    pub fn where_between(mut self, column: impl Into<String>, low: Value, high: Value) -> Self {
        let column = column.into();
        let low_name = self.alloc_name(&format!("{column}_low"));
        let high_name = self.alloc_name(&format!("{column}_high"));
        let expr = Expr::Between {
            expr: Box::new(ast::column_expr(&column)),
            negated: false,
            low: Box::new(ast::placeholder_expr(Some(&low_name))),
            high: Box::new(ast::placeholder_expr(Some(&high_name))),
        };
        self.push_param(Some(low_name), low);
        self.push_param(Some(high_name), high);
        self.apply_or_queue(PendingOp::Predicate(expr));
        self
    }

    /// Builds `subquery` to completion and wraps it as `EXISTS (...)` (or
    /// `NOT EXISTS` when `negated`). The subquery's parameter registry is
    /// merged into this builder's: any name already taken here is
    /// re-allocated, and the subquery's placeholders are rewritten in
    /// place to match, re-allocating names on conflict.
    #[must_use]
    pub fn where_exists(mut self, subquery: Self, negated: bool) -> Self {
        match subquery.build_fragment() {
            Ok((mut sub_ast, sub_params)) => {
                let mut renamed = Vec::with_capacity(sub_params.len());
                for slot in sub_params.slots() {
                    let mut slot = slot.clone();
                    if let Some(name) = slot.name.clone() {
                        if self.taken.contains(&name) {
                            let fresh = allocate(&name, &self.taken);
                            sub_ast.rename_placeholder(&name, &fresh);
                            self.taken.insert(fresh.clone());
                            slot.name = Some(fresh);
                        } else {
                            self.taken.insert(name);
                        }
                    }
                    renamed.push(slot);
                }
                match sub_ast.into_exists_expr(negated) {
                    Some(expr) => {
                        let base = self.params.len();
                        for (i, slot) in renamed.into_iter().enumerate() {
                            self.params.push(ParamSlot::new(
                                slot.name,
                                base + i + 1,
                                slot.value,
                                slot.origin,
                            ));
                        }
                        self.apply_or_queue(PendingOp::Predicate(expr));
                    }
                    None => warn!(
                        "sqlspec-builder: where_exists subquery did not resolve to a query"
                    ),
                }
            }
            Err(e) => {
                warn!("sqlspec-builder: failed to build where_exists subquery: {e}");
            }
        }
        self
    }

    #[must_use]
    pub fn join(
        mut self,
        table: impl Into<String>,
        kind: JoinKind,
        left_column: impl Into<String>,
        right_column: impl Into<String>,
    ) -> Self {
        let on = Expr::BinaryOp {
            left: Box::new(ast::column_expr(&left_column.into())),
            op: BinaryOperator::Eq,
            right: Box::new(ast::column_expr(&right_column.into())),
        };
        self.apply_or_queue(PendingOp::Join {
            table: table.into(),
            kind,
            on,
        });
        self
    }

    #[must_use]
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn having_eq(mut self, column: impl Into<String>, value: Value) -> Self {
        let column = column.into();
        let name = self.alloc_name(&format!("{column}_having"));
        let expr = Expr::BinaryOp {
            left: Box::new(ast::column_expr(&column)),
            op: BinaryOperator::Eq,
            right: Box::new(ast::placeholder_expr(Some(&name))),
        };
        self.push_param(Some(name), value);
        self.apply_or_queue(PendingOp::Having(expr));
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.order_by.push(OrderClause {
            column: column.into(),
            descending,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    #[must_use]
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    fn build_fragment(mut self) -> SqlSpecResult<(AstNode, ParamBag)> {
        let mut ast = self.ast.take().ok_or_else(|| SqlSpecError::ParseError {
            reason: "query builder has no FROM target".to_string(),
        })?;
        for op in self.pending.drain(..) {
            apply_pending(&mut ast, op, self.dialect);
        }
        if !self.group_by.is_empty() {
            ast.set_group_by(&self.group_by);
        }
        for clause in &self.order_by {
            ast.add_order_by(&clause.column, clause.descending);
        }
        if self.limit.is_some() || self.offset.is_some() {
            ast.set_limit_offset(self.limit, self.offset);
        }
        let mut params = self.params;
        params.compact();
        Ok((ast, params))
    }

    /// Materializes a [`Statement`] whose seed AST is the constructed
    /// query and whose initial parameters are the accumulated registry.
    /// `input_had_placeholders` is always `true` on the result.
    pub fn build(self) -> SqlSpecResult<Statement> {
        let dialect = self.dialect;
        let config = Arc::clone(&self.config);
        let (ast, params) = self.build_fragment()?;
        Ok(Statement::from_ast(ast, params, config, dialect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlspec_core::params::PlaceholderStyle;

    #[test]
    fn select_from_where_eq_renders_one_placeholder() {
        let stmt = QueryBuilder::new(DialectTag::Postgres)
            .select(["id", "name"])
            .from_("users")
            .where_eq("active", Value::Bool(true))
            .build()
            .unwrap();
        let sql = stmt.sql_for(PlaceholderStyle::NumericDollar).unwrap();
        assert!(sql.contains("FROM users"));
        assert!(sql.contains("$1"));
        assert_eq!(stmt.parameters().unwrap().len(), 1);
    }

    #[test]
    fn where_in_allocates_one_placeholder_per_element() {
        let stmt = QueryBuilder::new(DialectTag::Postgres)
            .from_("users")
            .where_in(
                "id",
                vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            )
            .build()
            .unwrap();
        assert_eq!(stmt.parameters().unwrap().len(), 3);
    }

    #[test]
    fn where_exists_merges_subquery_parameters() {
        let sub = QueryBuilder::new(DialectTag::Postgres)
            .select(["1"])
            .from_("orders")
            .where_eq("user_id", Value::Int(1));
        let stmt = QueryBuilder::new(DialectTag::Postgres)
            .from_("users")
            .where_exists(sub, false)
            .build()
            .unwrap();
        let sql = stmt.sql_for(PlaceholderStyle::NumericDollar).unwrap();
        assert!(sql.contains("EXISTS"));
        assert_eq!(stmt.parameters().unwrap().len(), 1);
    }

    #[test]
    fn where_exists_renames_on_name_collision() {
        let sub = QueryBuilder::new(DialectTag::Postgres)
            .select(["1"])
            .from_("orders")
            .where_eq("id", Value::Int(7));
        let stmt = QueryBuilder::new(DialectTag::Postgres)
            .from_("users")
            .where_eq("id", Value::Int(1))
            .where_exists(sub, false)
            .build()
            .unwrap();
        let params = stmt.parameters().unwrap();
        assert_eq!(params.len(), 2);
        let names: HashSet<_> = params
            .slots()
            .iter()
            .filter_map(|s| s.name.clone())
            .collect();
        assert_eq!(names.len(), 2, "subquery param name must not collide with parent's");
    }

    #[test]
    fn join_links_two_tables_on_equality() {
        let stmt = QueryBuilder::new(DialectTag::Postgres)
            .from_("orders")
            .join("users", JoinKind::Inner, "orders.user_id", "users.id")
            .build()
            .unwrap();
        let sql = stmt.sql_for(PlaceholderStyle::NumericDollar).unwrap();
        assert!(sql.contains("JOIN users"));
    }

    #[test]
    fn limit_and_offset_apply_regardless_of_call_order() {
        let stmt = QueryBuilder::new(DialectTag::Postgres)
            .offset(5)
            .from_("users")
            .limit(10)
            .build()
            .unwrap();
        let sql = stmt.sql_for(PlaceholderStyle::NumericDollar).unwrap();
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("OFFSET 5"));
    }

    #[test]
    fn build_without_from_is_an_error() {
        let result = QueryBuilder::new(DialectTag::Postgres).build();
        assert!(result.is_err());
    }
}
