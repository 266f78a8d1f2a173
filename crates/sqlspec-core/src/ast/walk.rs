//! Expression-level tree walk shared by the literal-parameterization
//! transformer and the placeholder-style renderer. Only `Query`, `Insert`,
//! `Update`, and `Delete` are walked — DDL and anything else is left
//! untouched on purpose (literals inside DDL are never rewritten).

use sqlparser::ast::{
    Assignment, Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr,
    Insert, Join, JoinConstraint, JoinOperator, OrderByExpr, Query, Select, SelectItem, SetExpr,
    Statement, TableFactor, TableWithJoins, Values,
};

/// Calls `f` on every `Expr` node reachable from `stmt`, pre-order,
/// recursing into subqueries. `f` may mutate the node in place (used to
/// rewrite placeholders and inline literals).
pub fn visit_exprs_mut(stmt: &mut Statement, f: &mut dyn FnMut(&mut Expr)) {
    match stmt {
        Statement::Query(q) => visit_query_mut(q, f),
        Statement::Insert(Insert { source, .. }) => {
            if let Some(q) = source {
                visit_query_mut(q, f);
            }
        }
        Statement::Update {
            assignments,
            from,
            selection,
            ..
        } => {
            for a in assignments {
                visit_assignment_mut(a, f);
            }
            if let Some(from) = from {
                visit_table_with_joins_list_mut(from_kind_tables_mut(from), f);
            }
            if let Some(sel) = selection {
                visit_expr_mut(sel, f);
            }
        }
        Statement::Delete(del) => {
            if let Some(sel) = &mut del.selection {
                visit_expr_mut(sel, f);
            }
            for t in del.using.iter_mut().flatten() {
                visit_table_with_joins_mut(t, f);
            }
        }
        _ => {}
    }
}

// `UpdateTableFromKind` wraps either a plain `TableWithJoins` or a
// `FROM ... USING ...` shape depending on dialect; both surface the same
// join list to a visitor.
fn from_kind_tables_mut(
    from: &mut sqlparser::ast::UpdateTableFromKind,
) -> &mut Vec<TableWithJoins> {
    match from {
        sqlparser::ast::UpdateTableFromKind::BeforeSet(v)
        | sqlparser::ast::UpdateTableFromKind::AfterSet(v) => v,
    }
}

fn visit_table_with_joins_list_mut(list: &mut [TableWithJoins], f: &mut dyn FnMut(&mut Expr)) {
    for t in list {
        visit_table_with_joins_mut(t, f);
    }
}

fn visit_table_with_joins_mut(twj: &mut TableWithJoins, f: &mut dyn FnMut(&mut Expr)) {
    visit_table_factor_mut(&mut twj.relation, f);
    for join in &mut twj.joins {
        visit_join_mut(join, f);
    }
}

fn visit_join_mut(join: &mut Join, f: &mut dyn FnMut(&mut Expr)) {
    visit_table_factor_mut(&mut join.relation, f);
    visit_join_operator_mut(&mut join.join_operator, f);
}

fn visit_join_operator_mut(op: &mut JoinOperator, f: &mut dyn FnMut(&mut Expr)) {
    let constraint = match op {
        JoinOperator::Inner(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c)
        | JoinOperator::LeftSemi(c)
        | JoinOperator::RightSemi(c)
        | JoinOperator::LeftAnti(c)
        | JoinOperator::RightAnti(c) => Some(c),
        _ => None,
    };
    if let Some(JoinConstraint::On(expr)) = constraint {
        visit_expr_mut(expr, f);
    }
}

fn visit_table_factor_mut(tf: &mut TableFactor, f: &mut dyn FnMut(&mut Expr)) {
    match tf {
        TableFactor::Derived { subquery, .. } => visit_query_mut(subquery, f),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => visit_table_with_joins_mut(table_with_joins, f),
        _ => {}
    }
}

fn visit_assignment_mut(a: &mut Assignment, f: &mut dyn FnMut(&mut Expr)) {
    visit_expr_mut(&mut a.value, f);
}

fn visit_query_mut(q: &mut Query, f: &mut dyn FnMut(&mut Expr)) {
    if let Some(with) = &mut q.with {
        for cte in &mut with.cte_tables {
            visit_query_mut(&mut cte.query, f);
        }
    }
    visit_set_expr_mut(&mut q.body, f);
    for ob in order_by_exprs_mut(q) {
        visit_expr_mut(ob, f);
    }
    if let Some(limit) = &mut q.limit {
        visit_expr_mut(limit, f);
    }
}

fn order_by_exprs_mut(q: &mut Query) -> Vec<&mut Expr> {
    q.order_by
        .as_mut()
        .map(|ob| match &mut ob.kind {
            sqlparser::ast::OrderByKind::Expressions(exprs) => {
                exprs.iter_mut().map(order_by_expr_mut).collect()
            }
            sqlparser::ast::OrderByKind::All(_) => Vec::new(),
        })
        .unwrap_or_default()
}

fn order_by_expr_mut(e: &mut OrderByExpr) -> &mut Expr {
    &mut e.expr
}

fn visit_set_expr_mut(se: &mut SetExpr, f: &mut dyn FnMut(&mut Expr)) {
    match se {
        SetExpr::Select(select) => visit_select_mut(select, f),
        SetExpr::Query(q) => visit_query_mut(q, f),
        SetExpr::SetOperation { left, right, .. } => {
            visit_set_expr_mut(left, f);
            visit_set_expr_mut(right, f);
        }
        SetExpr::Values(Values { rows, .. }) => {
            for row in rows {
                for e in row {
                    visit_expr_mut(e, f);
                }
            }
        }
        _ => {}
    }
}

fn visit_select_mut(select: &mut Select, f: &mut dyn FnMut(&mut Expr)) {
    for item in &mut select.projection {
        match item {
            SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => {
                visit_expr_mut(e, f);
            }
            _ => {}
        }
    }
    for twj in &mut select.from {
        visit_table_with_joins_mut(twj, f);
    }
    if let Some(sel) = &mut select.selection {
        visit_expr_mut(sel, f);
    }
    if let GroupByExpr::Expressions(exprs, _) = &mut select.group_by {
        for e in exprs {
            visit_expr_mut(e, f);
        }
    }
    if let Some(having) = &mut select.having {
        visit_expr_mut(having, f);
    }
}

/// Recurses into one `Expr` node, covering the common recursive shapes.
/// Leaf/uncommon variants (casts of exotic forms, array/map literals) fall
/// through the final wildcard arm untouched — they are read but not
/// rewritten, which is safe since `f` only needs to see `Expr::Value`.
pub fn visit_expr_mut(expr: &mut Expr, f: &mut dyn FnMut(&mut Expr)) {
    match expr {
        Expr::BinaryOp { left, right, .. } => {
            visit_expr_mut(left, f);
            visit_expr_mut(right, f);
        }
        Expr::UnaryOp { expr: inner, .. } => visit_expr_mut(inner, f),
        Expr::Nested(inner) => visit_expr_mut(inner, f),
        Expr::Between {
            expr: inner,
            low,
            high,
            ..
        } => {
            visit_expr_mut(inner, f);
            visit_expr_mut(low, f);
            visit_expr_mut(high, f);
        }
        Expr::InList {
            expr: inner, list, ..
        } => {
            visit_expr_mut(inner, f);
            for e in list {
                visit_expr_mut(e, f);
            }
        }
        Expr::InSubquery {
            expr: inner,
            subquery,
            ..
        } => {
            visit_expr_mut(inner, f);
            visit_query_mut(subquery, f);
        }
        Expr::IsNull(inner)
        | Expr::IsNotNull(inner)
        | Expr::IsTrue(inner)
        | Expr::IsNotTrue(inner)
        | Expr::IsFalse(inner)
        | Expr::IsNotFalse(inner) => visit_expr_mut(inner, f),
        Expr::Like {
            expr: inner,
            pattern,
            ..
        }
        | Expr::ILike {
            expr: inner,
            pattern,
            ..
        } => {
            visit_expr_mut(inner, f);
            visit_expr_mut(pattern, f);
        }
        Expr::Cast { expr: inner, .. } => visit_expr_mut(inner, f),
        Expr::Subquery(q) => visit_query_mut(q, f),
        Expr::Exists { subquery, .. } => visit_query_mut(subquery, f),
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(o) = operand {
                visit_expr_mut(o, f);
            }
            for case_when in conditions {
                visit_expr_mut(&mut case_when.condition, f);
                visit_expr_mut(&mut case_when.result, f);
            }
            if let Some(e) = else_result {
                visit_expr_mut(e, f);
            }
        }
        Expr::Function(func) => visit_function_mut(func, f),
        Expr::Tuple(items) => {
            for e in items {
                visit_expr_mut(e, f);
            }
        }
        Expr::Value(_) => f(expr),
        _ => {}
    }
}

fn visit_function_mut(func: &mut Function, f: &mut dyn FnMut(&mut Expr)) {
    if let FunctionArguments::List(list) = &mut func.args {
        for arg in &mut list.args {
            let expr = match arg {
                FunctionArg::Named {
                    arg: FunctionArgExpr::Expr(e),
                    ..
                }
                | FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => Some(e),
                _ => None,
            };
            if let Some(e) = expr {
                visit_expr_mut(e, f);
            }
        }
    }
}
