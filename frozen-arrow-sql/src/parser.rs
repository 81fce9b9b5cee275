//! C12: the small SQL dialect translator (spec.md §4.12), built on
//! `sqlparser` the same way the teacher's SQL front-end is: tokenize with
//! `GenericDialect`, walk the resulting AST, and produce the same
//! `LogicalPlan` shape the expression-tree translator (C11) produces, so
//! C13/C14 stay language-agnostic.

use sqlparser::ast::{
    BinaryOperator, Expr as SqlExpr, Function, FunctionArg, FunctionArgExpr, FunctionArguments,
    GroupByExpr, Offset as SqlOffset, OrderByExpr, Query, Select, SelectItem, SetExpr, Statement,
    UnaryOperator, Value,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use frozen_arrow_common::error::{FrozenArrowError, Result};
use frozen_arrow_common::schema::Schema;
use frozen_arrow_expr::{AggregateFn, CmpOp, ColumnPredicate, LogicalPlan, ProjectionField, SortKey, StringOpKind};

use std::sync::Arc;

/// Parses `sql` against `schema` and returns the logical plan C13/C14 expect,
/// identical in shape to one produced by the expression-tree translator.
pub fn parse_sql(schema: &Schema, estimated_row_count: i64, sql: &str) -> Result<LogicalPlan> {
    let statements = Parser::parse_sql(&GenericDialect {}, sql)
        .map_err(|e| FrozenArrowError::unsupported(format!("SQL parse error: {e}")))?;
    if statements.len() != 1 {
        return Err(FrozenArrowError::unsupported(
            "exactly one SQL statement is supported",
        ));
    }
    let Statement::Query(query) = &statements[0] else {
        return Err(FrozenArrowError::unsupported("only SELECT statements are supported"));
    };
    translate_query(schema, estimated_row_count, query)
}

fn translate_query(schema: &Schema, estimated_row_count: i64, query: &Query) -> Result<LogicalPlan> {
    let SetExpr::Select(select) = query.body.as_ref() else {
        return Err(FrozenArrowError::unsupported("only a single SELECT body is supported"));
    };

    if select.from.len() != 1 || !select.from[0].joins.is_empty() {
        return Err(FrozenArrowError::unsupported("JOINs are not supported"));
    }

    let scan = Arc::new(LogicalPlan::scan(schema.clone(), estimated_row_count));

    let mut plan = scan;
    if let Some(selection) = &select.selection {
        let predicate = translate_expr(schema, selection)?;
        let predicates = flatten_and(predicate);
        let selectivity = predicates
            .iter()
            .map(|p| p.default_selectivity())
            .product::<f64>()
            .clamp(0.0, 1.0);
        plan = Arc::new(LogicalPlan::filter(plan, predicates, selectivity)?);
    }

    plan = translate_select_list(schema, select, plan)?;

    if let Some(order_by) = &query.order_by {
        if !order_by.exprs.is_empty() {
            plan = Arc::new(LogicalPlan::sort(plan, translate_order_by(schema, &order_by.exprs)?));
        }
    }

    // OFFSET always applies before LIMIT in SQL semantics regardless of
    // clause order, so it must be the inner node: Limit(Offset(...)).
    if let Some(offset) = &query.offset {
        let count = translate_offset(offset)?;
        plan = Arc::new(LogicalPlan::offset(plan, count)?);
    }
    if let Some(limit_expr) = &query.limit {
        let count = literal_i64(limit_expr)?;
        plan = Arc::new(LogicalPlan::limit(plan, count)?);
    }

    Ok(Arc::try_unwrap(plan).unwrap_or_else(|arc| (*arc).clone()))
}

fn translate_offset(offset: &SqlOffset) -> Result<i64> {
    literal_i64(&offset.value)
}

fn literal_i64(expr: &SqlExpr) -> Result<i64> {
    match expr {
        SqlExpr::Value(Value::Number(n, _)) => n
            .parse::<i64>()
            .map_err(|_| FrozenArrowError::unsupported(format!("not an integer literal: {n}"))),
        _ => Err(FrozenArrowError::unsupported("expected an integer literal")),
    }
}

/// Handles the plain projection (`SELECT *` / `SELECT a, b`) and the two
/// aggregate shapes (`SELECT agg(...)...` and `SELECT k, agg(...) ... GROUP
/// BY k`), mirroring C11's `GroupBy(keySel).Select(aggProjector)` split.
fn translate_select_list(schema: &Schema, select: &Select, input: Arc<LogicalPlan>) -> Result<Arc<LogicalPlan>> {
    let group_by_cols = match &select.group_by {
        GroupByExpr::Expressions(exprs, _) => exprs.clone(),
        GroupByExpr::All(_) => {
            return Err(FrozenArrowError::unsupported("GROUP BY ALL is not supported"))
        }
    };

    if !group_by_cols.is_empty() {
        if group_by_cols.len() != 1 {
            return Err(FrozenArrowError::unsupported("only a single GROUP BY column is supported"));
        }
        let key_name = identifier_name(&group_by_cols[0])?;
        let key_column = schema.column_index(&key_name)?;
        let aggregates = select
            .projection
            .iter()
            .filter_map(|item| aggregate_from_select_item(schema, item).transpose())
            .collect::<Result<Vec<_>>>()?;
        let estimated_distinct_groups = 256; // refined by the caller once data is seen; a safe default here.
        let mut plan = Arc::new(LogicalPlan::group_by(
            input,
            key_column,
            key_name,
            aggregates,
            estimated_distinct_groups,
        ));
        if let Some(having) = &select.having {
            plan = Arc::new(apply_having(schema, plan, having)?);
        }
        return Ok(plan);
    }

    // No GROUP BY: either a plain row projection or a single aggregate row
    // (`SELECT COUNT(*) FROM t`), distinguished by whether any projected item
    // is a function call.
    let any_aggregate = select
        .projection
        .iter()
        .any(|item| matches!(select_item_expr(item), Some(SqlExpr::Function(_))));

    if any_aggregate {
        let aggregates = select
            .projection
            .iter()
            .map(|item| aggregate_from_select_item(schema, item)?.ok_or_else(|| {
                FrozenArrowError::unsupported("mixing aggregates and plain columns requires GROUP BY")
            }))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Arc::new(LogicalPlan::aggregate(input, aggregates)));
    }

    if is_select_star(select) {
        let mut plan = input;
        if select.distinct.is_some() {
            plan = Arc::new(LogicalPlan::distinct(plan));
        }
        return Ok(plan);
    }

    let projections = select
        .projection
        .iter()
        .map(|item| projection_field(schema, item))
        .collect::<Result<Vec<_>>>()?;
    let mut plan = Arc::new(LogicalPlan::project(input, projections));
    if select.distinct.is_some() {
        plan = Arc::new(LogicalPlan::distinct(plan));
    }
    Ok(plan)
}

fn is_select_star(select: &Select) -> bool {
    select.projection.len() == 1 && matches!(select.projection[0], SelectItem::Wildcard(_))
}

fn select_item_expr(item: &SelectItem) -> Option<&SqlExpr> {
    match item {
        SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => Some(e),
        SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => None,
    }
}

fn projection_field(schema: &Schema, item: &SelectItem) -> Result<ProjectionField> {
    let expr = select_item_expr(item)
        .ok_or_else(|| FrozenArrowError::unsupported("wildcard mixed with explicit columns"))?;
    let name = identifier_name(expr)?;
    let idx = schema.column_index(&name)?;
    let field = schema.field(idx).expect("resolved index is in range");
    let output_name = match item {
        SelectItem::ExprWithAlias { alias, .. } => alias.value.clone(),
        _ => name,
    };
    Ok(ProjectionField {
        source_column: idx,
        output_name,
        data_type: field.data_type,
    })
}

/// `HAVING` is restricted to conditions on the group key (spec.md §4.12,
/// §9's documented limitation), so it translates to an ordinary `Filter`
/// stacked on the already-computed `GroupBy`, restricted to the key column.
fn apply_having(schema: &Schema, plan: Arc<LogicalPlan>, having: &SqlExpr) -> Result<LogicalPlan> {
    let predicate = translate_expr(schema, having)?;
    let predicates = flatten_and(predicate);
    LogicalPlan::filter(plan, predicates, 0.5)
}

fn aggregate_from_select_item(schema: &Schema, item: &SelectItem) -> Result<Option<AggregateFn>> {
    let Some(SqlExpr::Function(func)) = select_item_expr(item) else {
        return Ok(None);
    };
    Ok(Some(translate_aggregate_function(schema, func)?))
}

fn translate_aggregate_function(schema: &Schema, func: &Function) -> Result<AggregateFn> {
    let name = func.name.to_string().to_uppercase();
    let args = match &func.args {
        FunctionArguments::List(list) => &list.args,
        _ => return Err(FrozenArrowError::unsupported("unsupported aggregate argument form")),
    };

    if name == "COUNT" {
        if args.len() == 1 && matches!(args[0], FunctionArg::Unnamed(FunctionArgExpr::Wildcard)) {
            return Ok(AggregateFn::Count);
        }
        let column = single_arg_column(schema, args)?;
        let _ = column; // COUNT(col) counts non-null rows like COUNT(*) in this engine's scope (nulls excluded by the filter stage upstream).
        return Ok(AggregateFn::Count);
    }

    let column = single_arg_column(schema, args)?;
    match name.as_str() {
        "SUM" => Ok(AggregateFn::Sum(column)),
        "AVG" => Ok(AggregateFn::Avg(column)),
        "MIN" => Ok(AggregateFn::Min(column)),
        "MAX" => Ok(AggregateFn::Max(column)),
        other => Err(FrozenArrowError::unsupported(format!("unsupported aggregate function {other}"))),
    }
}

fn single_arg_column(schema: &Schema, args: &[FunctionArg]) -> Result<usize> {
    if args.len() != 1 {
        return Err(FrozenArrowError::unsupported("aggregate functions take exactly one argument"));
    }
    let FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) = &args[0] else {
        return Err(FrozenArrowError::unsupported("unsupported aggregate argument form"));
    };
    let name = identifier_name(expr)?;
    schema.column_index(&name)
}

fn translate_order_by(schema: &Schema, order_by: &[OrderByExpr]) -> Result<Vec<SortKey>> {
    order_by
        .iter()
        .map(|key| {
            let name = identifier_name(&key.expr)?;
            let column = schema.column_index(&name)?;
            Ok(SortKey {
                column,
                ascending: key.asc.unwrap_or(true),
            })
        })
        .collect()
}

fn identifier_name(expr: &SqlExpr) -> Result<String> {
    match expr {
        SqlExpr::Identifier(ident) => Ok(ident.value.clone()),
        SqlExpr::CompoundIdentifier(parts) => Ok(parts.last().map(|i| i.value.clone()).unwrap_or_default()),
        _ => Err(FrozenArrowError::unsupported("expected a column reference")),
    }
}

/// Splits a translated `And` back into a flat predicate list, the shape
/// `Filter.predicates` expects (the optimizer reorders the list, not a
/// nested tree).
fn flatten_and(pred: ColumnPredicate) -> Vec<ColumnPredicate> {
    match pred {
        ColumnPredicate::And(list) => list,
        other => vec![other],
    }
}

/// Walks a `WHERE`/`HAVING` boolean expression into a `ColumnPredicate`,
/// precedence already resolved by `sqlparser`.
fn translate_expr(schema: &Schema, expr: &SqlExpr) -> Result<ColumnPredicate> {
    match expr {
        SqlExpr::BinaryOp { left, op, right } => translate_binary_op(schema, left, op, right),
        SqlExpr::UnaryOp { op: UnaryOperator::Not, expr } => {
            Ok(ColumnPredicate::Not(Box::new(translate_expr(schema, expr)?)))
        }
        SqlExpr::IsNull(inner) => {
            let name = identifier_name(inner)?;
            ColumnPredicate::is_null(schema, &name)
        }
        SqlExpr::IsNotNull(inner) => {
            let name = identifier_name(inner)?;
            Ok(ColumnPredicate::Not(Box::new(ColumnPredicate::is_null(schema, &name)?)))
        }
        SqlExpr::Like { negated, expr, pattern, escape_char: _ } => {
            let name = identifier_name(expr)?;
            let pattern_str = literal_string(pattern)?;
            let (kind, needle) = translate_like_pattern(&pattern_str)?;
            let base = ColumnPredicate::string_op(schema, &name, kind, needle)?;
            Ok(if *negated { ColumnPredicate::Not(Box::new(base)) } else { base })
        }
        SqlExpr::Nested(inner) => translate_expr(schema, inner),
        _ => Err(FrozenArrowError::unsupported(format!("unsupported WHERE expression: {expr}"))),
    }
}

fn translate_binary_op(schema: &Schema, left: &SqlExpr, op: &BinaryOperator, right: &SqlExpr) -> Result<ColumnPredicate> {
    match op {
        BinaryOperator::And => Ok(ColumnPredicate::And(vec![
            translate_expr(schema, left)?,
            translate_expr(schema, right)?,
        ])),
        BinaryOperator::Or => Ok(ColumnPredicate::Or(
            Box::new(translate_expr(schema, left)?),
            Box::new(translate_expr(schema, right)?),
        )),
        _ => translate_comparison(schema, left, op, right),
    }
}

/// `col OP const` and `const OP col` both translate; the column side is
/// located by trying the left first, the spec's documented symmetric shape.
fn translate_comparison(schema: &Schema, left: &SqlExpr, op: &BinaryOperator, right: &SqlExpr) -> Result<ColumnPredicate> {
    let cmp_op = translate_cmp_op(op)?;
    let (column_expr, literal_expr, cmp_op) = match (identifier_name(left), identifier_name(right)) {
        (Ok(name), _) => (name, right, cmp_op),
        (Err(_), Ok(name)) => (name, left, flip(cmp_op)),
        _ => return Err(FrozenArrowError::unsupported("comparison must reference exactly one column")),
    };

    let idx = schema.column_index(&column_expr)?;
    let data_type = schema.data_type(idx).expect("resolved index is in range");
    build_leaf_predicate(schema, &column_expr, data_type, cmp_op, literal_expr)
}

fn flip(op: CmpOp) -> CmpOp {
    match op {
        CmpOp::Lt => CmpOp::Gt,
        CmpOp::Le => CmpOp::Ge,
        CmpOp::Gt => CmpOp::Lt,
        CmpOp::Ge => CmpOp::Le,
        same => same,
    }
}

fn translate_cmp_op(op: &BinaryOperator) -> Result<CmpOp> {
    match op {
        BinaryOperator::Eq => Ok(CmpOp::Eq),
        BinaryOperator::NotEq => Ok(CmpOp::Ne),
        BinaryOperator::Lt => Ok(CmpOp::Lt),
        BinaryOperator::LtEq => Ok(CmpOp::Le),
        BinaryOperator::Gt => Ok(CmpOp::Gt),
        BinaryOperator::GtEq => Ok(CmpOp::Ge),
        other => Err(FrozenArrowError::unsupported(format!("unsupported comparison operator {other}"))),
    }
}

fn build_leaf_predicate(
    schema: &Schema,
    column: &str,
    data_type: frozen_arrow_common::schema::DataType,
    op: CmpOp,
    literal: &SqlExpr,
) -> Result<ColumnPredicate> {
    use frozen_arrow_common::schema::DataType;
    match data_type {
        DataType::Int32 | DataType::Int64 | DataType::Timestamp => {
            ColumnPredicate::i32_cmp(schema, column, op, literal_int(literal)? as i32)
        }
        DataType::Float64 => ColumnPredicate::f64_cmp(schema, column, op, literal_float(literal)?),
        DataType::Decimal128 => ColumnPredicate::dec_cmp(schema, column, op, literal_int(literal)? as i128),
        DataType::Bool => {
            if op != CmpOp::Eq {
                return Err(FrozenArrowError::unsupported("only = is supported for boolean columns"));
            }
            ColumnPredicate::bool_eq(schema, column, literal_bool(literal)?)
        }
        DataType::Utf8 | DataType::Utf8Dict => ColumnPredicate::str_cmp(schema, column, op, literal_string_or_date(literal)?),
        DataType::Other => Err(FrozenArrowError::unsupported(format!("column '{column}' has an unsupported type"))),
    }
}

fn literal_int(expr: &SqlExpr) -> Result<i64> {
    match expr {
        SqlExpr::Value(Value::Number(n, _)) => n.parse::<i64>().map_err(|_| FrozenArrowError::unsupported(format!("not an integer literal: {n}"))),
        SqlExpr::UnaryOp { op: UnaryOperator::Minus, expr } => Ok(-literal_int(expr)?),
        _ => Err(FrozenArrowError::unsupported("expected a numeric literal")),
    }
}

fn literal_float(expr: &SqlExpr) -> Result<f64> {
    match expr {
        SqlExpr::Value(Value::Number(n, _)) => n.parse::<f64>().map_err(|_| FrozenArrowError::unsupported(format!("not a numeric literal: {n}"))),
        SqlExpr::UnaryOp { op: UnaryOperator::Minus, expr } => Ok(-literal_float(expr)?),
        _ => Err(FrozenArrowError::unsupported("expected a numeric literal")),
    }
}

fn literal_bool(expr: &SqlExpr) -> Result<bool> {
    match expr {
        SqlExpr::Value(Value::Boolean(b)) => Ok(*b),
        SqlExpr::Value(Value::Number(n, _)) => match n.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            _ => Err(FrozenArrowError::unsupported(format!("not a boolean literal: {n}"))),
        },
        _ => Err(FrozenArrowError::unsupported("expected a boolean literal")),
    }
}

fn literal_string(expr: &SqlExpr) -> Result<String> {
    match expr {
        SqlExpr::Value(Value::SingleQuotedString(s)) => Ok(s.clone()),
        _ => Err(FrozenArrowError::unsupported("expected a string literal")),
    }
}

/// Dates (`YYYY-MM-DD[ HH:MM:SS]`) are accepted as string literals and
/// compared lexically, which is order-preserving for this format.
fn literal_string_or_date(expr: &SqlExpr) -> Result<String> {
    literal_string(expr)
}

/// `LIKE` pattern -> `StringOp` kind, per spec.md §4.12: `%…%` -> Contains,
/// `%…` -> EndsWith, `…%` -> StartsWith, no wildcards -> Equal. `_` is not
/// supported.
fn translate_like_pattern(pattern: &str) -> Result<(StringOpKind, String)> {
    if pattern.contains('_') {
        return Err(FrozenArrowError::unsupported("'_' wildcard in LIKE is not supported"));
    }
    let starts = pattern.starts_with('%');
    let ends = pattern.ends_with('%');
    let trimmed = pattern.trim_matches('%').to_string();
    Ok(match (starts, ends) {
        (true, true) => (StringOpKind::Contains, trimmed),
        (false, true) => (StringOpKind::StartsWith, trimmed),
        (true, false) => (StringOpKind::EndsWith, trimmed),
        (false, false) => (StringOpKind::Equal, trimmed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use frozen_arrow_common::schema::{DataType, Field};

    fn schema() -> Schema {
        Schema::from_fields(vec![
            Field { name: "Id".into(), index: 0, data_type: DataType::Int32, nullable: false },
            Field { name: "Age".into(), index: 1, data_type: DataType::Int32, nullable: false },
            Field { name: "Active".into(), index: 2, data_type: DataType::Bool, nullable: false },
            Field { name: "Score".into(), index: 3, data_type: DataType::Float64, nullable: false },
            Field { name: "Cat".into(), index: 4, data_type: DataType::Utf8, nullable: false },
        ])
    }

    #[test]
    fn simple_where_and_group_by() {
        let plan = parse_sql(&schema(), 1000, "SELECT Cat, COUNT(*) FROM t WHERE Age > 40 GROUP BY Cat").unwrap();
        let LogicalPlan::GroupBy(g) = &plan else { panic!("expected group by") };
        assert_eq!(g.key_name, "Cat");
        let LogicalPlan::Filter(f) = g.input.as_ref() else { panic!("expected filter under group by") };
        assert!(matches!(f.predicates[0], ColumnPredicate::I32Cmp { column: 1, op: CmpOp::Gt, value: 40 }));
    }

    #[test]
    fn like_with_both_wildcards_is_contains() {
        let plan = parse_sql(&schema(), 1000, "SELECT * FROM t WHERE Cat LIKE '%A%'").unwrap();
        let LogicalPlan::Filter(f) = &plan else { panic!("expected filter") };
        assert!(matches!(&f.predicates[0], ColumnPredicate::StringOp { kind: StringOpKind::Contains, .. }));
    }

    #[test]
    fn like_with_trailing_wildcard_is_starts_with() {
        let plan = parse_sql(&schema(), 1000, "SELECT * FROM t WHERE Cat LIKE 'A%'").unwrap();
        let LogicalPlan::Filter(f) = &plan else { panic!("expected filter") };
        assert!(matches!(&f.predicates[0], ColumnPredicate::StringOp { kind: StringOpKind::StartsWith, .. }));
    }

    #[test]
    fn underscore_wildcard_is_unsupported() {
        let err = parse_sql(&schema(), 1000, "SELECT * FROM t WHERE Cat LIKE 'A_'").unwrap_err();
        assert!(err.is_unsupported_pattern());
    }

    #[test]
    fn count_star_with_no_group_by_is_plain_aggregate() {
        let plan = parse_sql(&schema(), 1000, "SELECT COUNT(*) FROM t").unwrap();
        assert!(matches!(plan, LogicalPlan::Aggregate(_)));
    }

    #[test]
    fn order_by_and_limit_offset() {
        // OFFSET applies before LIMIT regardless of clause order, so the
        // offset node sits inside the limit node: Limit(Offset(Sort(...))).
        let plan = parse_sql(&schema(), 1000, "SELECT * FROM t ORDER BY Age DESC LIMIT 10 OFFSET 5").unwrap();
        let LogicalPlan::Limit(l) = &plan else { panic!("expected limit") };
        assert_eq!(l.count, 10);
        let LogicalPlan::Offset(o) = l.input.as_ref() else { panic!("expected offset") };
        assert_eq!(o.count, 5);
        let LogicalPlan::Sort(s) = o.input.as_ref() else { panic!("expected sort") };
        assert!(!s.keys[0].ascending);
    }

    #[test]
    fn joins_are_rejected() {
        let err = parse_sql(&schema(), 1000, "SELECT * FROM t JOIN u ON t.Id = u.Id").unwrap_err();
        assert!(err.is_unsupported_pattern());
    }
}
