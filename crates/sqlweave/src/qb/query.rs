//! Query state and SQL assembly.
//!
//! A [`QuerySpec`] is the plain data every SELECT builder call writes into. The
//! assembler functions only read it, so the same state can be rendered as a row
//! query and as an aggregate query without rebuilding.

use crate::column::ColumnExpr;
use crate::config::QbConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::Ident;
use crate::qb::param::ParamList;
use crate::qb::traits::BuiltQuery;
use crate::qb::tree::ConditionTree;
use std::fmt;
use std::str::FromStr;

/// MySQL has no OFFSET without LIMIT; this is the documented "all rows" limit.
pub const NO_LIMIT: u64 = u64::MAX;

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

impl FromStr for JoinKind {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INNER" => Ok(JoinKind::Inner),
            "LEFT" => Ok(JoinKind::Left),
            "RIGHT" => Ok(JoinKind::Right),
            _ => Err(WeaveError::validation(format!("Invalid join kind: '{s}'"))),
        }
    }
}

/// ` KIND JOIN table ON left = right`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: Ident,
    pub left: ColumnExpr,
    pub right: ColumnExpr,
}

impl JoinClause {
    /// Resolve a join. An unqualified `left` belongs to the query table, an
    /// unqualified `right` to the joined table.
    pub fn parse(
        kind: JoinKind,
        table: &str,
        left: &str,
        right: &str,
        query_table: Option<&Ident>,
        config: &QbConfig,
    ) -> WeaveResult<Self> {
        let table = Ident::parse(table)?;
        let left = ColumnExpr::parse_column(left, query_table, config)?;
        let right = ColumnExpr::parse_column(right, Some(&table), config)?;
        Ok(Self {
            kind,
            table,
            left,
            right,
        })
    }

    fn write_sql(&self, sql: &mut String) {
        sql.push(' ');
        sql.push_str(self.kind.as_sql());
        sql.push(' ');
        self.table.write_sql(sql);
        sql.push_str(" ON ");
        sql.push_str(&self.left.to_sql());
        sql.push_str(" = ");
        sql.push_str(&self.right.to_sql());
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    pub column: ColumnExpr,
    pub direction: Direction,
}

impl OrderSpec {
    /// Parse `[-|+]column`: a leading `-` sorts descending, anything else ascending.
    pub fn parse(raw: &str, table: Option<&Ident>, config: &QbConfig) -> WeaveResult<Self> {
        let raw = raw.trim();
        let (direction, column) = match raw.strip_prefix('-') {
            Some(rest) => (Direction::Desc, rest),
            None => (Direction::Asc, raw.strip_prefix('+').unwrap_or(raw)),
        };
        Ok(Self {
            column: ColumnExpr::parse_column(column, table, config)?,
            direction,
        })
    }

    fn to_sql(&self) -> String {
        format!("{} {}", self.column.to_sql(), self.direction.as_sql())
    }
}

/// Aggregate function name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Avg,
    Count,
    Max,
    Min,
    Sum,
}

impl AggregateFn {
    pub fn as_sql(self) -> &'static str {
        match self {
            AggregateFn::Avg => "AVG",
            AggregateFn::Count => "COUNT",
            AggregateFn::Max => "MAX",
            AggregateFn::Min => "MIN",
            AggregateFn::Sum => "SUM",
        }
    }
}

/// An aggregate, optionally over distinct values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    pub func: AggregateFn,
    pub distinct: bool,
}

impl Aggregate {
    pub fn new(func: AggregateFn) -> Self {
        Self {
            func,
            distinct: false,
        }
    }

    pub fn distinct(func: AggregateFn) -> Self {
        Self {
            func,
            distinct: true,
        }
    }

    /// The token this aggregate parses from (`COUNT`, `SUM_DISTINCT`, ...).
    pub fn token(self) -> String {
        if self.distinct {
            format!("{}_DISTINCT", self.func.as_sql())
        } else {
            self.func.as_sql().to_string()
        }
    }
}

impl FromStr for Aggregate {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let aggregate = match s.trim().to_ascii_uppercase().as_str() {
            "AVG" => Aggregate::new(AggregateFn::Avg),
            "AVG_DISTINCT" => Aggregate::distinct(AggregateFn::Avg),
            "COUNT" => Aggregate::new(AggregateFn::Count),
            "COUNT_DISTINCT" => Aggregate::distinct(AggregateFn::Count),
            "MAX" => Aggregate::new(AggregateFn::Max),
            "MIN" => Aggregate::new(AggregateFn::Min),
            "SUM" => Aggregate::new(AggregateFn::Sum),
            "SUM_DISTINCT" => Aggregate::distinct(AggregateFn::Sum),
            _ => return Err(WeaveError::InvalidAggregate(s.to_string())),
        };
        Ok(aggregate)
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

/// Everything a SELECT builder has accumulated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub table: Option<Ident>,
    pub distinct: bool,
    pub joins: Vec<JoinClause>,
    pub columns: Vec<ColumnExpr>,
    pub conditions: ConditionTree,
    pub group_by: Vec<ColumnExpr>,
    pub order_by: Vec<OrderSpec>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn write_source(spec: &QuerySpec, sql: &mut String, params: &mut ParamList) -> WeaveResult<()> {
    let table = spec.table.as_ref().ok_or(WeaveError::MissingTable)?;
    sql.push_str(" FROM ");
    table.write_sql(sql);
    for join in &spec.joins {
        join.write_sql(sql);
    }
    spec.conditions.render_into(sql, params)?;
    if !spec.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&join_sql(spec.group_by.iter().map(ColumnExpr::to_sql)));
    }
    Ok(())
}

fn write_order_by(spec: &QuerySpec, sql: &mut String) {
    if !spec.order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&join_sql(spec.order_by.iter().map(OrderSpec::to_sql)));
    }
}

fn join_sql(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

/// Render the row query.
pub fn assemble(spec: &QuerySpec) -> WeaveResult<BuiltQuery> {
    let mut sql = String::from("SELECT ");
    let mut params = ParamList::new();

    if spec.distinct {
        sql.push_str("DISTINCT ");
    }
    if spec.columns.is_empty() {
        sql.push('*');
    } else {
        sql.push_str(&join_sql(
            spec.columns.iter().map(ColumnExpr::to_projection_sql),
        ));
    }

    write_source(spec, &mut sql, &mut params)?;
    write_order_by(spec, &mut sql);

    match (spec.limit, spec.offset) {
        (Some(limit), _) => sql.push_str(&format!(" LIMIT {limit}")),
        (None, Some(_)) => sql.push_str(&format!(" LIMIT {NO_LIMIT}")),
        (None, None) => {}
    }
    if let Some(offset) = spec.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    Ok(BuiltQuery::new(sql, params))
}

/// Render the aggregate form of the same query.
///
/// The projection becomes the single aggregate; FROM, joins, WHERE and GROUP BY
/// are reused; ORDER BY survives only alongside GROUP BY; LIMIT, OFFSET and
/// DISTINCT never apply.
pub fn assemble_aggregate(
    spec: &QuerySpec,
    aggregate: Aggregate,
    column: &ColumnExpr,
) -> WeaveResult<BuiltQuery> {
    let target = match column {
        ColumnExpr::Wildcard(None) => {
            if aggregate.func != AggregateFn::Count || aggregate.distinct {
                return Err(WeaveError::validation(format!(
                    "{aggregate} cannot be applied to '*'"
                )));
            }
            "*".to_string()
        }
        ColumnExpr::Wildcard(Some(_)) | ColumnExpr::Function { .. } => {
            return Err(WeaveError::validation(format!(
                "{aggregate} needs a column, got '{}'",
                column.to_sql()
            )));
        }
        _ => column.to_sql(),
    };

    let mut sql = format!("SELECT {}(", aggregate.func.as_sql());
    if aggregate.distinct {
        sql.push_str("DISTINCT ");
    }
    sql.push_str(&target);
    sql.push(')');

    let mut params = ParamList::new();
    write_source(spec, &mut sql, &mut params)?;
    if !spec.group_by.is_empty() {
        write_order_by(spec, &mut sql);
    }

    Ok(BuiltQuery::new(sql, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> QbConfig {
        QbConfig::default()
    }

    fn base() -> QuerySpec {
        QuerySpec {
            table: Some(Ident::parse("products").unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn bare_select() {
        let built = assemble(&base()).unwrap();
        assert_eq!(built.sql, "SELECT * FROM products");
        assert!(built.params.is_empty());
    }

    #[test]
    fn missing_table() {
        let err = assemble(&QuerySpec::default()).unwrap_err();
        assert!(matches!(err, WeaveError::MissingTable));
    }

    #[test]
    fn offset_without_limit() {
        let mut spec = base();
        spec.offset = Some(20);
        assert_eq!(
            assemble(&spec).unwrap().sql,
            "SELECT * FROM products LIMIT 18446744073709551615 OFFSET 20"
        );
    }

    #[test]
    fn order_parsing() {
        let table = Ident::parse("products").unwrap();
        let cfg = config();
        let desc = OrderSpec::parse("-price", Some(&table), &cfg).unwrap();
        assert_eq!(desc.to_sql(), "products.price DESC");
        for raw in ["price", "+price", " price"] {
            let asc = OrderSpec::parse(raw, Some(&table), &cfg).unwrap();
            assert_eq!(asc.to_sql(), "products.price ASC");
        }
        let json = OrderSpec::parse("-supplier->rank", Some(&table), &cfg).unwrap();
        assert_eq!(json.to_sql(), "products.supplier->>'$.rank' DESC");
    }

    #[test]
    fn join_qualification() {
        let table = Ident::parse("products").unwrap();
        let join = JoinClause::parse(
            JoinKind::Left,
            "suppliers",
            "supplier_id",
            "id",
            Some(&table),
            &config(),
        )
        .unwrap();
        let mut sql = String::new();
        join.write_sql(&mut sql);
        assert_eq!(
            sql,
            " LEFT JOIN suppliers ON products.supplier_id = suppliers.id"
        );
    }

    #[test]
    fn aggregate_tokens() {
        assert_eq!(
            "COUNT_DISTINCT".parse::<Aggregate>().unwrap(),
            Aggregate::distinct(AggregateFn::Count)
        );
        assert_eq!("sum".parse::<Aggregate>().unwrap().token(), "SUM");
        assert!(matches!(
            "MEDIAN".parse::<Aggregate>(),
            Err(WeaveError::InvalidAggregate(_))
        ));
        assert!("MAX_DISTINCT".parse::<Aggregate>().is_err());
    }

    #[test]
    fn aggregate_drops_row_clauses() {
        let cfg = config();
        let table = Ident::parse("products").unwrap();
        let mut spec = base();
        spec.distinct = true;
        spec.columns = vec![ColumnExpr::parse_projection("name", Some(&table), &cfg).unwrap()];
        spec.order_by = vec![OrderSpec::parse("-price", Some(&table), &cfg).unwrap()];
        spec.limit = Some(10);
        spec.offset = Some(5);

        let color = ColumnExpr::parse_column("color", Some(&table), &cfg).unwrap();
        let built =
            assemble_aggregate(&spec, Aggregate::distinct(AggregateFn::Count), &color).unwrap();
        assert_eq!(
            built.sql,
            "SELECT COUNT(DISTINCT products.color) FROM products"
        );
    }

    #[test]
    fn aggregate_keeps_order_with_group_by() {
        let cfg = config();
        let table = Ident::parse("products").unwrap();
        let mut spec = base();
        spec.group_by = vec![ColumnExpr::parse_column("color", Some(&table), &cfg).unwrap()];
        spec.order_by = vec![OrderSpec::parse("color", Some(&table), &cfg).unwrap()];
        let built = assemble_aggregate(
            &spec,
            Aggregate::new(AggregateFn::Count),
            &ColumnExpr::Wildcard(None),
        )
        .unwrap();
        assert_eq!(
            built.sql,
            "SELECT COUNT(*) FROM products GROUP BY products.color ORDER BY products.color ASC"
        );
    }

    #[test]
    fn aggregate_star_only_for_count() {
        let err = assemble_aggregate(
            &base(),
            Aggregate::new(AggregateFn::Sum),
            &ColumnExpr::Wildcard(None),
        )
        .unwrap_err();
        assert!(err.is_validation());
        assert!(
            assemble_aggregate(
                &base(),
                Aggregate::distinct(AggregateFn::Count),
                &ColumnExpr::Wildcard(None),
            )
            .is_err()
        );
    }
}
