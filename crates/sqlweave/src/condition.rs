//! Filter operators and their translation into SQL fragments.
//!
//! The operator vocabulary is closed:
//!
//! | token                          | SQL                                   |
//! |--------------------------------|---------------------------------------|
//! | `eq !eq lt gt le ge`           | `= != < > <= >=`                      |
//! | `sw !sw ew !ew has !has`       | `BINARY col [NOT] LIKE` (byte-exact)  |
//! | `isw !isw iew !iew ihas !ihas` | `col [NOT] LIKE` (collation-dependent)|
//! | `in !in`                       | `[NOT] IN (?,?,...)`, comma-separated |
//! | `null !null`                   | `IS [NOT] NULL`, value `true`/`false` |
//!
//! # Example
//! ```ignore
//! use sqlweave::{FunctionAllowList, Operator, translate};
//!
//! let f = translate("price", "gt".parse()?, "20.00", &FunctionAllowList::default())?;
//! assert_eq!(f.sql, "price > ?");
//! ```

use crate::error::{WeaveError, WeaveResult};
use crate::functions::FunctionAllowList;
use crate::qb::param::Param;
use std::fmt;
use std::str::FromStr;

/// Filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `eq`: column = value
    Eq,
    /// `!eq`: column != value
    NotEq,
    /// `lt`: column < value
    Lt,
    /// `gt`: column > value
    Gt,
    /// `le`: column <= value
    Le,
    /// `ge`: column >= value
    Ge,
    /// `sw`: starts with, byte-exact
    StartsWith,
    /// `!sw`
    NotStartsWith,
    /// `isw`: starts with, collation-dependent
    IStartsWith,
    /// `!isw`
    NotIStartsWith,
    /// `ew`: ends with, byte-exact
    EndsWith,
    /// `!ew`
    NotEndsWith,
    /// `iew`: ends with, collation-dependent
    IEndsWith,
    /// `!iew`
    NotIEndsWith,
    /// `has`: contains, byte-exact
    Has,
    /// `!has`
    NotHas,
    /// `ihas`: contains, collation-dependent
    IHas,
    /// `!ihas`
    NotIHas,
    /// `in`: comma-separated membership
    In,
    /// `!in`
    NotIn,
    /// `null`: `true` => IS NULL, `false` => IS NOT NULL
    Null,
    /// `!null`: complement of `null`
    NotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrap {
    Prefix,
    Suffix,
    Contains,
}

impl Wrap {
    fn apply(self, value: &str) -> String {
        match self {
            Wrap::Prefix => format!("{value}%"),
            Wrap::Suffix => format!("%{value}"),
            Wrap::Contains => format!("%{value}%"),
        }
    }
}

impl Operator {
    /// Every operator, in vocabulary order.
    pub const ALL: [Operator; 22] = [
        Operator::Eq,
        Operator::NotEq,
        Operator::Lt,
        Operator::Gt,
        Operator::Le,
        Operator::Ge,
        Operator::StartsWith,
        Operator::NotStartsWith,
        Operator::IStartsWith,
        Operator::NotIStartsWith,
        Operator::EndsWith,
        Operator::NotEndsWith,
        Operator::IEndsWith,
        Operator::NotIEndsWith,
        Operator::Has,
        Operator::NotHas,
        Operator::IHas,
        Operator::NotIHas,
        Operator::In,
        Operator::NotIn,
        Operator::Null,
        Operator::NotNull,
    ];

    /// The DSL token for this operator.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::NotEq => "!eq",
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Le => "le",
            Operator::Ge => "ge",
            Operator::StartsWith => "sw",
            Operator::NotStartsWith => "!sw",
            Operator::IStartsWith => "isw",
            Operator::NotIStartsWith => "!isw",
            Operator::EndsWith => "ew",
            Operator::NotEndsWith => "!ew",
            Operator::IEndsWith => "iew",
            Operator::NotIEndsWith => "!iew",
            Operator::Has => "has",
            Operator::NotHas => "!has",
            Operator::IHas => "ihas",
            Operator::NotIHas => "!ihas",
            Operator::In => "in",
            Operator::NotIn => "!in",
            Operator::Null => "null",
            Operator::NotNull => "!null",
        }
    }

    fn comparison(self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("="),
            Operator::NotEq => Some("!="),
            Operator::Lt => Some("<"),
            Operator::Gt => Some(">"),
            Operator::Le => Some("<="),
            Operator::Ge => Some(">="),
            _ => None,
        }
    }

    /// (wrapping, negated, byte-exact)
    fn pattern(self) -> Option<(Wrap, bool, bool)> {
        match self {
            Operator::StartsWith => Some((Wrap::Prefix, false, true)),
            Operator::NotStartsWith => Some((Wrap::Prefix, true, true)),
            Operator::IStartsWith => Some((Wrap::Prefix, false, false)),
            Operator::NotIStartsWith => Some((Wrap::Prefix, true, false)),
            Operator::EndsWith => Some((Wrap::Suffix, false, true)),
            Operator::NotEndsWith => Some((Wrap::Suffix, true, true)),
            Operator::IEndsWith => Some((Wrap::Suffix, false, false)),
            Operator::NotIEndsWith => Some((Wrap::Suffix, true, false)),
            Operator::Has => Some((Wrap::Contains, false, true)),
            Operator::NotHas => Some((Wrap::Contains, true, true)),
            Operator::IHas => Some((Wrap::Contains, false, false)),
            Operator::NotIHas => Some((Wrap::Contains, true, false)),
            _ => None,
        }
    }
}

impl FromStr for Operator {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.token() == s)
            .ok_or_else(|| WeaveError::InvalidOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A translated condition: SQL text plus the values for its `?` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Fragment {
    /// A fragment without placeholders.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn bound(sql: String, params: Vec<Param>) -> Self {
        Self { sql, params }
    }
}

/// Translate one filter into a fragment.
///
/// `column` must already be resolved SQL (see [`crate::ColumnExpr::to_sql`]).
pub fn translate(
    column: &str,
    operator: Operator,
    value: &str,
    functions: &FunctionAllowList,
) -> WeaveResult<Fragment> {
    let passthrough = functions
        .passthrough(value)
        .map_err(|_| WeaveError::invalid_value(operator.token(), value))?;

    if let Some(op) = operator.comparison() {
        return Ok(if value.is_empty() {
            Fragment::raw(format!("{column} {op} ''"))
        } else if passthrough {
            Fragment::raw(format!("{column} {op} {value}"))
        } else {
            Fragment::bound(format!("{column} {op} ?"), vec![Param::from(value)])
        });
    }

    if let Some((wrap, negated, exact)) = operator.pattern() {
        let target = if exact {
            format!("BINARY {column}")
        } else {
            column.to_string()
        };
        let like = if negated { "NOT LIKE" } else { "LIKE" };
        return Ok(if passthrough {
            Fragment::raw(format!("{target} {like} {value}"))
        } else {
            Fragment::bound(
                format!("{target} {like} ?"),
                vec![Param::Text(wrap.apply(value))],
            )
        });
    }

    match operator {
        Operator::In | Operator::NotIn => {
            let keyword = if operator == Operator::In { "IN" } else { "NOT IN" };
            if passthrough {
                return Ok(Fragment::raw(format!("{column} {keyword} ({value})")));
            }
            let params: Vec<Param> = value.split(',').map(Param::from).collect();
            let placeholders = vec!["?"; params.len()].join(",");
            Ok(Fragment::bound(
                format!("{column} {keyword} ({placeholders})"),
                params,
            ))
        }
        Operator::Null | Operator::NotNull => {
            let is_null = match value {
                "true" => true,
                "false" => false,
                other => return Err(WeaveError::invalid_value(operator.token(), other)),
            };
            let is_null = if operator == Operator::Null {
                is_null
            } else {
                !is_null
            };
            Ok(Fragment::raw(if is_null {
                format!("{column} IS NULL")
            } else {
                format!("{column} IS NOT NULL")
            }))
        }
        _ => Err(WeaveError::InvalidOperator(operator.token().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(column: &str, op: &str, value: &str) -> Fragment {
        translate(
            column,
            op.parse().unwrap(),
            value,
            &FunctionAllowList::default(),
        )
        .unwrap()
    }

    fn texts(values: &[&str]) -> Vec<Param> {
        values.iter().map(|v| Param::from(*v)).collect()
    }

    #[test]
    fn operator_tokens_round_trip() {
        for op in Operator::ALL {
            assert_eq!(op.token().parse::<Operator>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_operator() {
        let err = "like".parse::<Operator>().unwrap_err();
        assert!(matches!(err, WeaveError::InvalidOperator(ref s) if s == "like"));
        assert!("EQ".parse::<Operator>().is_err());
    }

    #[test]
    fn translation_table() {
        let cases: &[(&str, &str, &str, &[&str])] = &[
            ("eq", "x", "price = ?", &["x"]),
            ("!eq", "x", "price != ?", &["x"]),
            ("lt", "x", "price < ?", &["x"]),
            ("gt", "20.00", "price > ?", &["20.00"]),
            ("le", "x", "price <= ?", &["x"]),
            ("ge", "x", "price >= ?", &["x"]),
            ("sw", "ab", "BINARY price LIKE ?", &["ab%"]),
            ("!sw", "ab", "BINARY price NOT LIKE ?", &["ab%"]),
            ("isw", "ab", "price LIKE ?", &["ab%"]),
            ("!isw", "ab", "price NOT LIKE ?", &["ab%"]),
            ("ew", "ab", "BINARY price LIKE ?", &["%ab"]),
            ("!ew", "ab", "BINARY price NOT LIKE ?", &["%ab"]),
            ("iew", "ab", "price LIKE ?", &["%ab"]),
            ("!iew", "ab", "price NOT LIKE ?", &["%ab"]),
            ("has", "ab", "BINARY price LIKE ?", &["%ab%"]),
            ("!has", "ab", "BINARY price NOT LIKE ?", &["%ab%"]),
            ("ihas", "ab", "price LIKE ?", &["%ab%"]),
            ("!ihas", "ab", "price NOT LIKE ?", &["%ab%"]),
            ("in", "red,blue", "price IN (?,?)", &["red", "blue"]),
            ("!in", "red,blue", "price NOT IN (?,?)", &["red", "blue"]),
            ("null", "true", "price IS NULL", &[]),
            ("!null", "true", "price IS NOT NULL", &[]),
        ];
        assert_eq!(cases.len(), Operator::ALL.len());
        for (op, value, sql, params) in cases {
            let fragment = t("price", op, value);
            assert_eq!(fragment.sql, *sql, "operator {op}");
            assert_eq!(fragment.params, texts(params), "operator {op}");
        }
    }

    #[test]
    fn null_false_is_complement() {
        assert_eq!(t("deleted_at", "null", "false").sql, "deleted_at IS NOT NULL");
        assert_eq!(t("deleted_at", "!null", "false").sql, "deleted_at IS NULL");
    }

    #[test]
    fn null_rejects_other_values() {
        for value in ["", "TRUE", "1", "yes"] {
            let err = translate(
                "deleted_at",
                Operator::Null,
                value,
                &FunctionAllowList::default(),
            )
            .unwrap_err();
            assert!(matches!(err, WeaveError::InvalidValue { .. }), "value {value:?}");
        }
    }

    #[test]
    fn empty_string_comparison_is_literal() {
        let fragment = t("name", "eq", "");
        assert_eq!(fragment.sql, "name = ''");
        assert!(fragment.params.is_empty());
    }

    #[test]
    fn function_passthrough() {
        let fragment = t("created_at", "gt", "NOW()");
        assert_eq!(fragment.sql, "created_at > NOW()");
        assert!(fragment.params.is_empty());

        let fragment = t("name", "has", "CONCAT(prefix, '%')");
        assert_eq!(fragment.sql, "BINARY name LIKE CONCAT(prefix, '%')");
        assert!(fragment.params.is_empty());

        let fragment = t("day", "in", "CURDATE()");
        assert_eq!(fragment.sql, "day IN (CURDATE())");
        assert!(fragment.params.is_empty());
    }

    #[test]
    fn function_lookalikes_are_bound() {
        let fragment = t("note", "eq", "see NOW()");
        assert_eq!(fragment.sql, "note = ?");
        assert_eq!(fragment.params, texts(&["see NOW()"]));

        let fragment = t("note", "eq", "now()");
        assert_eq!(fragment.params, texts(&["now()"]));
    }

    #[test]
    fn in_preserves_order_and_count() {
        let fragment = t("id", "in", "3,1,2,1");
        assert_eq!(fragment.sql, "id IN (?,?,?,?)");
        assert_eq!(fragment.params, texts(&["3", "1", "2", "1"]));
    }

    #[test]
    fn custom_allow_list() {
        let functions = FunctionAllowList::empty().with("GREATEST");
        let fragment = translate("a", Operator::Ge, "GREATEST(b, c)", &functions).unwrap();
        assert_eq!(fragment.sql, "a >= GREATEST(b, c)");
        let fragment = translate("a", Operator::Ge, "NOW()", &functions).unwrap();
        assert_eq!(fragment.sql, "a >= ?");
    }
}
