//! Column references and JSON-path addressing.
//!
//! Grammar: `[table.]column[->key[->key...]][ AS alias]`.
//!
//! `.` before the first `->` only ever separates a table qualifier from a column.
//! After the first `->` the remainder is a key path inside a JSON column; both `->`
//! and `.` separate keys there and are normalized to one dotted path:
//!
//! ```text
//! supplier->address->city   =>  products.supplier->>'$.address.city'
//! supplier->address.city    =>  products.supplier->>'$.address.city'
//! items->0->sku             =>  products.items->>'$[0].sku'
//! ```
//!
//! Extraction always uses `->>` (text), so the result compares and `LIKE`s the
//! same way a plain text column does.

use crate::config::QbConfig;
use crate::error::{WeaveError, WeaveResult};
use crate::ident::{Ident, validate_alias};

/// A column expression as used in projections, filters, grouping and ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnExpr {
    /// `*` or `table.*` (projection and `COUNT(*)` only).
    Wildcard(Option<Ident>),
    /// A plain, possibly qualified, column.
    Column { ident: Ident, alias: Option<String> },
    /// Text extraction of `path` inside the JSON column `base`.
    Json {
        base: Ident,
        path: Vec<String>,
        alias: Option<String>,
    },
    /// An allow-listed function call embedded verbatim (projection only).
    Function { call: String, alias: Option<String> },
}

impl ColumnExpr {
    /// Resolve a column used in a filter, grouping or ordering position.
    ///
    /// Aliases, wildcards and function calls are rejected here.
    pub fn parse_column(raw: &str, table: Option<&Ident>, config: &QbConfig) -> WeaveResult<Self> {
        parse_expr(raw.trim(), None, table, config)
    }

    /// Resolve a projected column, including an optional ` AS alias` suffix.
    pub fn parse_projection(
        raw: &str,
        table: Option<&Ident>,
        config: &QbConfig,
    ) -> WeaveResult<Self> {
        let raw = raw.trim();
        let (expr, alias) = split_alias(raw);

        if expr == "*" && alias.is_none() {
            return Ok(ColumnExpr::Wildcard(None));
        }
        if let Some(prefix) = expr.strip_suffix(".*") {
            if alias.is_some() {
                return Err(WeaveError::validation("Wildcard projection cannot be aliased"));
            }
            return Ok(ColumnExpr::Wildcard(Some(Ident::parse(prefix)?)));
        }
        if config.functions.passthrough(expr)? {
            return Ok(ColumnExpr::Function {
                call: expr.to_string(),
                alias,
            });
        }

        parse_expr(expr, alias, table, config)
    }

    /// Resolve the argument of an aggregate: `*` or a column.
    pub fn parse_aggregate_arg(
        raw: &str,
        table: Option<&Ident>,
        config: &QbConfig,
    ) -> WeaveResult<Self> {
        if raw.trim() == "*" {
            return Ok(ColumnExpr::Wildcard(None));
        }
        Self::parse_column(raw, table, config)
    }

    /// The SQL expression, without any alias.
    pub fn to_sql(&self) -> String {
        match self {
            ColumnExpr::Wildcard(None) => "*".to_string(),
            ColumnExpr::Wildcard(Some(table)) => format!("{}.*", table.to_sql()),
            ColumnExpr::Column { ident, .. } => ident.to_sql(),
            ColumnExpr::Json { base, path, .. } => {
                format!("{}->>'{}'", base.to_sql(), json_path(path))
            }
            ColumnExpr::Function { call, .. } => call.clone(),
        }
    }

    /// The SQL used in a SELECT list: expression plus alias where one applies.
    ///
    /// JSON extractions without an explicit alias get a generated one (see
    /// [`ColumnExpr::output_key`]) so the result key is predictable.
    pub fn to_projection_sql(&self) -> String {
        let expr = self.to_sql();
        match self.output_alias() {
            Some(alias) => format!("{expr} AS {}", alias_sql(&alias)),
            None => expr,
        }
    }

    /// The key this expression produces in a result row, if it is known.
    pub fn output_key(&self) -> Option<String> {
        match self {
            ColumnExpr::Wildcard(_) => None,
            ColumnExpr::Column { ident, alias } => {
                Some(alias.clone().unwrap_or_else(|| ident.name().to_string()))
            }
            ColumnExpr::Json { .. } | ColumnExpr::Function { .. } => self.output_alias(),
        }
    }

    /// Whether the caller supplied an explicit alias.
    pub fn has_explicit_alias(&self) -> bool {
        match self {
            ColumnExpr::Wildcard(_) => false,
            ColumnExpr::Column { alias, .. }
            | ColumnExpr::Json { alias, .. }
            | ColumnExpr::Function { alias, .. } => alias.is_some(),
        }
    }

    fn output_alias(&self) -> Option<String> {
        match self {
            ColumnExpr::Wildcard(_) => None,
            ColumnExpr::Column { alias, .. } | ColumnExpr::Function { alias, .. } => alias.clone(),
            ColumnExpr::Json { base, path, alias } => Some(
                alias
                    .clone()
                    .unwrap_or_else(|| format!("{}_{}", base.name(), path.join("_"))),
            ),
        }
    }
}

fn parse_expr(
    expr: &str,
    alias: Option<String>,
    table: Option<&Ident>,
    config: &QbConfig,
) -> WeaveResult<ColumnExpr> {
    if expr.is_empty() {
        return Err(WeaveError::validation("Column cannot be empty"));
    }

    if let Some((base, path)) = expr.split_once("->") {
        let base = qualify(Ident::parse(base.trim())?, table, config);
        // Tolerate the `->>` spelling of the same path.
        let path = parse_key_path(path.strip_prefix('>').unwrap_or(path))?;
        return Ok(ColumnExpr::Json { base, path, alias });
    }

    let ident = qualify(Ident::parse(expr)?, table, config);
    Ok(ColumnExpr::Column { ident, alias })
}

fn qualify(ident: Ident, table: Option<&Ident>, config: &QbConfig) -> Ident {
    match table {
        Some(table) if config.qualify_columns && !ident.is_qualified() => {
            ident.qualified_by(table)
        }
        _ => ident,
    }
}

fn parse_key_path(path: &str) -> WeaveResult<Vec<String>> {
    let mut keys = Vec::new();
    for segment in path.split("->").flat_map(|s| s.split('.')) {
        let key = segment.trim();
        if key.is_empty() {
            return Err(WeaveError::validation(format!(
                "Empty key in JSON path '{path}'"
            )));
        }
        if !key.chars().all(|c| c == '_' || c.is_ascii_alphanumeric()) {
            return Err(WeaveError::validation(format!(
                "Invalid key '{key}' in JSON path '{path}'"
            )));
        }
        keys.push(key.to_string());
    }
    Ok(keys)
}

/// `["address", "0", "city"]` => `$.address[0].city`
fn json_path(keys: &[String]) -> String {
    let mut out = String::from("$");
    for key in keys {
        if key.chars().all(|c| c.is_ascii_digit()) {
            out.push('[');
            out.push_str(key);
            out.push(']');
        } else {
            out.push('.');
            out.push_str(key);
        }
    }
    out
}

/// Split a trailing ` AS alias` off a projection.
///
/// The suffix only counts as an alias when it is a bare identifier, so text such
/// as `CONCAT(a, ' as ', b)` is left alone.
fn split_alias(raw: &str) -> (&str, Option<String>) {
    let lower = raw.to_ascii_lowercase();
    if let Some(idx) = lower.rfind(" as ") {
        let alias = raw[idx + 4..].trim();
        if validate_alias(alias).is_ok() {
            return (raw[..idx].trim_end(), Some(alias.to_string()));
        }
    }
    (raw, None)
}

fn alias_sql(alias: &str) -> String {
    if validate_alias(alias).is_ok() {
        alias.to_string()
    } else {
        format!("`{}`", alias.replace('`', "``"))
    }
}
