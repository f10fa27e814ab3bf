//! TOML description of a SELECT query.
//!
//! ```toml
//! table = "products"
//! select = ["name", "supplier->email"]
//! order_by = ["-price"]
//! limit = 10
//!
//! [[join]]
//! kind = "left"
//! table = "suppliers"
//! left = "supplier_id"
//! right = "id"
//!
//! [[where]]
//! column = "price"
//! op = "gt"
//! value = "20.00"
//!
//! [[where]]
//! start_group = "and"
//!
//! [[where]]
//! column = "color"
//! op = "eq"
//! value = "red"
//!
//! [[where]]
//! column = "color"
//! op = "eq"
//! value = "blue"
//! connector = "or"
//!
//! [[where]]
//! end_group = true
//! ```

use serde::Deserialize;
use sqlweave::{Connector, QbConfig, SelectQb};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryFile {
    pub table: String,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub select: Vec<String>,
    #[serde(default, rename = "join")]
    pub joins: Vec<JoinEntry>,
    #[serde(default, rename = "where")]
    pub conditions: Vec<WhereEntry>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinEntry {
    #[serde(default = "default_join_kind")]
    pub kind: String,
    pub table: String,
    pub left: String,
    pub right: String,
}

fn default_join_kind() -> String {
    "INNER".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WhereEntry {
    Condition(ConditionEntry),
    StartGroup(StartGroupEntry),
    EndGroup(EndGroupEntry),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionEntry {
    pub column: String,
    pub op: String,
    /// Strings are used as-is, numbers and booleans are stringified and arrays
    /// are joined with `,` (for `in` / `!in`).
    #[serde(default)]
    pub value: Option<toml::Value>,
    pub connector: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartGroupEntry {
    pub start_group: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndGroupEntry {
    pub end_group: bool,
}

impl QueryFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read query file {}: {e}", path.display()))?;
        Self::parse(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse query file {}: {e}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Drive a SELECT builder through every entry, in file order.
    pub fn to_builder(&self, config: Arc<QbConfig>) -> anyhow::Result<SelectQb> {
        let mut qb = SelectQb::with_config(&self.table, config);
        if self.distinct {
            qb = qb.distinct();
        }
        if !self.select.is_empty() {
            qb = qb.select(&as_strs(&self.select));
        }
        for join in &self.joins {
            qb = qb.join(&join.kind, &join.table, &join.left, &join.right);
        }
        for entry in &self.conditions {
            qb = match entry {
                WhereEntry::Condition(cond) => {
                    let connector = match &cond.connector {
                        Some(raw) => raw.parse::<Connector>()?,
                        None => Connector::And,
                    };
                    let value = cond.value.as_ref().map(value_text).transpose()?;
                    qb.filter_with(connector, &cond.column, &cond.op, value.unwrap_or_default())
                }
                WhereEntry::StartGroup(group) => qb.start_group(group.start_group.parse()?),
                WhereEntry::EndGroup(EndGroupEntry { end_group: true }) => qb.end_group(),
                WhereEntry::EndGroup(_) => anyhow::bail!("end_group must be true"),
            };
        }
        if !self.group_by.is_empty() {
            qb = qb.group_by(&as_strs(&self.group_by));
        }
        if !self.order_by.is_empty() {
            qb = qb.order_by(&as_strs(&self.order_by));
        }
        if let Some(limit) = self.limit {
            qb = qb.limit(limit);
        }
        if let Some(offset) = self.offset {
            qb = qb.offset(offset);
        }
        Ok(qb)
    }
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

fn value_text(value: &toml::Value) -> anyhow::Result<String> {
    Ok(match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Array(items) => items
            .iter()
            .map(value_text)
            .collect::<anyhow::Result<Vec<_>>>()?
            .join(","),
        other => anyhow::bail!("unsupported condition value: {other}"),
    })
}
