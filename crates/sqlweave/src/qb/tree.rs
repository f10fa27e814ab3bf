//! Grouped boolean WHERE expressions built incrementally.
//!
//! The tree is a flat sequence of nodes: conditions, group openings and group
//! closings. Each node remembers whether a connector is emitted in front of it,
//! decided when the node is added:
//!
//! - the first node of the tree gets none (it follows ` WHERE `),
//! - a node directly after a group opening gets none,
//! - everything else gets the connector the caller chose.
//!
//! Placeholder values are collected in node order, which is also the order their
//! `?` markers appear in the rendered text.

use crate::condition::Fragment;
use crate::error::{WeaveError, WeaveResult};
use crate::qb::param::ParamList;
use std::fmt;
use std::str::FromStr;

/// Boolean connector between conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl Connector {
    pub fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

impl FromStr for Connector {
    type Err = WeaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Connector::And),
            "OR" => Ok(Connector::Or),
            _ => Err(WeaveError::validation(format!("Invalid connector: '{s}'"))),
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Open { connector: Option<Connector> },
    Close,
    Cond {
        connector: Option<Connector>,
        fragment: Fragment,
    },
}

/// An incrementally built, possibly parenthesized WHERE expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionTree {
    nodes: Vec<Node>,
    depth: usize,
}

impl ConditionTree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of currently open groups.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of placeholder values collected so far.
    pub fn param_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match node {
                Node::Cond { fragment, .. } => fragment.params.len(),
                _ => 0,
            })
            .sum()
    }

    fn leading(&self, connector: Connector) -> Option<Connector> {
        match self.nodes.last() {
            None | Some(Node::Open { .. }) => None,
            Some(_) => Some(connector),
        }
    }

    /// Append a condition joined by `connector`.
    pub fn add_condition(&mut self, connector: Connector, fragment: Fragment) {
        let connector = self.leading(connector);
        self.nodes.push(Node::Cond {
            connector,
            fragment,
        });
    }

    /// Open a parenthesized group joined by `connector`.
    pub fn start_group(&mut self, connector: Connector) {
        let connector = self.leading(connector);
        self.nodes.push(Node::Open { connector });
        self.depth += 1;
    }

    /// Close the innermost open group.
    pub fn end_group(&mut self) -> WeaveResult<()> {
        if self.depth == 0 {
            return Err(WeaveError::UnbalancedGroup(
                "end_group without a matching start_group".to_string(),
            ));
        }
        if matches!(self.nodes.last(), Some(Node::Open { .. })) {
            return Err(WeaveError::EmptyGroup);
        }
        self.nodes.push(Node::Close);
        self.depth -= 1;
        Ok(())
    }

    /// Render as ` WHERE ...` (empty string for an empty tree) plus its values.
    pub fn render(&self) -> WeaveResult<(String, ParamList)> {
        let mut sql = String::new();
        let mut params = ParamList::new();
        self.render_into(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Append ` WHERE ...` to `sql` and the values to `params`.
    pub fn render_into(&self, sql: &mut String, params: &mut ParamList) -> WeaveResult<()> {
        if self.depth != 0 {
            return Err(WeaveError::UnbalancedGroup(format!(
                "{} group(s) left open",
                self.depth
            )));
        }
        if self.nodes.is_empty() {
            return Ok(());
        }

        sql.push_str(" WHERE ");
        for node in &self.nodes {
            match node {
                Node::Open { connector } => {
                    push_connector(sql, *connector);
                    sql.push('(');
                }
                Node::Close => sql.push(')'),
                Node::Cond {
                    connector,
                    fragment,
                } => {
                    push_connector(sql, *connector);
                    sql.push_str(&fragment.sql);
                    params.extend_params(fragment.params.iter().cloned());
                }
            }
        }
        Ok(())
    }
}

fn push_connector(sql: &mut String, connector: Option<Connector>) {
    if let Some(connector) = connector {
        sql.push(' ');
        sql.push_str(connector.as_sql());
        sql.push(' ');
    }
}
