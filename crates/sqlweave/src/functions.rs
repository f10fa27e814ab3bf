//! Allow-list of SQL functions that may be passed through verbatim.
//!
//! A filter value such as `NOW()` or a projection such as `COUNT(*) AS n` is
//! embedded into the statement as-is instead of being bound as a placeholder,
//! but only when it starts with `NAME(` for a name in this list. Names are
//! case-sensitive and matched as a prefix of the value, never as a substring.
//!
//! Passthrough values are trusted input: whatever follows `NAME(` reaches the
//! database unparameterized. The text is still checked for shape before it is
//! embedded: quotes and parentheses must balance, and no `?` marker, `;` or
//! comment may appear outside quoted text, so the placeholder list stays aligned
//! with the statement.

use crate::error::{WeaveError, WeaveResult};
use std::collections::BTreeSet;

/// Function names recognized out of the box.
pub const DEFAULT_FUNCTIONS: &[&str] = &[
    // aggregates
    "AVG",
    "COUNT",
    "GROUP_CONCAT",
    "MAX",
    "MIN",
    "SUM",
    // date / time
    "CURDATE",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURTIME",
    "DATE",
    "DATE_ADD",
    "DATE_FORMAT",
    "DATE_SUB",
    "FROM_UNIXTIME",
    "NOW",
    "UNIX_TIMESTAMP",
    "UTC_TIMESTAMP",
    // strings
    "CONCAT",
    "LENGTH",
    "LOWER",
    "SUBSTRING",
    "TRIM",
    "UPPER",
    // numeric / misc
    "ABS",
    "CEIL",
    "COALESCE",
    "FLOOR",
    "IFNULL",
    "ROUND",
    // json
    "JSON_CONTAINS",
    "JSON_EXTRACT",
    "JSON_LENGTH",
];

/// Set of recognized function names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionAllowList {
    names: BTreeSet<String>,
}

impl Default for FunctionAllowList {
    fn default() -> Self {
        Self::from_names(DEFAULT_FUNCTIONS.iter().copied())
    }
}

impl FunctionAllowList {
    /// An allow-list with no entries: nothing is passed through.
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Build an allow-list from explicit names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a function name.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    /// Add a function name in place.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Whether `name` is allow-listed.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Iterate over the names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Whether `value` is a call to an allow-listed function (`NAME(...`).
    pub fn is_function_call(&self, value: &str) -> bool {
        match value.find('(') {
            Some(idx) => idx > 0 && self.names.contains(&value[..idx]),
            None => false,
        }
    }

    /// `Ok(true)` for a well-formed allow-listed call, `Ok(false)` for a value
    /// that is not a call at all, and an error for a malformed call.
    pub fn passthrough(&self, value: &str) -> WeaveResult<bool> {
        if !self.is_function_call(value) {
            return Ok(false);
        }
        check_call_text(value)?;
        Ok(true)
    }
}

fn check_call_text(value: &str) -> WeaveResult<()> {
    let reject = |problem: &str| -> WeaveResult<()> {
        Err(WeaveError::validation(format!(
            "Function call '{value}' {problem}"
        )))
    };

    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if let Some(open) = quote {
            if c == '\\' {
                chars.next();
            } else if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' if depth == 0 => return reject("closes a parenthesis it never opened"),
            ')' => depth -= 1,
            '?' => return reject("contains a placeholder marker"),
            ';' => return reject("contains a statement separator"),
            '#' => return reject("contains a comment"),
            '-' if chars.peek() == Some(&'-') => return reject("contains a comment"),
            '/' if chars.peek() == Some(&'*') => return reject("contains a comment"),
            _ => {}
        }
    }

    if quote.is_some() {
        return reject("has an unclosed quote");
    }
    if depth != 0 {
        return reject("has unbalanced parentheses");
    }
    Ok(())
}
