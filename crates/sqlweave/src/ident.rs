//! Safe SQL identifier handling.
//!
//! [`Ident`] represents a SQL identifier (schema/table/column) in dotted notation,
//! with optional backtick quoting:
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `` ` `` as ``` `` ```
//!
//! # Example
//! ```ignore
//! use sqlweave::Ident;
//!
//! let t = Ident::parse("shop.products")?;
//! let c = Ident::parse("`order lines`.qty")?;
//! # Ok::<(), sqlweave::WeaveError>(())
//! ```

use crate::error::{WeaveError, WeaveResult};

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Backtick-quoted identifier: allows any characters except NUL.
    Quoted(String),
}

impl IdentPart {
    /// The identifier text without quoting.
    pub fn name(&self) -> &str {
        match self {
            IdentPart::Unquoted(s) | IdentPart::Quoted(s) => s,
        }
    }
}

/// A SQL identifier (column, table, or schema name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse `part[.part...]`, where each part is a bare name or a backtick-quoted one.
    ///
    /// ``shop.`Order Lines`.qty`` has three parts.
    pub fn parse(s: &str) -> WeaveResult<Self> {
        if s.is_empty() {
            return Err(WeaveError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(WeaveError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut rest = s;
        loop {
            let (part, tail) = match rest.strip_prefix('`') {
                Some(quoted) => scan_quoted(quoted)?,
                None => scan_bare(rest, s)?,
            };
            parts.push(part);
            match tail.strip_prefix('.') {
                Some("") => return Err(WeaveError::validation("Trailing '.' in identifier")),
                Some(next) => rest = next,
                None if tail.is_empty() => break,
                None => {
                    return Err(WeaveError::validation(format!(
                        "Unexpected text after identifier part in '{s}'"
                    )));
                }
            }
        }

        Ok(Self { parts })
    }

    /// Whether the identifier carries a table (or schema) qualifier.
    pub fn is_qualified(&self) -> bool {
        self.parts.len() > 1
    }

    /// The last part, i.e. the bare column or table name.
    pub fn name(&self) -> &str {
        self.parts.last().map(IdentPart::name).unwrap_or_default()
    }

    /// Prefix this identifier with `qualifier` (e.g. a table).
    pub fn qualified_by(&self, qualifier: &Ident) -> Ident {
        let mut parts = qualifier.parts.clone();
        parts.extend(self.parts.iter().cloned());
        Ident { parts }
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('`');
                    out.push_str(&s.replace('`', "``"));
                    out.push('`');
                }
            }
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Scan a quoted part; `input` starts right after the opening backtick.
fn scan_quoted(input: &str) -> WeaveResult<(IdentPart, &str)> {
    let mut name = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c != '`' {
            name.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '`'))) {
            chars.next();
            name.push('`');
            continue;
        }
        if name.is_empty() {
            return Err(WeaveError::validation("Empty quoted identifier"));
        }
        return Ok((IdentPart::Quoted(name), &input[idx + 1..]));
    }
    Err(WeaveError::validation("Unclosed quoted identifier"))
}

/// Scan a bare part up to the next `.` (or the end).
fn scan_bare<'a>(input: &'a str, whole: &str) -> WeaveResult<(IdentPart, &'a str)> {
    let end = input.find('.').unwrap_or(input.len());
    let name = &input[..end];
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(WeaveError::validation(format!(
            "Empty identifier segment in '{whole}'"
        )));
    };
    let bad = if first == '_' || first.is_ascii_alphabetic() {
        chars.find(|&c| !(c == '_' || c == '$' || c.is_ascii_alphanumeric()))
    } else {
        Some(first)
    };
    if let Some(c) = bad {
        return Err(WeaveError::validation(format!(
            "Invalid character in identifier '{whole}': '{c}'"
        )));
    }
    Ok((IdentPart::Unquoted(name.to_string()), &input[end..]))
}

/// Check a bare alias / output name: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn validate_alias(alias: &str) -> WeaveResult<()> {
    let mut chars = alias.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    if !starts_ok || !chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        return Err(WeaveError::validation(format!("Invalid alias: '{alias}'")));
    }
    Ok(())
}
