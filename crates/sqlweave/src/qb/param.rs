//! Bound values and the ordered placeholder list.

use serde::Serialize;

/// A value bound to one `?` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Param {
    /// Text form, or `None` for non-text values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render as a SQL literal.
    ///
    /// Only meant for logs and debugging output; execution always binds.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Param::Null => "NULL".to_string(),
            Param::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Param::Int(i) => i.to_string(),
            Param::Float(f) => f.to_string(),
            Param::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<&String> for Param {
    fn from(v: &String) -> Self {
        Param::Text(v.clone())
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(i64::from(v))
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<u32> for Param {
    fn from(v: u32) -> Self {
        Param::Int(i64::from(v))
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::Null, Into::into)
    }
}

/// Ordered placeholder values: the i-th entry binds the i-th `?`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based position.
    pub fn push(&mut self, value: impl Into<Param>) -> usize {
        self.params.push(value.into());
        self.params.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Borrow the values in binding order.
    pub fn as_slice(&self) -> &[Param] {
        &self.params
    }

    /// Append another list's values after this list's values.
    pub fn extend(&mut self, other: &ParamList) {
        self.params.extend(other.params.iter().cloned());
    }

    /// Append values from an iterator.
    pub fn extend_params(&mut self, params: impl IntoIterator<Item = Param>) {
        self.params.extend(params);
    }

    /// Consume into the underlying vector.
    pub fn into_vec(self) -> Vec<Param> {
        self.params
    }
}

impl From<Vec<Param>> for ParamList {
    fn from(params: Vec<Param>) -> Self {
        Self { params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_position() {
        let mut list = ParamList::new();
        assert_eq!(list.push("a"), 1);
        assert_eq!(list.push(2i64), 2);
        assert_eq!(list.as_slice(), &[Param::from("a"), Param::Int(2)]);
    }

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Param::from(None::<i64>), Param::Null);
        assert_eq!(Param::from(Some("x")), Param::Text("x".into()));
    }

    #[test]
    fn literal_escapes_quotes() {
        assert_eq!(Param::from("O'Brien").to_sql_literal(), "'O''Brien'");
        assert_eq!(Param::Null.to_sql_literal(), "NULL");
    }

    #[test]
    fn serializes_untagged() {
        let list = vec![Param::from("20.00"), Param::Int(3), Param::Null];
        assert_eq!(
            serde_json::to_string(&list).unwrap(),
            r#"["20.00",3,null]"#
        );
    }
}
