use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque continuation cursor for fetching the next result page.
/// `None` at the session level means the result set is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        PageToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageToken {
    fn from(token: &str) -> Self {
        PageToken::new(token)
    }
}

/// A single named cell within a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnValue {
    pub name: String,
    pub value: Value,
}

impl ColumnValue {
    pub fn new(name: &str, value: Value) -> Self {
        ColumnValue {
            name: name.to_string(),
            value,
        }
    }
}

/// One result row: an ordered list of named cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub columns: Vec<ColumnValue>,
}

impl Row {
    pub fn new(columns: Vec<ColumnValue>) -> Self {
        Row { columns }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| &c.value)
    }
}

/// One batch of result rows as returned by the backend, together with the
/// cursor to resume from. `next_token: None` means this was the last page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub rows: Vec<Row>,
    pub next_token: Option<PageToken>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_lookup_is_case_insensitive() {
        let row = Row::new(vec![
            ColumnValue::new("EventTime", json!("2026-08-06T00:00:00Z")),
            ColumnValue::new("severity", json!(5)),
        ]);

        assert_eq!(row.get("eventtime"), Some(&json!("2026-08-06T00:00:00Z")));
        assert_eq!(row.get("SEVERITY"), Some(&json!(5)));
        assert_eq!(row.get("missing"), None);
    }
}
