//! REST query description.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::restquery::action::Action;

/// A projected field of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column or attribute name.
    pub name: String,
}

impl Field {
    /// Create a field by name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A sort criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Column or attribute name.
    pub name: String,
    /// Ascending when true, descending otherwise.
    pub asc: bool,
}

impl Sort {
    /// Ascending sort on a field.
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asc: true,
        }
    }

    /// Descending sort on a field.
    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            asc: false,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.asc {
            write!(f, "asc({})", self.name)
        } else {
            write!(f, "desc({})", self.name)
        }
    }
}

/// A filter predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Column or attribute name.
    pub name: String,
    /// Comparison operator, as the REST layer spells it.
    pub op: String,
    /// Literal operand.
    pub value: String,
}

impl Filter {
    /// Create a filter predicate.
    pub fn new(name: impl Into<String>, op: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]:{}", self.name, self.op, self.value)
    }
}

/// Description of one REST operation against a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestQuery {
    /// The requested action.
    pub action: Action,
    /// Target resource (collection) name.
    pub resource: String,
    /// Key narrowing the query to a single resource, if any.
    pub key: Option<String>,
    /// Raw request body, empty when the action carries none.
    pub body: String,
    /// Result page offset.
    pub offset: u64,
    /// Result page size, 0 meaning unbounded.
    pub limit: u64,
    /// Projected fields, empty meaning all.
    pub fields: Vec<Field>,
    /// Sort criteria, applied in order.
    pub sorts: Vec<Sort>,
    /// Filter predicate, if any.
    pub filter: Option<Filter>,
}

impl RestQuery {
    /// Create a query for a resource collection.
    pub fn new(action: Action, resource: impl Into<String>) -> Self {
        Self {
            action,
            resource: resource.into(),
            key: None,
            body: String::new(),
            offset: 0,
            limit: 0,
            fields: Vec::new(),
            sorts: Vec::new(),
            filter: None,
        }
    }

    /// Target a single resource by key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach a raw request body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the result page.
    pub fn with_page(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Project a field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a sort criterion.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    /// Set the filter predicate.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl fmt::Display for RestQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key) = &self.key {
            write!(
                f,
                "{}: {}[{}] fields={}",
                self.action,
                self.resource,
                key,
                display_list(&self.fields)
            )?;
        } else {
            write!(
                f,
                "{}: {} offset={} limit={} fields={} sorts={}",
                self.action,
                self.resource,
                self.offset,
                self.limit,
                display_list(&self.fields),
                display_list(&self.sorts)
            )?;
        }
        if let Some(filter) = &self.filter {
            write!(f, " filter={}", filter)?;
        }
        Ok(())
    }
}

fn display_list<T: fmt::Display>(items: &[T]) -> String {
    let joined = items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{}]", joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_key() {
        let query = RestQuery::new(Action::GET, "todos")
            .with_key("42")
            .with_field(Field::new("id"))
            .with_field(Field::new("text"));
        assert_eq!(query.to_string(), "get: todos[42] fields=[id text]");
    }

    #[test]
    fn test_display_collection() {
        let query = RestQuery::new(Action::GET, "todos")
            .with_page(10, 20)
            .with_sort(Sort::asc("created"))
            .with_sort(Sort::desc("id"));
        assert_eq!(
            query.to_string(),
            "get: todos offset=10 limit=20 fields=[] sorts=[asc(created) desc(id)]"
        );
    }

    #[test]
    fn test_display_with_filter() {
        let query =
            RestQuery::new(Action::GET, "todos").with_filter(Filter::new("done", "eq", "false"));
        assert!(query.to_string().ends_with("filter=done[eq]:false"));
    }

    #[test]
    fn test_sort_display() {
        assert_eq!(Sort::asc("name").to_string(), "asc(name)");
        assert_eq!(Sort::desc("name").to_string(), "desc(name)");
    }

    #[test]
    fn test_serde_roundtrip() {
        let query = RestQuery::new(Action::POST, "todos")
            .with_body(r#"{"text":"a"}"#)
            .with_filter(Filter::new("done", "eq", "false"));
        let encoded = serde_json::to_string(&query).unwrap();
        let decoded: RestQuery = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, query);
    }
}
