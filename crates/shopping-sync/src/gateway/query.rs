//! Query Model
//!
//! Backend-neutral description of reads and writes against a named
//! collection. Bindings render it to their own wire format.

use serde_json::Value;

use super::feed::ChangeKind;

/// Row filter; only equality and set membership are needed
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::In { column, .. } => column,
        }
    }

    /// Evaluate against a JSON row; a missing column reads as null
    pub fn matches(&self, row: &Value) -> bool {
        let cell = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Filter::Eq { value, .. } => cell == value,
            Filter::In { values, .. } => values.contains(cell),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Foreign key expansion: `row[alias] = table row whose id = row[foreign_key]`
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub alias: String,
    pub table: String,
    pub foreign_key: String,
}

/// A read against one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub relations: Vec<Relation>,
    pub limit: Option<usize>,
    /// Exactly one row expected; anything else is an error
    pub single: bool,
}

impl Select {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            relations: Vec::new(),
            limit: None,
            single: false,
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn embed(mut self, alias: &str, table: &str, foreign_key: &str) -> Self {
        self.relations.push(Relation {
            alias: alias.to_string(),
            table: table.to_string(),
            foreign_key: foreign_key.to_string(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }
}

/// A write against one collection
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Server assigns `id` and `created_at` when omitted
    Insert { table: String, row: Value },
    /// Partial field set applied to every matching row
    Update { table: String, filter: Filter, patch: Value },
    Delete { table: String, filter: Filter },
}

impl Mutation {
    pub fn table(&self) -> &str {
        match self {
            Mutation::Insert { table, .. }
            | Mutation::Update { table, .. }
            | Mutation::Delete { table, .. } => table,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Mutation::Insert { .. } => ChangeKind::Insert,
            Mutation::Update { .. } => ChangeKind::Update,
            Mutation::Delete { .. } => ChangeKind::Delete,
        }
    }
}
