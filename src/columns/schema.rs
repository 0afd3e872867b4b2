//! Column schema: the mapping between table rows and documents

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::errors::{TableError, TableResult};
use crate::options::TableConfig;
use crate::store::Document;

use super::column::{ColumnDefinition, ColumnSpec};

/// A table row keyed by column name
pub type Row = Map<String, Value>;

/// Every backing column of a table, plus the names of its virtual columns
///
/// The identity column is always present, even when the table does not
/// declare it. Query and sort columns are not backed by document fields;
/// they only appear in result rows.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    /// Identity first, then score (if any), then field columns in declaration order
    columns: Vec<ColumnSpec>,
    fields: HashMap<String, usize>,
    query_column: Option<String>,
    sort_column: Option<String>,
}

impl ColumnSchema {
    pub fn build(config: &TableConfig, declared: &[ColumnDefinition]) -> Self {
        let mut columns = vec![ColumnSpec::Identity(config.identity_column.clone())];
        if let Some(score) = &config.score_column {
            columns.push(ColumnSpec::Score(score.clone()));
        }

        let reserved: HashSet<&str> = [
            Some(config.identity_column.as_str()),
            config.score_column.as_deref(),
            config.query_column.as_deref(),
            config.sort_column.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut fields = HashMap::new();
        for definition in declared {
            if reserved.contains(definition.name.as_str()) || fields.contains_key(&definition.name) {
                continue;
            }
            fields.insert(definition.name.clone(), columns.len());
            columns.push(if definition.is_json() {
                ColumnSpec::Json(definition.name.clone())
            } else {
                ColumnSpec::Plain(definition.name.clone())
            });
        }

        Self {
            columns,
            fields,
            query_column: config.query_column.clone(),
            sort_column: config.sort_column.clone(),
        }
    }

    pub fn identity_column(&self) -> &str {
        self.columns[0].name()
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name() == name)
    }

    /// Build a row from a document
    ///
    /// Only requested columns are produced (all of them when `requested` is
    /// `None`). Query and sort literals, when given, are echoed back under
    /// their virtual columns so the host can re-check its own qualifiers.
    pub fn deserialize(
        &self,
        document: &Document,
        requested: Option<&[String]>,
        query: Option<&str>,
        sort: Option<&str>,
    ) -> Row {
        let requested: Option<HashSet<&str>> =
            requested.map(|names| names.iter().map(String::as_str).collect());

        let mut row = Row::new();
        for column in &self.columns {
            if let Some(names) = &requested {
                if !names.contains(column.name()) {
                    continue;
                }
            }
            if let Some(value) = column.deserialize(document) {
                row.insert(column.name().to_string(), value);
            }
        }

        if let (Some(column), Some(query)) = (&self.query_column, query) {
            row.insert(column.clone(), Value::String(query.to_string()));
        }
        if let (Some(column), Some(sort)) = (&self.sort_column, sort) {
            row.insert(column.clone(), Value::String(sort.to_string()));
        }
        row
    }

    /// Split a row into its identity and document body
    pub fn serialize(&self, mut row: Row) -> TableResult<(String, Map<String, Value>)> {
        let identity = row
            .remove(self.identity_column())
            .and_then(|value| identity_text(&value))
            .ok_or_else(|| TableError::missing_identity(self.identity_column()))?;
        Ok((identity, self.serialize_fields(row)))
    }

    /// Document body for a row, ignoring its identity
    ///
    /// Keys without a matching field column are dropped.
    pub fn serialize_fields(&self, row: Row) -> Map<String, Value> {
        row.into_iter()
            .filter_map(|(name, value)| {
                let column = &self.columns[*self.fields.get(&name)?];
                column.serialize(value).map(|value| (name, value))
            })
            .collect()
    }

    /// Row holding nothing but the identity
    pub fn identity_row(&self, identity: &str) -> Row {
        let mut row = Row::new();
        row.insert(
            self.identity_column().to_string(),
            Value::String(identity.to_string()),
        );
        row
    }
}

/// Identity as the store expects it: strings verbatim, other scalars rendered
pub fn identity_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
