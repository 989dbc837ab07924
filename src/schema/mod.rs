//! Schema catalog: table name → field name → field description.
//!
//! The catalog is read-only once built and drives query building, column
//! classification and formatting.

mod field;

pub use field::{parse_field_declaration, FieldDescription, FieldType};

use crate::config::TableDeclaration;
use crate::db::{DataStore, Value};
use crate::error::{ExportError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Page-identity fields every table carries, with their types.
pub const PAGE_IDENTITY_FIELDS: &[(&str, FieldType)] = &[
    ("_pageName", FieldType::String),
    ("_pageTitle", FieldType::String),
    ("_pageNamespace", FieldType::Integer),
    ("_pageID", FieldType::Integer),
    ("_ID", FieldType::Integer),
];

/// Declared fields of one table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSchema {
    pub name: String,
    fields: Vec<(String, FieldDescription)>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a declared field.
    pub fn with_field(mut self, name: impl Into<String>, description: FieldDescription) -> Self {
        self.fields.push((name.into(), description));
        self
    }

    /// Builds a table from `name=Type` declarations.
    pub fn from_declarations<S: AsRef<str>>(name: &str, declarations: &[S]) -> Result<Self> {
        let mut table = Self::new(name);
        for declaration in declarations {
            let (field_name, description) = parse_field_declaration(declaration.as_ref())?;
            if table.declared_field(&field_name).is_some() {
                return Err(ExportError::configuration(format!(
                    "Field \"{field_name}\" is declared twice in table \"{name}\""
                )));
            }
            table.fields.push((field_name, description));
        }
        Ok(table)
    }

    /// Declared (non page-identity) fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDescription)> {
        self.fields.iter().map(|(name, d)| (name.as_str(), d))
    }

    fn declared_field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, d)| d)
    }

    /// Looks up a field, including the implicit page-identity fields.
    pub fn field(&self, name: &str) -> Option<FieldDescription> {
        if let Some(description) = self.declared_field(name) {
            return Some(description.clone());
        }
        PAGE_IDENTITY_FIELDS
            .iter()
            .find(|(identity, _)| *identity == name)
            .map(|(_, field_type)| FieldDescription::new(*field_type))
    }
}

/// All declared tables.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    tables: HashMap<String, TableSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a table.
    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, table: TableSchema) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Builds the catalog from `[[tables]]` config entries.
    pub fn from_declarations(declarations: &[TableDeclaration]) -> Result<Self> {
        let mut catalog = Self::new();
        for declaration in declarations {
            catalog.insert(TableSchema::from_declarations(
                &declaration.name,
                &declaration.fields,
            )?);
        }
        Ok(catalog)
    }

    /// Loads declarations stored in the `cargo_tables` table, whose
    /// `field_declarations` column holds `|`-separated `name=Type` entries.
    ///
    /// Tables already present in the catalog are replaced.
    pub async fn load_from_store(&mut self, store: &dyn DataStore) -> Result<usize> {
        let result = store
            .execute_query("SELECT main_table, field_declarations FROM cargo_tables")
            .await?;

        let mut loaded = 0;
        for row in &result.rows {
            let (Some(Value::String(name)), Some(declarations)) = (row.first(), row.get(1)) else {
                continue;
            };
            let declarations = declarations.to_cell_string("");
            let entries: Vec<&str> = declarations
                .split('|')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .collect();
            self.insert(TableSchema::from_declarations(name, &entries)?);
            loaded += 1;
        }

        debug!("Loaded {} table schemas from store", loaded);
        Ok(loaded)
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Looks up a table, failing with a configuration error when undeclared.
    pub fn require_table(&self, name: &str) -> Result<&TableSchema> {
        self.table(name)
            .ok_or_else(|| ExportError::configuration(format!("Table \"{name}\" does not exist")))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
