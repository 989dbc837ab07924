//! Field descriptions and the declaration grammar.
//!
//! A field is declared as `Type`, `List (<delimiter>) of Type`, optionally
//! followed by `(hidden)`; e.g. `List (;) of Page (hidden)`.

use crate::error::{ExportError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Declared semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Text,
    Page,
    Integer,
    Float,
    Date,
    Datetime,
    Boolean,
    Coordinates,
    Url,
    Email,
    File,
    Wikitext,
    Searchtext,
}

impl FieldType {
    /// Parses a type name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "string" => Some(Self::String),
            "text" => Some(Self::Text),
            "page" => Some(Self::Page),
            "integer" => Some(Self::Integer),
            "float" | "number" => Some(Self::Float),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::Datetime),
            "boolean" => Some(Self::Boolean),
            "coordinates" => Some(Self::Coordinates),
            "url" => Some(Self::Url),
            "email" => Some(Self::Email),
            "file" => Some(Self::File),
            "wikitext" => Some(Self::Wikitext),
            "searchtext" => Some(Self::Searchtext),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Text => "Text",
            Self::Page => "Page",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Date => "Date",
            Self::Datetime => "Datetime",
            Self::Boolean => "Boolean",
            Self::Coordinates => "Coordinates",
            Self::Url => "URL",
            Self::Email => "Email",
            Self::File => "File",
            Self::Wikitext => "Wikitext",
            Self::Searchtext => "Searchtext",
        }
    }

    /// True for `Date` and `Datetime`.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date | Self::Datetime)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved description of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub field_type: FieldType,
    pub is_list: bool,
    /// Delimiter between list members; only meaningful when `is_list`.
    pub delimiter: String,
    pub is_hidden: bool,
}

impl FieldDescription {
    /// A plain, visible, single-valued field.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            is_list: false,
            delimiter: String::new(),
            is_hidden: false,
        }
    }

    /// A list field split on `delimiter`.
    pub fn list(field_type: FieldType, delimiter: impl Into<String>) -> Self {
        Self {
            field_type,
            is_list: true,
            delimiter: delimiter.into(),
            is_hidden: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    /// Delimiter for list members, defaulting to a comma.
    pub fn list_delimiter(&self) -> &str {
        if self.delimiter.is_empty() {
            ","
        } else {
            &self.delimiter
        }
    }

    /// Whether queries must request the stored `__full` column rather than
    /// the plain one.
    pub fn needs_full_column(&self) -> bool {
        self.is_list || self.field_type == FieldType::Coordinates
    }

    /// Whether the field carries a precision companion.
    pub fn is_date(&self) -> bool {
        !self.is_list && self.field_type.is_date()
    }

    /// Parses a type declaration such as `List (;) of String (hidden)`.
    pub fn parse(declaration: &str) -> Result<Self> {
        static LIST_RE: OnceLock<Regex> = OnceLock::new();
        static HIDDEN_RE: OnceLock<Regex> = OnceLock::new();
        let list_re = LIST_RE.get_or_init(|| {
            Regex::new(r"(?i)^list\s*\((.*)\)\s*of\s+(.+)$").expect("valid list regex")
        });
        let hidden_re = HIDDEN_RE
            .get_or_init(|| Regex::new(r"(?i)\s*\(\s*hidden\s*\)\s*$").expect("valid hidden regex"));

        let trimmed = declaration.trim();
        let is_hidden = hidden_re.is_match(trimmed);
        let body = hidden_re.replace(trimmed, "");

        let (type_name, list_delimiter) = match list_re.captures(&body) {
            Some(caps) => (caps[2].to_string(), Some(caps[1].to_string())),
            None => (body.to_string(), None),
        };

        let field_type = FieldType::parse(&type_name).ok_or_else(|| {
            ExportError::configuration(format!("Unknown field type \"{}\"", type_name.trim()))
        })?;

        let mut description = match list_delimiter {
            Some(delimiter) => Self::list(field_type, delimiter),
            None => Self::new(field_type),
        };
        description.is_hidden = is_hidden;
        Ok(description)
    }
}

impl fmt::Display for FieldDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_list {
            write!(f, "List ({}) of {}", self.delimiter, self.field_type)?;
        } else {
            write!(f, "{}", self.field_type)?;
        }
        if self.is_hidden {
            write!(f, " (hidden)")?;
        }
        Ok(())
    }
}

/// Parses a `name=Type` declaration.
pub fn parse_field_declaration(declaration: &str) -> Result<(String, FieldDescription)> {
    let (name, type_decl) = declaration.split_once('=').ok_or_else(|| {
        ExportError::configuration(format!(
            "Invalid field declaration \"{declaration}\"; expected name=Type"
        ))
    })?;

    let name = name.trim();
    if name.is_empty() || name.starts_with('_') {
        return Err(ExportError::configuration(format!(
            "Invalid field name \"{name}\""
        )));
    }

    Ok((name.to_string(), FieldDescription::parse(type_decl)?))
}
