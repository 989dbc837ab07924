use crate::db::Value;

/// One result row: aliases mapped to values, in projection order.
///
/// Formatters coerce values in place (date formatting, list splitting)
/// before handing rows to an encoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    entries: Vec<(String, Value)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, alias: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, alias: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == alias)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    /// Sets `alias`, replacing an existing value in place or appending.
    pub fn insert(&mut self, alias: impl Into<String>, value: Value) {
        let alias = alias.into();
        match self.get_mut(&alias) {
            Some(existing) => *existing = value,
            None => self.entries.push((alias, value)),
        }
    }

    pub fn remove(&mut self, alias: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(name, _)| name == alias)?;
        Some(self.entries.remove(index).1)
    }

    /// First column in projection order.
    pub fn first(&self) -> Option<(&str, &Value)> {
        self.entries
            .first()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for ResultRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (alias, value) in iter {
            row.insert(alias, value);
        }
        row
    }
}
