//! The `<cols>` mapping table of a connection.

use super::collection::XmlEntity;
use crate::error::FileError;
use crate::xml::{Element, Node};

/// `<map key='[AMOUNT]' value='[Custom SQL Query].[AMOUNT_USD]' />`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingCol {
    pub key: String,
    pub value: String,
}

impl MappingCol {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl XmlEntity for MappingCol {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        match (element.attr("key"), element.attr("value")) {
            (Some(key), Some(value)) => Ok(Self::new(key, value)),
            _ => Err(FileError::format("map entry without key and value")),
        }
    }

    fn to_element(&self) -> Element {
        Element::new("map")
            .with_attr("key", self.key.clone())
            .with_attr("value", self.value.clone())
    }
}

/// The mapping entries of one connection, plus any other `<cols>` content.
///
/// Writes go through [`MappingCols::upsert`] only. A table written by the
/// platform can hold stale pairs that share a key or a value with the one
/// being claimed, so an entry is identified by either side rather than by key
/// alone, and a keyed insert or remove would leave those stale pairs behind.
/// `entries` stays public for reading and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingCols {
    pub entries: Vec<MappingCol>,
    rest: Element,
}

impl Default for MappingCols {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            rest: Element::new("cols"),
        }
    }
}

impl MappingCols {
    #[must_use]
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.key == key && entry.value == value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MappingCol> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Point `key` at `value`.
    ///
    /// An entry sharing either the key or the value is rewritten in place;
    /// otherwise a new entry is appended. Rewriting can leave identical
    /// entries behind, and only the first of those is kept.
    pub fn upsert(&mut self, key: &str, value: &str) {
        let mut found = false;
        for entry in &mut self.entries {
            if entry.key == key || entry.value == value {
                entry.key = key.to_string();
                entry.value = value.to_string();
                found = true;
            }
        }
        if !found {
            self.entries.push(MappingCol::new(key, value));
            return;
        }
        let mut seen_target = false;
        self.entries.retain(|entry| {
            if entry.key != key || entry.value != value {
                return true;
            }
            !std::mem::replace(&mut seen_target, true)
        });
    }
}

impl XmlEntity for MappingCols {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let entries = rest
            .take_children("map")
            .iter()
            .map(MappingCol::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries, rest })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.rest.name.clone());
        element.attributes = self.rest.attributes.clone();
        element.children = self
            .entries
            .iter()
            .map(|entry| Node::Element(entry.to_element()))
            .collect();
        element.children.extend(self.rest.children.iter().cloned());
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cols(entries: &[(&str, &str)]) -> MappingCols {
        MappingCols {
            entries: entries
                .iter()
                .map(|(key, value)| MappingCol::new(*key, *value))
                .collect(),
            ..MappingCols::default()
        }
    }

    #[test]
    fn upsert_appends_new_pair() {
        let mut table = cols(&[("[A]", "[q].[A]")]);
        table.upsert("[B]", "[q].[B]");
        assert_eq!(table.entries.len(), 2);
        assert!(table.contains("[B]", "[q].[B]"));
    }

    #[test]
    fn upsert_rewrites_entry_matching_value() {
        let mut table = cols(&[("[AMOUNT_USD]", "[q].[AMOUNT_USD]")]);
        table.upsert("[AMOUNT]", "[q].[AMOUNT_USD]");
        assert_eq!(table.entries, vec![MappingCol::new("[AMOUNT]", "[q].[AMOUNT_USD]")]);
    }

    #[test]
    fn upsert_rewrites_entry_matching_key() {
        let mut table = cols(&[("[AMOUNT]", "[q].[OLD]")]);
        table.upsert("[AMOUNT]", "[q].[NEW]");
        assert_eq!(table.entries, vec![MappingCol::new("[AMOUNT]", "[q].[NEW]")]);
    }

    #[test]
    fn upsert_collapses_entries_rewritten_to_the_same_pair() {
        let mut table = cols(&[("[AMOUNT]", "[q].[X]"), ("[Y]", "[q].[AMOUNT_USD]")]);
        table.upsert("[AMOUNT]", "[q].[AMOUNT_USD]");
        assert_eq!(table.entries, vec![MappingCol::new("[AMOUNT]", "[q].[AMOUNT_USD]")]);
    }

    #[test]
    fn map_without_value_is_a_format_error() {
        let element = Element::new("map").with_attr("key", "[A]");
        assert!(MappingCol::from_element(&element).is_err());
    }
}
