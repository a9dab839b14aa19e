//! Connections, named sub-connections and their metadata.

use tds_core::names::{qualified_remote, unbracketed};
use tds_core::{ConnectionField, CoreError, MetadataSpec};

use super::collection::{EntityList, Keyed, XmlEntity};
use super::mapping::MappingCols;
use super::metadata::{MetadataRecord, MetadataRecords};
use crate::error::FileError;
use crate::xml::{Element, Node};

/// A `<named-connection>`: one source-system connection of a federated
/// datasource, keyed by its generated name (e.g. `snowflake.0x1y2z`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedConnection {
    pub name: String,
    /// Displayed in the platform UI; conventionally the server host.
    pub caption: Option<String>,
    /// The inner `<connection>` holding class, server, credentials and so on.
    pub connection: Element,
    rest: Element,
}

impl NamedConnection {
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.connection.attr("class")
    }

    #[must_use]
    pub fn get(&self, field: ConnectionField) -> Option<&str> {
        self.connection.attr(field.as_str())
    }

    pub fn set(&mut self, field: ConnectionField, value: &str) {
        self.connection.attributes.set(field.as_str(), value);
    }
}

impl Keyed for NamedConnection {
    const ENTITY: &'static str = "named connection";

    fn key(&self) -> &str {
        &self.name
    }
}

impl XmlEntity for NamedConnection {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let name = rest
            .take_attr("name")
            .ok_or_else(|| FileError::format("named-connection without a name attribute"))?;
        let caption = rest.take_attr("caption");
        let connection = rest.take_child("connection").ok_or_else(|| {
            FileError::format(format!("named-connection {name} has no inner connection"))
        })?;
        Ok(Self {
            name,
            caption,
            connection,
            rest,
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.rest.name.clone());
        if let Some(caption) = &self.caption {
            element.attributes.set("caption", caption.clone());
        }
        element.attributes.set("name", self.name.clone());
        element.attributes.extend(self.rest.attributes.clone());
        element = element.with_child(self.connection.clone());
        element.children.extend(self.rest.children.iter().cloned());
        element
    }
}

/// A `<connection>`: the datasource's primary connection, or the connection
/// inside the extract section.
///
/// Children before the mapping table and metadata records (relations,
/// refresh settings) are kept in `leading`; anything after them in
/// `trailing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub named_connections: Option<EntityList<NamedConnection>>,
    pub cols: Option<MappingCols>,
    pub metadata: Option<MetadataRecords>,
    leading: Vec<Node>,
    trailing: Vec<Node>,
    named_connections_rest: Element,
    rest: Element,
}

impl Connection {
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.rest.attr("class")
    }

    /// Name of the primary relation, e.g. `Custom SQL Query` or `Extract`.
    #[must_use]
    pub fn relation_name(&self) -> Option<&str> {
        let relations = || {
            self.leading
                .iter()
                .filter_map(Node::as_element)
                .filter(|element| element.name.ends_with("relation"))
        };
        relations()
            .find(|element| element.name == "relation")
            .and_then(|element| element.attr("name"))
            .or_else(|| relations().find_map(|element| element.attr("name")))
    }

    /// The first named sub-connection of the given class.
    #[must_use]
    pub fn named_connection(&self, class: &str) -> Option<&NamedConnection> {
        self.named_connections
            .as_ref()?
            .iter()
            .find(|named| named.class() == Some(class))
    }

    pub fn named_connection_mut(&mut self, class: &str) -> Option<&mut NamedConnection> {
        self.named_connections
            .as_mut()?
            .iter_mut()
            .find(|named| named.class() == Some(class))
    }

    #[must_use]
    pub fn metadata_record(&self, remote_name: &str) -> Option<&MetadataRecord> {
        self.metadata.as_ref()?.records.get(remote_name)
    }

    /// Number of column metadata records.
    #[must_use]
    pub fn metadata_count(&self) -> usize {
        self.metadata
            .as_ref()
            .map_or(0, |metadata| metadata.records.len())
    }

    pub fn add_metadata_record(&mut self, record: MetadataRecord) -> Result<(), CoreError> {
        self.metadata
            .get_or_insert_with(MetadataRecords::default)
            .records
            .add(record)
    }

    /// Whether `local_name` needs a mapping entry to reach `remote_name`.
    ///
    /// Without a mapping table in use, a column named exactly like its remote
    /// field resolves on its own.
    #[must_use]
    pub fn mapping_required(&self, local_name: &str, remote_name: &str) -> bool {
        self.cols.as_ref().is_some_and(|cols| !cols.is_empty())
            || unbracketed(local_name) != remote_name
    }

    /// Whether the mapping table already maps `local_name` to `remote_name`
    /// under the record's parent relation.
    #[must_use]
    pub fn is_mapped(&self, local_name: &str, remote_name: &str) -> bool {
        let Some(record) = self.metadata_record(remote_name) else {
            return false;
        };
        let parent_name = record.parent_name.as_deref().unwrap_or_default();
        let value = qualified_remote(parent_name, remote_name);
        self.cols
            .as_ref()
            .is_some_and(|cols| cols.contains(local_name, &value))
    }

    /// Insert a planned metadata record, mapping it when a mapping is needed.
    pub fn insert_metadata(&mut self, spec: &MetadataSpec) -> Result<(), CoreError> {
        self.add_metadata_record(MetadataRecord::from_spec(spec))?;
        if self.mapping_required(&spec.local_name, &spec.remote_name) {
            let value = qualified_remote(&spec.parent_name, &spec.remote_name);
            self.cols
                .get_or_insert_with(MappingCols::default)
                .upsert(&spec.local_name, &value);
        }
        Ok(())
    }

    /// Point the record for `remote_name` at `local_name` and upsert its
    /// mapping entry, creating the mapping table if there is none. `scope`
    /// names this connection in the not-found error.
    pub fn claim_remote_name(
        &mut self,
        remote_name: &str,
        local_name: &str,
        scope: &str,
    ) -> Result<(), CoreError> {
        let record = self
            .metadata
            .as_mut()
            .and_then(|metadata| metadata.records.get_mut(remote_name))
            .ok_or_else(|| CoreError::MetadataNotFound {
                remote_name: remote_name.to_string(),
                scope: scope.to_string(),
            })?;
        record.local_name = Some(local_name.to_string());
        let parent_name = record.parent_name.as_deref().unwrap_or_default();
        let value = qualified_remote(parent_name, remote_name);
        self.cols
            .get_or_insert_with(MappingCols::default)
            .upsert(local_name, &value);
        Ok(())
    }
}

impl XmlEntity for Connection {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let (named_connections, named_connections_rest) =
            match rest.take_child("named-connections") {
                Some(mut wrapper) => {
                    let items = wrapper
                        .take_children("named-connection")
                        .iter()
                        .map(NamedConnection::from_element)
                        .collect::<Result<Vec<_>, _>>()?;
                    (Some(EntityList::from_vec(items)), wrapper)
                }
                None => (None, Element::new("named-connections")),
            };

        let mut leading = Vec::new();
        let mut trailing = Vec::new();
        let mut cols = None;
        let mut metadata = None;
        for node in std::mem::take(&mut rest.children) {
            match node {
                Node::Element(child) if child.name == "cols" && cols.is_none() => {
                    cols = Some(MappingCols::from_element(&child)?);
                }
                Node::Element(child) if child.name == "metadata-records" && metadata.is_none() => {
                    metadata = Some(MetadataRecords::from_element(&child)?);
                }
                other if cols.is_none() && metadata.is_none() => leading.push(other),
                other => trailing.push(other),
            }
        }

        Ok(Self {
            named_connections,
            cols,
            metadata,
            leading,
            trailing,
            named_connections_rest,
            rest,
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.rest.name.clone());
        element.attributes = self.rest.attributes.clone();
        if let Some(named) = &self.named_connections {
            let mut wrapper = Element::new(self.named_connections_rest.name.clone());
            wrapper.attributes = self.named_connections_rest.attributes.clone();
            for item in named {
                wrapper = wrapper.with_child(item.to_element());
            }
            wrapper
                .children
                .extend(self.named_connections_rest.children.iter().cloned());
            element = element.with_child(wrapper);
        }
        element.children.extend(self.leading.iter().cloned());
        if let Some(cols) = &self.cols {
            element = element.with_child(cols.to_element());
        }
        if let Some(metadata) = &self.metadata {
            element = element.with_child(metadata.to_element());
        }
        element.children.extend(self.trailing.iter().cloned());
        element
    }
}
