//! `<metadata-records>` and their column records.

use tds_core::{DataType, MetadataSpec};

use super::collection::{EntityList, Keyed, XmlEntity};
use crate::error::FileError;
use crate::xml::{Element, Node};

/// Canonical child order of a metadata record. Children not listed keep their
/// relative order after the listed ones.
const CHILD_ORDER: &[&str] = &[
    "remote-name",
    "remote-type",
    "local-name",
    "parent-name",
    "remote-alias",
    "ordinal",
    "layered",
    "local-type",
    "aggregation",
    "precision",
    "scale",
    "width",
    "contains-null",
    "padded-semantics",
    "collation",
    "attributes",
    "family",
    "object-id",
];

fn child_rank(name: &str) -> usize {
    let base = name.rsplit("...").next().unwrap_or(name);
    CHILD_ORDER
        .iter()
        .position(|known| *known == base)
        .unwrap_or(CHILD_ORDER.len())
}

/// A `<metadata-record class='column'>`: one remote field of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub remote_name: String,
    pub local_name: Option<String>,
    pub parent_name: Option<String>,
    pub remote_alias: Option<String>,
    pub ordinal: Option<u32>,
    pub local_type: Option<String>,
    pub family: Option<String>,
    pub(crate) rest: Element,
}

impl MetadataRecord {
    pub fn new(remote_name: impl Into<String>) -> Self {
        Self {
            remote_name: remote_name.into(),
            local_name: None,
            parent_name: None,
            remote_alias: None,
            ordinal: None,
            local_type: None,
            family: None,
            rest: Element::new("metadata-record").with_attr("class", "column"),
        }
    }

    /// Build the record a planned metadata insertion describes.
    #[must_use]
    pub fn from_spec(spec: &MetadataSpec) -> Self {
        let mut record = Self {
            local_name: Some(spec.local_name.clone()),
            parent_name: Some(spec.parent_name.clone()),
            remote_alias: Some(spec.remote_name.clone()),
            ordinal: Some(spec.ordinal),
            local_type: spec.local_type.map(|datatype| datatype.to_string()),
            family: spec.family.clone(),
            ..Self::new(spec.remote_name.clone())
        };
        if let Some(datatype) = spec.local_type {
            record.rest = record
                .rest
                .with_child(Element::new("aggregation").with_text(default_aggregation(datatype)));
        }
        record.rest = record
            .rest
            .with_child(Element::new("contains-null").with_text("true"));
        record
    }
}

const fn default_aggregation(datatype: DataType) -> &'static str {
    match datatype {
        DataType::Integer | DataType::Real => "Sum",
        DataType::Date | DataType::Datetime => "Year",
        _ => "Count",
    }
}

impl Keyed for MetadataRecord {
    const ENTITY: &'static str = "metadata record";

    fn key(&self) -> &str {
        &self.remote_name
    }
}

impl XmlEntity for MetadataRecord {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let remote_name = rest
            .take_child_text("remote-name")
            .ok_or_else(|| FileError::format("metadata-record without a remote-name"))?;
        let ordinal = rest
            .take_child_text("ordinal")
            .map(|text| {
                text.trim()
                    .parse()
                    .map_err(|_| FileError::format(format!("bad ordinal for {remote_name}: {text}")))
            })
            .transpose()?;
        Ok(Self {
            local_name: rest.take_child_text("local-name"),
            parent_name: rest.take_child_text("parent-name"),
            remote_alias: rest.take_child_text("remote-alias"),
            local_type: rest.take_child_text("local-type"),
            family: rest.take_child_text("family"),
            remote_name,
            ordinal,
            rest,
        })
    }

    fn to_element(&self) -> Element {
        let text_child = |name: &str, value: &str| Element::new(name).with_text(value);
        let mut children: Vec<Element> = vec![text_child("remote-name", &self.remote_name)];
        let optional = [
            ("local-name", self.local_name.clone()),
            ("parent-name", self.parent_name.clone()),
            ("remote-alias", self.remote_alias.clone()),
            ("ordinal", self.ordinal.map(|ordinal| ordinal.to_string())),
            ("local-type", self.local_type.clone()),
            ("family", self.family.clone()),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                children.push(text_child(name, &value));
            }
        }

        let mut others = Vec::new();
        for node in &self.rest.children {
            match node {
                Node::Element(child) => children.push(child.clone()),
                other => others.push(other.clone()),
            }
        }
        children.sort_by_key(|child| child_rank(&child.name));

        let mut element = Element::new(self.rest.name.clone());
        element.attributes = self.rest.attributes.clone();
        element.children = children.into_iter().map(Node::Element).collect();
        element.children.extend(others);
        element
    }
}

/// The `<metadata-records>` block of a connection.
///
/// Records that describe capabilities rather than a remote field have no
/// remote name; they are carried through unchanged ahead of the column
/// records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecords {
    pub records: EntityList<MetadataRecord>,
    opaque: Vec<Element>,
    rest: Element,
}

impl Default for MetadataRecords {
    fn default() -> Self {
        Self {
            records: EntityList::new(),
            opaque: Vec::new(),
            rest: Element::new("metadata-records"),
        }
    }
}

impl XmlEntity for MetadataRecords {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let mut records = Vec::new();
        let mut opaque = Vec::new();
        for record in rest.take_children("metadata-record") {
            let is_column = record.attr("class").is_none_or(|class| class == "column")
                && record.child("remote-name").is_some();
            if is_column {
                records.push(MetadataRecord::from_element(&record)?);
            } else {
                opaque.push(record);
            }
        }
        Ok(Self {
            records: EntityList::from_vec(records),
            opaque,
            rest,
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.rest.name.clone());
        element.attributes = self.rest.attributes.clone();
        element
            .children
            .extend(self.opaque.iter().cloned().map(Node::Element));
        element
            .children
            .extend(self.records.to_elements().into_iter().map(Node::Element));
        element.children.extend(self.rest.children.iter().cloned());
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;
    use pretty_assertions::assert_eq;

    const RECORDS: &str = r"<metadata-records>
  <metadata-record class='capability'>
    <remote-name />
    <remote-type>0</remote-type>
    <parent-name>[Custom SQL Query]</parent-name>
    <remote-alias />
    <aggregation>Count</aggregation>
    <contains-null>true</contains-null>
    <attributes>
      <attribute datatype='string' name='character-set'>&quot;UTF-8&quot;</attribute>
    </attributes>
  </metadata-record>
  <metadata-record class='column'>
    <remote-name>ORDER_ID</remote-name>
    <remote-type>131</remote-type>
    <local-name>[ORDER_ID]</local-name>
    <parent-name>[Custom SQL Query]</parent-name>
    <remote-alias>ORDER_ID</remote-alias>
    <ordinal>1</ordinal>
    <local-type>integer</local-type>
    <aggregation>Sum</aggregation>
    <precision>38</precision>
    <contains-null>true</contains-null>
    <_.fcp.ObjectModelEncapsulateLegacy.true...object-id>[_62A667B34C534415B10B2075B0DC36DC]</_.fcp.ObjectModelEncapsulateLegacy.true...object-id>
  </metadata-record>
</metadata-records>";

    #[test]
    fn capability_records_are_not_keyed() {
        let records = MetadataRecords::from_element(&xml::parse(RECORDS).unwrap()).unwrap();
        assert_eq!(records.records.len(), 1);
        let record = records.records.get("ORDER_ID").unwrap();
        assert_eq!(record.local_name.as_deref(), Some("[ORDER_ID]"));
        assert_eq!(record.ordinal, Some(1));
    }

    #[test]
    fn written_record_keeps_canonical_child_order() {
        let records = MetadataRecords::from_element(&xml::parse(RECORDS).unwrap()).unwrap();
        let element = records.records.get("ORDER_ID").unwrap().to_element();
        let names: Vec<&str> = element.elements().map(|child| child.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "remote-name",
                "remote-type",
                "local-name",
                "parent-name",
                "remote-alias",
                "ordinal",
                "local-type",
                "aggregation",
                "precision",
                "contains-null",
                "_.fcp.ObjectModelEncapsulateLegacy.true...object-id",
            ]
        );
        assert_eq!(
            MetadataRecords::from_element(&records.to_element()).unwrap(),
            records
        );
    }

    #[test]
    fn record_from_spec_carries_family_and_ordinal() {
        let record = MetadataRecord::from_spec(&MetadataSpec {
            remote_name: "AMOUNT_USD".into(),
            local_name: "[AMOUNT]".into(),
            parent_name: "[Extract]".into(),
            ordinal: 7,
            local_type: Some(DataType::Real),
            family: Some("Custom SQL Query".into()),
        });
        let element = record.to_element();
        assert_eq!(element.attr("class"), Some("column"));
        assert_eq!(element.child("ordinal").unwrap().text(), "7");
        assert_eq!(element.child("family").unwrap().text(), "Custom SQL Query");
        assert_eq!(element.child("aggregation").unwrap().text(), "Sum");
        assert_eq!(MetadataRecord::from_element(&element).unwrap(), record);
    }

    #[test]
    fn bad_ordinal_is_a_format_error() {
        let element = Element::new("metadata-record")
            .with_child(Element::new("remote-name").with_text("X"))
            .with_child(Element::new("ordinal").with_text("first"));
        assert!(matches!(
            MetadataRecord::from_element(&element),
            Err(FileError::Format(_))
        ));
    }
}
