//! The `<extract>` section and its mirrored connection.

use super::collection::XmlEntity;
use super::connection::Connection;
use crate::error::FileError;
use crate::xml::{Element, Node};

/// Present when the datasource embeds extract data. Its connection mirrors the
/// primary connection's metadata records and mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extract {
    pub connection: Option<Connection>,
    rest: Element,
}

impl Extract {
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.rest.attr("enabled") != Some("false")
    }
}

impl XmlEntity for Extract {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let connection = rest
            .take_child("connection")
            .map(|connection| Connection::from_element(&connection))
            .transpose()?;
        Ok(Self { connection, rest })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.rest.name.clone());
        element.attributes = self.rest.attributes.clone();
        if let Some(connection) = &self.connection {
            element.children.push(Node::Element(connection.to_element()));
        }
        element.children.extend(self.rest.children.iter().cloned());
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;

    #[test]
    fn reads_extract_connection() {
        let extract = Extract::from_element(
            &xml::parse(
                r"<extract count='-1' enabled='true' units='records'>
  <connection class='hyper' dbname='Data/Extracts/orders.hyper'>
    <relation name='Extract' table='[Extract].[Extract]' type='table' />
    <metadata-records />
  </connection>
</extract>",
            )
            .unwrap(),
        )
        .unwrap();
        assert!(extract.enabled());
        let connection = extract.connection.as_ref().unwrap();
        assert_eq!(connection.class(), Some("hyper"));
        assert_eq!(connection.relation_name(), Some("Extract"));
        assert_eq!(connection.metadata_count(), 0);
        assert_eq!(Extract::from_element(&extract.to_element()).unwrap(), extract);
    }
}
