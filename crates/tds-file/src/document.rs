//! Opening and saving datasource documents.
//!
//! A `Document` is parsed once into independent section values. Saving
//! rebuilds the root from those values: every section's old elements are
//! removed and its current elements are inserted where the section used to
//! start, or right after the previous section when it is new.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::archive::Archive;
use crate::entities::{
    Column, Connection, EntityList, Extract, Folder, FoldersCommon, Layout, XmlEntity,
};
use crate::error::FileError;
use crate::section::SectionKind;
use crate::xml::{self, Element, Node};

/// On-disk shape of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A bare XML document.
    Tds,
    /// A zip holding one `.tds` document and optional extract payload.
    Tdsx,
}

impl ArtifactKind {
    pub fn from_path(path: &Path) -> Result<Self, FileError> {
        match path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("tds") => Ok(Self::Tds),
            Some("tdsx") => Ok(Self::Tdsx),
            _ => Err(FileError::format(format!(
                "{} is not a .tds or .tdsx file",
                path.display()
            ))),
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Tds => "tds",
            Self::Tdsx => "tdsx",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One parsed datasource document.
#[derive(Debug, Clone)]
pub struct Document {
    kind: ArtifactKind,
    archive: Option<Archive>,
    /// The root as read. Non-section children are written back from here.
    root: Element,
    pub connection: Option<Connection>,
    pub aliases: Vec<Element>,
    pub columns: EntityList<Column>,
    pub column_instances: Vec<Element>,
    pub drill_paths: Vec<Element>,
    pub folders: Option<FoldersCommon>,
    pub date_options: Vec<Element>,
    pub extract: Option<Extract>,
    pub layout: Option<Layout>,
}

impl Document {
    /// Parse an artifact.
    pub fn open(bytes: &[u8], kind: ArtifactKind) -> Result<Self, FileError> {
        let (archive, text) = match kind {
            ArtifactKind::Tdsx => {
                let (archive, text) = Archive::read(bytes)?;
                (Some(archive), text)
            }
            ArtifactKind::Tds => {
                let text = String::from_utf8(bytes.to_vec()).map_err(|error| {
                    FileError::format(format!("document is not UTF-8 text: {error}"))
                })?;
                (None, text)
            }
        };
        Self::from_root(kind, archive, xml::parse(&text)?)
    }

    /// Parse a bare XML document.
    pub fn from_xml(text: &str) -> Result<Self, FileError> {
        Self::from_root(ArtifactKind::Tds, None, xml::parse(text)?)
    }

    pub fn open_path(path: &Path) -> Result<Self, FileError> {
        let kind = ArtifactKind::from_path(path)?;
        let bytes = std::fs::read(path)?;
        Self::open(&bytes, kind)
    }

    fn from_root(
        kind: ArtifactKind,
        archive: Option<Archive>,
        root: Element,
    ) -> Result<Self, FileError> {
        if root.name != "datasource" {
            return Err(FileError::format(format!(
                "expected a <datasource> root element, found <{}>",
                root.name
            )));
        }
        let mut document = Self {
            kind,
            archive,
            root: Element::new("datasource"),
            connection: None,
            aliases: Vec::new(),
            columns: EntityList::new(),
            column_instances: Vec::new(),
            drill_paths: Vec::new(),
            folders: None,
            date_options: Vec::new(),
            extract: None,
            layout: None,
        };
        for element in root.elements() {
            if let Some(section) = SectionKind::classify(&element.name) {
                document.load_section(section, element)?;
            }
        }
        document.root = root;
        tracing::debug!(
            kind = %document.kind,
            columns = document.columns.len(),
            has_extract = document.extract.is_some(),
            "opened datasource document"
        );
        Ok(document)
    }

    fn load_section(&mut self, section: SectionKind, element: &Element) -> Result<(), FileError> {
        match section {
            SectionKind::Connection => {
                set_once(&mut self.connection, Connection::from_element(element)?, section)
            }
            SectionKind::Aliases => {
                self.aliases.push(element.clone());
                Ok(())
            }
            SectionKind::Columns => {
                self.columns.add(Column::from_element(element)?)?;
                Ok(())
            }
            SectionKind::ColumnInstances => {
                self.column_instances.push(element.clone());
                Ok(())
            }
            SectionKind::DrillPaths => {
                self.drill_paths.push(element.clone());
                Ok(())
            }
            SectionKind::FoldersCommon => {
                set_once(&mut self.folders, FoldersCommon::from_element(element)?, section)
            }
            SectionKind::DateOptions => {
                self.date_options.push(element.clone());
                Ok(())
            }
            SectionKind::Extract => {
                set_once(&mut self.extract, Extract::from_element(element)?, section)
            }
            SectionKind::Layout => {
                set_once(&mut self.layout, Layout::from_element(element)?, section)
            }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Whether the container held members besides the document.
    #[must_use]
    pub fn has_extract_payload(&self) -> bool {
        self.archive
            .as_ref()
            .is_some_and(Archive::has_extract_payload)
    }

    #[must_use]
    pub fn extract_connection(&self) -> Option<&Connection> {
        self.extract.as_ref()?.connection.as_ref()
    }

    pub fn extract_connection_mut(&mut self) -> Option<&mut Connection> {
        self.extract.as_mut()?.connection.as_mut()
    }

    #[must_use]
    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.as_ref()?.folders.get(name)
    }

    #[must_use]
    pub fn folder_names(&self) -> Vec<&str> {
        self.folders
            .as_ref()
            .map(|common| common.folders.keys().collect())
            .unwrap_or_default()
    }

    /// Name of the folder currently holding `column_name`.
    #[must_use]
    pub fn folder_of(&self, column_name: &str) -> Option<&str> {
        self.folders
            .as_ref()?
            .folder_of(column_name)
            .map(|folder| folder.name.as_str())
    }

    /// Current elements of one section, in save order.
    fn section_elements(&self, section: SectionKind) -> Vec<Element> {
        match section {
            SectionKind::Connection => self.connection.iter().map(XmlEntity::to_element).collect(),
            SectionKind::Aliases => self.aliases.clone(),
            SectionKind::Columns => self.columns.iter().map(XmlEntity::to_element).collect(),
            SectionKind::ColumnInstances => self.column_instances.clone(),
            SectionKind::DrillPaths => self.drill_paths.clone(),
            SectionKind::FoldersCommon => self.folders.iter().map(XmlEntity::to_element).collect(),
            SectionKind::DateOptions => self.date_options.clone(),
            SectionKind::Extract => self.extract.iter().map(XmlEntity::to_element).collect(),
            SectionKind::Layout => self.layout.iter().map(XmlEntity::to_element).collect(),
        }
    }

    /// Rebuild the root element from the current section values.
    fn assemble_root(&self) -> Element {
        let mut root = self.root.clone();
        let mut cursor = 0;
        for section in SectionKind::SAVE_ORDER {
            let existing: Vec<usize> = root
                .children
                .iter()
                .enumerate()
                .filter(|(_, node)| {
                    node.as_element()
                        .is_some_and(|element| section.matches(&element.name))
                })
                .map(|(index, _)| index)
                .collect();
            let start = existing.first().copied().unwrap_or(cursor);
            for index in existing.iter().rev() {
                root.children.remove(*index);
            }
            let start = start.min(root.children.len());
            let current = self.section_elements(section);
            let count = current.len();
            root.children
                .splice(start..start, current.into_iter().map(Node::Element));
            if !existing.is_empty() || count > 0 {
                cursor = start + count;
            }
        }
        root
    }

    /// Sections in the order they will be written.
    #[must_use]
    pub fn section_order(&self) -> Vec<SectionKind> {
        let mut order: Vec<SectionKind> = self
            .assemble_root()
            .elements()
            .filter_map(|element| SectionKind::classify(&element.name))
            .collect();
        order.dedup();
        order
    }

    /// Serialize into the artifact's original container shape.
    pub fn save(&self) -> Result<Vec<u8>, FileError> {
        let document = xml::write(&self.assemble_root())?;
        match &self.archive {
            Some(archive) => archive.repack(&document),
            None => Ok(document),
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), FileError> {
        let bytes = self.save()?;
        std::fs::write(path, bytes)?;
        tracing::debug!(path = %path.display(), "saved datasource document");
        Ok(())
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, section: SectionKind) -> Result<(), FileError> {
    if slot.is_some() {
        return Err(FileError::format(format!(
            "section {section} appears more than once"
        )));
    }
    *slot = Some(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r"<?xml version='1.0' encoding='utf-8' ?>
<datasource formatted-name='orders' inline='true' version='18.1'>
  <repository-location id='orders' path='/datasources' revision='1.0' />
  <connection class='federated'>
    <relation name='Orders' table='[PUBLIC].[ORDERS]' type='table' />
  </connection>
  <aliases enabled='yes' />
  <column datatype='string' name='[ORDER_ID]' role='dimension' type='nominal' />
  <layout dim-ordering='alphabetic' measure-ordering='alphabetic' show-structure='true' />
  <semantic-values>
    <semantic-value key='[Country].[Name]' value='&quot;United States&quot;' />
  </semantic-values>
</datasource>";

    #[test]
    fn unmodeled_root_children_stay_in_place() {
        let document = Document::from_xml(MINIMAL).unwrap();
        let root = document.assemble_root();
        let names: Vec<&str> = root.elements().map(|child| child.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "repository-location",
                "connection",
                "aliases",
                "column",
                "layout",
                "semantic-values"
            ]
        );
    }

    #[test]
    fn new_section_lands_after_the_previous_one() {
        let mut document = Document::from_xml(MINIMAL).unwrap();
        document.folders = Some(FoldersCommon::default());
        document.columns.add(Column::new("[AMOUNT]")).unwrap();
        assert_eq!(
            document.section_order(),
            vec![
                SectionKind::Connection,
                SectionKind::Aliases,
                SectionKind::Columns,
                SectionKind::FoldersCommon,
                SectionKind::Layout,
            ]
        );
        let root = document.assemble_root();
        let names: Vec<&str> = root.elements().map(|child| child.name.as_str()).collect();
        assert_eq!(
            names[3..6],
            [
                "column",
                "column",
                "_.fcp.SchemaViewerObjectModel.true...folders-common"
            ]
        );
    }

    #[test]
    fn emptied_section_disappears() {
        let mut document = Document::from_xml(MINIMAL).unwrap();
        document.layout = None;
        assert!(!document.section_order().contains(&SectionKind::Layout));
    }

    #[test]
    fn wrong_root_is_a_format_error() {
        let err = Document::from_xml("<workbook />").unwrap_err();
        assert!(matches!(err, FileError::Format(message) if message.contains("workbook")));
    }

    #[test]
    fn duplicate_singleton_section_is_a_format_error() {
        let err = Document::from_xml(
            "<datasource><layout show-structure='true'/><layout show-structure='false'/></datasource>",
        )
        .unwrap_err();
        assert!(matches!(err, FileError::Format(_)));
    }

    #[test]
    fn artifact_kind_from_extension() {
        assert_eq!(
            ArtifactKind::from_path(Path::new("a/Orders.TDSX")).unwrap(),
            ArtifactKind::Tdsx
        );
        assert_eq!(
            ArtifactKind::from_path(Path::new("orders.tds")).unwrap(),
            ArtifactKind::Tds
        );
        assert!(ArtifactKind::from_path(Path::new("orders.twb")).is_err());
    }
}
