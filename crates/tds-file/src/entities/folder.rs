//! Folders and the folders-common section.

use super::collection::{EntityList, Keyed, XmlEntity};
use crate::error::FileError;
use crate::section::SectionKind;
use crate::xml::Element;

/// A `<folder-item>`: a reference to a column by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderItem {
    pub name: String,
    rest: Element,
}

impl FolderItem {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rest: Element::new("folder-item").with_attr("type", "field"),
        }
    }
}

impl Keyed for FolderItem {
    const ENTITY: &'static str = "folder item";

    fn key(&self) -> &str {
        &self.name
    }
}

impl XmlEntity for FolderItem {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let name = rest
            .take_attr("name")
            .ok_or_else(|| FileError::format("folder-item without a name attribute"))?;
        Ok(Self { name, rest })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.rest.name.clone()).with_attr("name", self.name.clone());
        element.attributes.extend(self.rest.attributes.clone());
        element.children.extend(self.rest.children.iter().cloned());
        element
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub name: String,
    pub items: EntityList<FolderItem>,
    rest: Element,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: EntityList::new(),
            rest: Element::new("folder"),
        }
    }

    #[must_use]
    pub fn contains(&self, column_name: &str) -> bool {
        self.items.contains_key(column_name)
    }

    /// Add a folder-item for the column unless one is already there.
    pub fn place(&mut self, column_name: &str) {
        if !self.contains(column_name) {
            self.items.upsert(FolderItem::field(column_name));
        }
    }

    /// Remove the column's folder-item; `true` when one was removed.
    pub fn unplace(&mut self, column_name: &str) -> bool {
        self.items.delete(column_name).is_ok()
    }
}

impl Keyed for Folder {
    const ENTITY: &'static str = "folder";

    fn key(&self) -> &str {
        &self.name
    }
}

impl XmlEntity for Folder {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let name = rest
            .take_attr("name")
            .ok_or_else(|| FileError::format("folder without a name attribute"))?;
        let items = rest
            .take_children("folder-item")
            .iter()
            .map(FolderItem::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name,
            items: EntityList::from_vec(items),
            rest,
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.rest.name.clone()).with_attr("name", self.name.clone());
        element.attributes.extend(self.rest.attributes.clone());
        for item in &self.items {
            element = element.with_child(item.to_element());
        }
        element.children.extend(self.rest.children.iter().cloned());
        element
    }
}

/// The folders-common section: every folder of the datasource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldersCommon {
    pub folders: EntityList<Folder>,
    rest: Element,
}

impl Default for FoldersCommon {
    fn default() -> Self {
        Self {
            folders: EntityList::new(),
            rest: Element::new(SectionKind::FoldersCommon.default_element_name()),
        }
    }
}

impl FoldersCommon {
    /// The folder currently holding `column_name`, if any.
    #[must_use]
    pub fn folder_of(&self, column_name: &str) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.contains(column_name))
    }
}

impl XmlEntity for FoldersCommon {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let folders = rest
            .take_children("folder")
            .iter()
            .map(Folder::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            folders: EntityList::from_vec(folders),
            rest,
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.rest.name.clone());
        element.attributes = self.rest.attributes.clone();
        element.children = self
            .folders
            .to_elements()
            .into_iter()
            .map(crate::xml::Node::Element)
            .collect();
        element.children.extend(self.rest.children.iter().cloned());
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;
    use pretty_assertions::assert_eq;

    const FOLDERS: &str = r"<_.fcp.SchemaViewerObjectModel.true...folders-common>
  <folder name='Money'>
    <folder-item name='[AMOUNT]' type='field' />
  </folder>
  <folder name='Empty' />
</_.fcp.SchemaViewerObjectModel.true...folders-common>";

    #[test]
    fn parses_folders_and_items() {
        let common = FoldersCommon::from_element(&xml::parse(FOLDERS).unwrap()).unwrap();
        let names: Vec<&str> = common.folders.keys().collect();
        assert_eq!(names, vec!["Money", "Empty"]);
        assert_eq!(common.folder_of("[AMOUNT]").unwrap().name, "Money");
        assert!(common.folder_of("[OTHER]").is_none());
    }

    #[test]
    fn section_keeps_its_flagged_element_name() {
        let common = FoldersCommon::from_element(&xml::parse(FOLDERS).unwrap()).unwrap();
        let element = common.to_element();
        assert_eq!(
            element.name,
            "_.fcp.SchemaViewerObjectModel.true...folders-common"
        );
        assert_eq!(FoldersCommon::from_element(&element).unwrap(), common);
    }

    #[test]
    fn place_is_idempotent() {
        let mut folder = Folder::new("Money");
        folder.place("[A]");
        folder.place("[A]");
        assert_eq!(folder.items.len(), 1);
        assert_eq!(
            folder.to_element().child("folder-item").unwrap().attr("type"),
            Some("field")
        );
        assert!(folder.unplace("[A]"));
        assert!(!folder.unplace("[A]"));
    }
}
