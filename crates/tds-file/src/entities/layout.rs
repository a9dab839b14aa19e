//! The `<layout>` section.

use super::collection::XmlEntity;
use crate::error::FileError;
use crate::section::SectionKind;
use crate::xml::Element;

/// Data pane layout. `show-structure='true'` groups fields by source table;
/// `false` groups them by folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub show_structure: Option<bool>,
    rest: Element,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            show_structure: None,
            rest: Element::new(SectionKind::Layout.default_element_name())
                .with_attr("dim-ordering", "alphabetic")
                .with_attr("measure-ordering", "alphabetic"),
        }
    }
}

impl Layout {
    /// Group the data pane by folder.
    pub fn show_folders(&mut self) {
        self.show_structure = Some(false);
    }
}

impl XmlEntity for Layout {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let show_structure = match rest.take_attr("show-structure").as_deref() {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                return Err(FileError::format(format!(
                    "layout show-structure must be true or false, got '{other}'"
                )));
            }
        };
        Ok(Self {
            show_structure,
            rest,
        })
    }

    fn to_element(&self) -> Element {
        let mut element = self.rest.clone();
        if let Some(show) = self.show_structure {
            element
                .attributes
                .set("show-structure", if show { "true" } else { "false" });
        }
        element
    }
}
