//! `<column>` entities.

use serde::Serialize;
use tds_core::{ConfigColumn, DataType, Role, RoleType};

use super::collection::{Keyed, XmlEntity};
use crate::error::FileError;
use crate::xml::Element;

/// A datasource column. Identity is the bracketed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub caption: Option<String>,
    pub datatype: Option<DataType>,
    pub role: Option<Role>,
    pub role_type: Option<RoleType>,
    pub calculation: Option<Calculation>,
    pub description: Option<Description>,
    /// Attributes and children this model does not manage.
    rest: Element,
}

/// One attribute that differs between a live column and its desired state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDiff {
    pub attribute: &'static str,
    pub live: Option<String>,
    pub desired: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caption: None,
            datatype: None,
            role: None,
            role_type: None,
            calculation: None,
            description: None,
            rest: Element::new("column"),
        }
    }

    #[must_use]
    pub const fn is_calculated(&self) -> bool {
        self.calculation.is_some()
    }

    #[must_use]
    pub fn formula(&self) -> Option<&str> {
        self.calculation
            .as_ref()
            .and_then(|calculation| calculation.formula.as_deref())
    }

    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_ref().map(Description::text)
    }

    /// Take every managed attribute from `desired`, keeping unmanaged ones.
    ///
    /// A calculation or description whose text is unchanged keeps its
    /// original element.
    pub fn overlay(&mut self, desired: Self) {
        self.caption = desired.caption;
        self.datatype = desired.datatype;
        self.role = desired.role;
        self.role_type = desired.role_type;
        self.calculation = match (self.calculation.take(), desired.calculation) {
            (Some(mut live), Some(wanted)) => {
                live.formula = wanted.formula;
                Some(live)
            }
            (_, wanted) => wanted,
        };
        if self.description_text() != desired.description.as_ref().map(Description::text) {
            self.description = desired.description;
        }
    }

    /// Attribute-by-attribute comparison against a desired column.
    ///
    /// Folder placement and remote name are not attributes of the column and
    /// are checked elsewhere.
    #[must_use]
    pub fn diff(&self, desired: &ConfigColumn) -> Vec<AttributeDiff> {
        let mut diffs = Vec::new();
        let mut compare = |attribute, live: Option<String>, wanted: Option<String>| {
            if live != wanted {
                diffs.push(AttributeDiff {
                    attribute,
                    live,
                    desired: wanted,
                });
            }
        };
        compare("caption", self.caption.clone(), desired.caption.clone());
        compare(
            "datatype",
            self.datatype.map(|v| v.to_string()),
            desired.datatype.map(|v| v.to_string()),
        );
        compare(
            "role",
            self.role.map(|v| v.to_string()),
            desired.role.map(|v| v.to_string()),
        );
        compare(
            "role_type",
            self.role_type.map(|v| v.to_string()),
            desired.role_type.map(|v| v.to_string()),
        );
        compare(
            "calculation",
            self.formula().map(str::to_string),
            desired.calculation.clone(),
        );
        compare(
            "description",
            self.description_text().map(str::to_string),
            desired.description.clone(),
        );
        diffs
    }
}

impl From<&ConfigColumn> for Column {
    fn from(config: &ConfigColumn) -> Self {
        Self {
            caption: config.caption.clone(),
            datatype: config.datatype,
            role: config.role,
            role_type: config.role_type,
            calculation: config.calculation.clone().map(Calculation::tableau),
            description: config.description.clone().map(Description::plain),
            ..Self::new(config.name.clone())
        }
    }
}

impl Keyed for Column {
    const ENTITY: &'static str = "column";

    fn key(&self) -> &str {
        &self.name
    }
}

fn parse_attr<T>(element: &mut Element, key: &str) -> Result<Option<T>, FileError>
where
    T: std::str::FromStr<Err = tds_core::CoreError>,
{
    element
        .take_attr(key)
        .map(|value| {
            value
                .parse()
                .map_err(|error| FileError::format(format!("{}: {error}", element.name)))
        })
        .transpose()
}

impl XmlEntity for Column {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let name = rest
            .take_attr("name")
            .ok_or_else(|| FileError::format("column without a name attribute"))?;
        let caption = rest.take_attr("caption");
        let datatype = parse_attr(&mut rest, "datatype")?;
        let role = parse_attr(&mut rest, "role")?;
        let role_type = parse_attr(&mut rest, "type")?;
        let calculation = rest
            .take_child("calculation")
            .map(|calculation| Calculation::from_element(&calculation))
            .transpose()?;
        let description = rest
            .take_child("desc")
            .map(|desc| Description::from_element(&desc))
            .transpose()?;
        Ok(Self {
            name,
            caption,
            datatype,
            role,
            role_type,
            calculation,
            description,
            rest,
        })
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new(self.rest.name.clone());
        if let Some(caption) = &self.caption {
            element.attributes.set("caption", caption.clone());
        }
        if let Some(datatype) = self.datatype {
            element.attributes.set("datatype", datatype.as_str());
        }
        element.attributes.set("name", self.name.clone());
        if let Some(role) = self.role {
            element.attributes.set("role", role.as_str());
        }
        if let Some(role_type) = self.role_type {
            element.attributes.set("type", role_type.as_str());
        }
        element.attributes.extend(self.rest.attributes.clone());

        if let Some(calculation) = &self.calculation {
            element = element.with_child(calculation.to_element());
        }
        if let Some(description) = &self.description {
            element = element.with_child(description.to_element());
        }
        element.children.extend(self.rest.children.iter().cloned());
        element
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// `<calculation>` of a calculated field. Bins and groups carry no formula
/// but still make the column calculated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calculation {
    pub formula: Option<String>,
    rest: Element,
}

impl Calculation {
    pub fn tableau(formula: impl Into<String>) -> Self {
        Self {
            formula: Some(formula.into()),
            rest: Element::new("calculation").with_attr("class", "tableau"),
        }
    }
}

impl XmlEntity for Calculation {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let mut rest = element.clone();
        let formula = rest.take_attr("formula");
        Ok(Self { formula, rest })
    }

    fn to_element(&self) -> Element {
        let mut element = self.rest.clone();
        if let Some(formula) = &self.formula {
            element.attributes.set("formula", formula.clone());
        }
        element
    }
}

// ---------------------------------------------------------------------------
// Description
// ---------------------------------------------------------------------------

/// Column description. Rich text read from a document is kept as written
/// and compared by its plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    text: String,
    rich: Option<Element>,
}

impl Description {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rich: None,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn plain_element(text: &str) -> Element {
        Element::new("desc").with_child(
            Element::new("formatted-text").with_child(Element::new("run").with_text(text)),
        )
    }
}

impl XmlEntity for Description {
    fn from_element(element: &Element) -> Result<Self, FileError> {
        let text = element.text();
        let rich = (*element != Self::plain_element(&text)).then(|| element.clone());
        Ok(Self { text, rich })
    }

    fn to_element(&self) -> Element {
        self.rich
            .clone()
            .unwrap_or_else(|| Self::plain_element(&self.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml;
    use pretty_assertions::assert_eq;

    const CALCULATED: &str = r#"<column caption='Margin' datatype='real' name='[Calculation_1]' role='measure' type='quantitative' default-format='p0%'>
  <calculation class='tableau' formula='SUM([PROFIT]) / SUM([AMOUNT])' />
  <desc><formatted-text><run bold='true'>Gross</run><run> margin</run></formatted-text></desc>
</column>"#;

    #[test]
    fn parses_managed_attributes_and_keeps_the_rest() {
        let column = Column::from_element(&xml::parse(CALCULATED).unwrap()).unwrap();
        assert_eq!(column.name, "[Calculation_1]");
        assert_eq!(column.datatype, Some(DataType::Real));
        assert_eq!(column.role_type, Some(RoleType::Quantitative));
        assert_eq!(column.formula(), Some("SUM([PROFIT]) / SUM([AMOUNT])"));
        assert_eq!(column.description_text(), Some("Gross margin"));

        let element = column.to_element();
        assert_eq!(element.attr("default-format"), Some("p0%"));
        let desc = element.child("desc").unwrap();
        assert_eq!(desc.child("formatted-text").unwrap().elements().count(), 2);
    }

    #[test]
    fn element_round_trip_is_lossless() {
        let column = Column::from_element(&xml::parse(CALCULATED).unwrap()).unwrap();
        let again = Column::from_element(&column.to_element()).unwrap();
        assert_eq!(again, column);
    }

    #[test]
    fn unknown_role_is_a_format_error() {
        let element = Element::new("column")
            .with_attr("name", "[A]")
            .with_attr("role", "sideways");
        let err = Column::from_element(&element).unwrap_err();
        assert!(matches!(err, FileError::Format(message) if message.contains("sideways")));
    }

    #[test]
    fn overlay_keeps_unmanaged_attributes() {
        let mut live = Column::from_element(
            &Element::new("column")
                .with_attr("name", "[A]")
                .with_attr("caption", "Old")
                .with_attr("semantic-role", "[Country].[Name]"),
        )
        .unwrap();
        let desired = Column::from(&ConfigColumn {
            name: "[A]".into(),
            caption: Some("New".into()),
            role: Some(Role::Dimension),
            ..Default::default()
        });
        live.overlay(desired);
        let element = live.to_element();
        assert_eq!(element.attr("caption"), Some("New"));
        assert_eq!(element.attr("role"), Some("dimension"));
        assert_eq!(element.attr("semantic-role"), Some("[Country].[Name]"));
    }

    #[test]
    fn overlay_keeps_rich_description_with_same_text() {
        let mut live = Column::from_element(&xml::parse(CALCULATED).unwrap()).unwrap();
        let before = live.description.clone();
        let mut desired = live.clone();
        desired.description = Some(Description::plain("Gross margin"));
        live.overlay(desired);
        assert_eq!(live.description, before);
    }

    #[test]
    fn diff_reports_changed_attributes_only() {
        let live = Column::from(&ConfigColumn {
            name: "[A]".into(),
            caption: Some("A".into()),
            datatype: Some(DataType::String),
            ..Default::default()
        });
        let desired = ConfigColumn {
            name: "[A]".into(),
            caption: Some("A".into()),
            datatype: Some(DataType::Integer),
            description: Some("count of things".into()),
            folder_name: Some("ignored".into()),
            ..Default::default()
        };
        let diffs = live.diff(&desired);
        let names: Vec<&str> = diffs.iter().map(|d| d.attribute).collect();
        assert_eq!(names, vec!["datatype", "description"]);
        assert_eq!(diffs[0].live.as_deref(), Some("string"));
        assert_eq!(diffs[0].desired.as_deref(), Some("integer"));
    }

    #[test]
    fn converged_column_has_no_diff() {
        let desired = ConfigColumn {
            name: "[A]".into(),
            caption: Some("A".into()),
            role: Some(Role::Measure),
            calculation: Some("1 + 1".into()),
            ..Default::default()
        };
        assert!(Column::from(&desired).diff(&desired).is_empty());
    }
}
