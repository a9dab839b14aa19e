//! Desired-state declarations.
//!
//! These are read-only to convergence: the planner compares them against a
//! live document, and the applier enforces them verbatim.

use std::collections::BTreeSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ConnectionField, DataType, Persona, Role, RoleType};
use crate::names::bracketed;

/// A desired column. Same attribute shape as a live column, plus the folder
/// it belongs in and the remote (source-system) field it maps to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ConfigColumn {
    /// Column name; normalized to `[NAME]` on load.
    pub name: String,
    #[serde(default)]
    pub caption: Option<String>,
    /// Shorthand that fills `role`, `role_type` and `datatype` when they are absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<Persona>,
    #[serde(default)]
    pub datatype: Option<DataType>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub role_type: Option<RoleType>,
    /// Formula of a calculated field. Calculated fields never map to metadata.
    #[serde(default)]
    pub calculation: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "folder")]
    pub folder_name: Option<String>,
    #[serde(default, alias = "sql_alias")]
    pub remote_name: Option<String>,
}

impl ConfigColumn {
    /// Bracket the name, expand the persona and drop empty optional strings.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.name = bracketed(&self.name);
        if let Some(persona) = self.persona {
            let (role, role_type, datatype) = persona.attributes();
            self.role = self.role.or(Some(role));
            self.role_type = self.role_type.or(Some(role_type));
            self.datatype = self.datatype.or(Some(datatype));
        }
        for field in [
            &mut self.caption,
            &mut self.calculation,
            &mut self.description,
            &mut self.folder_name,
            &mut self.remote_name,
        ] {
            if field.as_deref().is_some_and(|value| value.trim().is_empty()) {
                *field = None;
            }
        }
        self
    }

    #[must_use]
    pub const fn is_calculated(&self) -> bool {
        self.calculation.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ConfigFolder {
    pub name: String,
}

/// A desired datasource: identity plus the columns and folders it should have.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ConfigDatasource {
    /// Platform id, filled in when the name is resolved against the live platform.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, alias = "project_name")]
    pub project: String,
    #[serde(default)]
    pub columns: Vec<ConfigColumn>,
    #[serde(default)]
    pub folders: Vec<ConfigFolder>,
}

impl ConfigDatasource {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.columns = self
            .columns
            .into_iter()
            .map(ConfigColumn::normalized)
            .collect();
        self
    }

    /// Declared folders plus every folder a desired column is placed in.
    #[must_use]
    pub fn desired_folder_names(&self) -> BTreeSet<&str> {
        self.folders
            .iter()
            .map(|folder| folder.name.as_str())
            .chain(
                self.columns
                    .iter()
                    .filter_map(|column| column.folder_name.as_deref()),
            )
            .collect()
    }

    /// Whether any desired column claims `remote_name`.
    #[must_use]
    pub fn references_remote_name(&self, remote_name: &str) -> bool {
        self.columns
            .iter()
            .any(|column| column.remote_name.as_deref() == Some(remote_name))
    }
}

/// Connection attributes a datasource's source-system sub-connection should carry.
///
/// Absent attributes are neither compared nor written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExpectedConnection {
    pub class_name: String,
    #[serde(default)]
    pub dbname: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
}

impl ExpectedConnection {
    #[must_use]
    pub fn get(&self, field: ConnectionField) -> Option<&str> {
        match field {
            ConnectionField::ClassName => Some(self.class_name.as_str()),
            ConnectionField::Dbname => self.dbname.as_deref(),
            ConnectionField::Schema => self.schema.as_deref(),
            ConnectionField::Server => self.server.as_deref(),
            ConnectionField::Service => self.service.as_deref(),
            ConnectionField::Username => self.username.as_deref(),
            ConnectionField::Warehouse => self.warehouse.as_deref(),
        }
    }

    /// Every attribute that is present, in `ConnectionField::ALL` order.
    pub fn present(&self) -> impl Iterator<Item = (ConnectionField, &str)> {
        ConnectionField::ALL
            .iter()
            .filter_map(|field| self.get(*field).map(|value| (*field, value)))
    }
}

/// Credentials embedded into the artifact's connection on publish.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalized_expands_persona_without_overriding_explicit_values() {
        let column = ConfigColumn {
            name: "AMOUNT".into(),
            persona: Some(Persona::ContinuousDecimalMeasure),
            datatype: Some(DataType::Integer),
            ..Default::default()
        }
        .normalized();

        assert_eq!(column.name, "[AMOUNT]");
        assert_eq!(column.role, Some(Role::Measure));
        assert_eq!(column.role_type, Some(RoleType::Quantitative));
        assert_eq!(column.datatype, Some(DataType::Integer));
    }

    #[test]
    fn normalized_drops_blank_strings() {
        let column = ConfigColumn {
            name: "[X]".into(),
            description: Some(String::new()),
            folder_name: Some("  ".into()),
            remote_name: Some("X".into()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(column.description, None);
        assert_eq!(column.folder_name, None);
        assert_eq!(column.remote_name.as_deref(), Some("X"));
    }

    #[test]
    fn desired_folders_include_column_folders() {
        let datasource = ConfigDatasource {
            name: "Orders".into(),
            folders: vec![ConfigFolder {
                name: "Dates".into(),
            }],
            columns: vec![ConfigColumn {
                name: "[AMOUNT]".into(),
                folder_name: Some("Money".into()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let names: Vec<&str> = datasource.desired_folder_names().into_iter().collect();
        assert_eq!(names, vec!["Dates", "Money"]);
    }

    #[test]
    fn desired_state_accepts_source_aliases() {
        let json = r#"{
            "name": "Orders",
            "project_name": "Finance",
            "columns": [{"name": "AMOUNT", "folder": "Money", "sql_alias": "AMOUNT_USD"}]
        }"#;
        let datasource: ConfigDatasource = serde_json::from_str(json).unwrap();
        let datasource = datasource.normalized();
        assert_eq!(datasource.project, "Finance");
        assert_eq!(datasource.columns[0].name, "[AMOUNT]");
        assert_eq!(datasource.columns[0].folder_name.as_deref(), Some("Money"));
        assert_eq!(
            datasource.columns[0].remote_name.as_deref(),
            Some("AMOUNT_USD")
        );
        assert!(datasource.references_remote_name("AMOUNT_USD"));
    }

    #[test]
    fn expected_connection_lists_present_fields_only() {
        let expected = ExpectedConnection {
            class_name: "snowflake".into(),
            dbname: Some("ANALYTICS".into()),
            ..Default::default()
        };
        let present: Vec<_> = expected.present().collect();
        assert_eq!(
            present,
            vec![
                (ConnectionField::ClassName, "snowflake"),
                (ConnectionField::Dbname, "ANALYTICS"),
            ]
        );
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = ConnectionCredentials {
            username: "svc".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
