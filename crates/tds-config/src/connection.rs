//! Expected source-system connection and publish credentials.

use serde::{Deserialize, Serialize};
use tds_core::{ConnectionCredentials, ExpectedConnection};

fn default_class_name() -> String {
    "snowflake".to_string()
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Connection class of the source-system sub-connection.
    #[serde(default = "default_class_name")]
    pub class_name: String,

    #[serde(default)]
    pub dbname: String,

    #[serde(default)]
    pub schema: String,

    /// Account locator. Used to derive `server` when that is not set.
    #[serde(default)]
    pub account: String,

    #[serde(default)]
    pub server: String,

    /// Role the connection runs as.
    #[serde(default)]
    pub service: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub warehouse: String,

    /// Credentials embedded into the artifact on publish.
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            class_name: default_class_name(),
            dbname: String::new(),
            schema: String::new(),
            account: String::new(),
            server: String::new(),
            service: String::new(),
            username: String::new(),
            warehouse: String::new(),
            credentials: CredentialsConfig::default(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ConnectionConfig {
    /// Whether any attribute beyond the class is set.
    pub fn is_configured(&self) -> bool {
        self.expected().present().count() > 1
    }

    /// Server host, derived from the account when not set explicitly.
    pub fn server(&self) -> Option<String> {
        non_empty(&self.server).or_else(|| {
            non_empty(&self.account).map(|account| format!("{account}.snowflakecomputing.com"))
        })
    }

    /// The attribute set every datasource's sub-connection should carry.
    /// Empty values are left out so they are neither compared nor written.
    pub fn expected(&self) -> ExpectedConnection {
        ExpectedConnection {
            class_name: self.class_name.clone(),
            dbname: non_empty(&self.dbname),
            schema: non_empty(&self.schema),
            server: self.server(),
            service: non_empty(&self.service),
            username: non_empty(&self.username),
            warehouse: non_empty(&self.warehouse),
        }
    }

    /// Publish credentials, when a username is configured.
    pub fn credentials(&self) -> Option<ConnectionCredentials> {
        non_empty(&self.credentials.username).map(|username| ConnectionCredentials {
            username,
            password: self.credentials.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_expects_only_the_class() {
        let config = ConnectionConfig::default();
        assert!(!config.is_configured());
        assert_eq!(
            config.expected(),
            ExpectedConnection {
                class_name: "snowflake".into(),
                ..Default::default()
            }
        );
        assert!(config.credentials().is_none());
    }

    #[test]
    fn server_derives_from_account() {
        let config = ConnectionConfig {
            account: "acme".into(),
            ..Default::default()
        };
        assert_eq!(config.server().as_deref(), Some("acme.snowflakecomputing.com"));

        let explicit = ConnectionConfig {
            account: "acme".into(),
            server: "acme.privatelink.snowflakecomputing.com".into(),
            ..Default::default()
        };
        assert_eq!(
            explicit.expected().server.as_deref(),
            Some("acme.privatelink.snowflakecomputing.com")
        );
    }

    #[test]
    fn blank_values_are_not_expected() {
        let config = ConnectionConfig {
            warehouse: "  ".into(),
            dbname: "ANALYTICS".into(),
            ..Default::default()
        };
        let expected = config.expected();
        assert_eq!(expected.warehouse, None);
        assert_eq!(expected.dbname.as_deref(), Some("ANALYTICS"));
        assert!(config.is_configured());
    }

    #[test]
    fn debug_hides_password() {
        let config = CredentialsConfig {
            username: "svc".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
