//! A serializable overview of a parsed document, for inspection output.

use serde::Serialize;

use crate::document::{ArtifactKind, Document};
use crate::section::SectionKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub calculated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderSummary {
    pub name: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    pub named_connections: Vec<String>,
    pub metadata_records: usize,
    pub mappings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub kind: ArtifactKind,
    pub has_extract_payload: bool,
    pub sections: Vec<SectionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<ConnectionSummary>,
    pub columns: Vec<ColumnSummary>,
    pub folders: Vec<FolderSummary>,
}

impl ConnectionSummary {
    fn of(connection: &crate::entities::Connection) -> Self {
        Self {
            class: connection.class().map(str::to_string),
            relation: connection.relation_name().map(str::to_string),
            named_connections: connection
                .named_connections
                .as_ref()
                .map(|named| named.keys().map(str::to_string).collect())
                .unwrap_or_default(),
            metadata_records: connection.metadata_count(),
            mappings: connection.cols.as_ref().map_or(0, |cols| cols.entries.len()),
        }
    }
}

impl Document {
    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            kind: self.kind(),
            has_extract_payload: self.has_extract_payload(),
            sections: self.section_order(),
            connection: self.connection.as_ref().map(ConnectionSummary::of),
            extract: self.extract_connection().map(ConnectionSummary::of),
            columns: self
                .columns
                .iter()
                .map(|column| ColumnSummary {
                    name: column.name.clone(),
                    caption: column.caption.clone(),
                    datatype: column.datatype.map(|value| value.to_string()),
                    role: column.role.map(|value| value.to_string()),
                    folder: self.folder_of(&column.name).map(str::to_string),
                    calculated: column.is_calculated(),
                })
                .collect(),
            folders: self
                .folders
                .iter()
                .flat_map(|common| common.folders.iter())
                .map(|folder| FolderSummary {
                    name: folder.name.clone(),
                    items: folder.items.keys().map(str::to_string).collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_lists_columns_with_their_folder() {
        let document = Document::from_xml(
            r"<datasource>
  <connection class='federated'>
    <relation name='Orders' table='[PUBLIC].[ORDERS]' type='table' />
  </connection>
  <column datatype='real' name='[AMOUNT]' role='measure' type='quantitative' />
  <column datatype='string' name='[REGION]' role='dimension' type='nominal' />
  <folders-common>
    <folder name='Money'>
      <folder-item name='[AMOUNT]' type='field' />
    </folder>
  </folders-common>
</datasource>",
        )
        .unwrap();
        let summary = document.summary();
        assert_eq!(
            summary.sections,
            vec![
                SectionKind::Connection,
                SectionKind::Columns,
                SectionKind::FoldersCommon
            ]
        );
        assert_eq!(summary.columns[0].folder.as_deref(), Some("Money"));
        assert_eq!(summary.columns[1].folder, None);
        let connection = summary.connection.unwrap();
        assert_eq!(connection.relation.as_deref(), Some("Orders"));
        assert_eq!(connection.metadata_records, 0);

        let json = serde_json::to_value(document.summary()).unwrap();
        assert_eq!(json["kind"], "tds");
        assert_eq!(json["sections"][2], "folders-common");
    }
}
