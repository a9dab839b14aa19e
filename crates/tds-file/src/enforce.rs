//! Document-level mutations used when applying tasks.

use tds_core::{CoreError, ExpectedConnection, MetadataTask};

use crate::document::Document;
use crate::entities::{Column, Folder, FoldersCommon, Layout};
use crate::error::FileError;

impl Document {
    /// Make the document carry `column` exactly as given.
    ///
    /// The column is added or overlaid by name. With a folder name it is moved
    /// into that folder (created when missing) and out of every other one. With
    /// a remote name, and unless the column is calculated, the matching
    /// metadata record in the connection and in the extract mirror is pointed
    /// at the column and mapped.
    pub fn enforce_column(
        &mut self,
        column: Column,
        folder_name: Option<&str>,
        remote_name: Option<&str>,
    ) -> Result<(), FileError> {
        let name = column.name.clone();
        let calculated = column.is_calculated();
        match self.columns.get_mut(&name) {
            Some(live) => live.overlay(column),
            None => self.columns.add(column)?,
        }

        if let Some(folder_name) = folder_name {
            self.place_in_folder(&name, folder_name)?;
        }

        let Some(remote_name) = remote_name.filter(|remote| !remote.is_empty()) else {
            return Ok(());
        };
        if calculated {
            tracing::debug!(column = %name, "calculated column, skipping metadata");
            return Ok(());
        }
        self.claim_remote_name(remote_name, &name)
    }

    fn place_in_folder(&mut self, column_name: &str, folder_name: &str) -> Result<(), FileError> {
        let common = self.folders.get_or_insert_with(FoldersCommon::default);
        for folder in common.folders.iter_mut() {
            if folder.name != folder_name && folder.unplace(column_name) {
                tracing::debug!(
                    column = %column_name,
                    from = %folder.name,
                    to = %folder_name,
                    "moving column between folders"
                );
            }
        }
        match common.folders.get_mut(folder_name) {
            Some(folder) => folder.place(column_name),
            None => {
                let mut folder = Folder::new(folder_name);
                folder.place(column_name);
                common.folders.add(folder)?;
            }
        }
        self.layout.get_or_insert_with(Layout::default).show_folders();
        Ok(())
    }

    /// Point the metadata record for `remote_name` at `column_name` in the
    /// connection and, when present, the extract mirror.
    pub fn claim_remote_name(
        &mut self,
        remote_name: &str,
        column_name: &str,
    ) -> Result<(), FileError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| CoreError::MetadataNotFound {
                remote_name: remote_name.to_string(),
                scope: "connection".to_string(),
            })?;
        connection.claim_remote_name(remote_name, column_name, "connection")?;
        if let Some(extract) = self.extract_connection_mut() {
            extract.claim_remote_name(remote_name, column_name, "extract")?;
        }
        Ok(())
    }

    /// Insert planned metadata records into the connection and, when the
    /// document has an extract mirror, into the extract connection.
    pub fn add_metadata(&mut self, task: &MetadataTask) -> Result<(), FileError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| FileError::format("datasource has no connection section"))?;
        connection.insert_metadata(&task.connection)?;
        match (self.extract.as_mut().and_then(|extract| extract.connection.as_mut()), &task.extract) {
            (Some(extract), Some(spec)) => extract.insert_metadata(spec)?,
            (Some(_), None) => tracing::warn!(
                remote_name = %task.connection.remote_name,
                "metadata task has no extract record but the datasource has an extract"
            ),
            (None, _) => {}
        }
        Ok(())
    }

    /// Overwrite the attributes `expected` carries on the named sub-connection
    /// of its class. Attributes it leaves out are not touched.
    pub fn update_connection(&mut self, expected: &ExpectedConnection) -> Result<(), FileError> {
        let named = self
            .connection
            .as_mut()
            .and_then(|connection| connection.named_connection_mut(&expected.class_name))
            .ok_or_else(|| CoreError::not_found("named connection", expected.class_name.clone()))?;
        for (field, value) in expected.present() {
            named.set(field, value);
        }
        if let Some(server) = &expected.server {
            named.caption = Some(server.clone());
        }
        Ok(())
    }

    pub fn add_folder(&mut self, name: &str) -> Result<(), FileError> {
        self.folders
            .get_or_insert_with(FoldersCommon::default)
            .folders
            .add(Folder::new(name))?;
        Ok(())
    }

    pub fn delete_folder(&mut self, name: &str) -> Result<Folder, FileError> {
        let common = self
            .folders
            .as_mut()
            .ok_or_else(|| CoreError::not_found("folder", name))?;
        Ok(common.folders.delete(name)?)
    }

    /// Remove every folder without items and return their names.
    pub fn remove_empty_folders(&mut self) -> Vec<String> {
        let Some(common) = self.folders.as_mut() else {
            return Vec::new();
        };
        let empty: Vec<String> = common
            .folders
            .iter()
            .filter(|folder| folder.items.is_empty())
            .map(|folder| folder.name.clone())
            .collect();
        common.folders.retain(|folder| !folder.items.is_empty());
        empty
    }
}
