//! `.tdsx` container handling.
//!
//! A packaged datasource is a zip holding exactly one `.tds` document plus
//! optional extract payload. Only the document is ever rewritten; every other
//! member is copied raw into the new archive.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::FileError;

fn is_primary(member: &str) -> bool {
    member.to_ascii_lowercase().ends_with(".tds")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Archive {
    bytes: Vec<u8>,
    primary: String,
    has_extract_payload: bool,
}

impl Archive {
    /// Read the container and return it together with the primary document text.
    pub(crate) fn read(bytes: &[u8]) -> Result<(Self, String), FileError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut primary: Option<String> = None;
        let mut has_extract_payload = false;
        for index in 0..zip.len() {
            let member = zip.by_index_raw(index)?;
            if member.is_dir() {
                continue;
            }
            let name = member.name().to_string();
            if !is_primary(&name) {
                has_extract_payload = true;
                continue;
            }
            if let Some(first) = &primary {
                return Err(FileError::format(format!(
                    "archive holds more than one datasource document: {first}, {name}"
                )));
            }
            primary = Some(name);
        }
        let primary =
            primary.ok_or_else(|| FileError::format("archive holds no .tds document"))?;

        let mut xml = String::new();
        zip.by_name(&primary)?
            .read_to_string(&mut xml)
            .map_err(|error| FileError::format(format!("{primary} is not UTF-8 text: {error}")))?;

        tracing::debug!(
            member = %primary,
            has_extract_payload,
            "read datasource archive"
        );
        Ok((
            Self {
                bytes: bytes.to_vec(),
                primary,
                has_extract_payload,
            },
            xml,
        ))
    }

    pub(crate) const fn has_extract_payload(&self) -> bool {
        self.has_extract_payload
    }

    pub(crate) fn primary(&self) -> &str {
        &self.primary
    }

    /// A copy of the original archive with the primary member replaced.
    pub(crate) fn repack(&self, document: &[u8]) -> Result<Vec<u8>, FileError> {
        let mut source = ZipArchive::new(Cursor::new(self.bytes.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for index in 0..source.len() {
            let member = source.by_index_raw(index)?;
            if member.name() == self.primary {
                drop(member);
                let options =
                    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                writer.start_file(self.primary.as_str(), options)?;
                writer.write_all(document)?;
            } else {
                writer.raw_copy_file(member)?;
            }
        }
        Ok(writer.finish()?.into_inner())
    }
}
