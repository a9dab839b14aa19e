//! # tds-file
//!
//! Datasource document codec and typed entity model.
//!
//! An artifact is either a bare `.tds` XML document or a `.tdsx` zip holding
//! one such document plus opaque extract payload. [`Document::open`] parses
//! the document into independent section values; [`Document::save`] rebuilds
//! the XML from those values, keeps every section at its original position,
//! and repacks the container with all other members copied unchanged.
//!
//! Sections are recognized through the matcher table in [`section`], which
//! covers the platform's feature-flagged element names.
//!
//! ```no_run
//! use std::path::Path;
//! use tds_file::Document;
//!
//! let mut document = Document::open_path(Path::new("orders.tdsx")).expect("open");
//! document.add_folder("Money").expect("new folder");
//! let bytes = document.save().expect("save");
//! ```

mod archive;
pub mod document;
mod enforce;
pub mod entities;
pub mod error;
pub mod section;
pub mod summary;
pub mod xml;

pub use document::{ArtifactKind, Document};
pub use entities::{
    AttributeDiff, Column, Connection, EntityList, Extract, Folder, FolderItem, FoldersCommon,
    Layout, MappingCol, MappingCols, MetadataRecord, MetadataRecords, NamedConnection, XmlEntity,
};
pub use error::FileError;
pub use section::SectionKind;
pub use summary::DocumentSummary;
