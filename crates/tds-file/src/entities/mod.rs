//! Typed entities for the modeled sections.
//!
//! Every entity is an owned value parsed from one element. Whatever the model
//! does not manage is kept beside the typed fields and written back unchanged.

mod collection;
mod column;
mod connection;
mod extract;
mod folder;
mod layout;
mod mapping;
mod metadata;

pub use collection::{EntityList, Keyed, XmlEntity};
pub use column::{AttributeDiff, Calculation, Column, Description};
pub use connection::{Connection, NamedConnection};
pub use extract::Extract;
pub use folder::{Folder, FolderItem, FoldersCommon};
pub use layout::Layout;
pub use mapping::{MappingCol, MappingCols};
pub use metadata::{MetadataRecord, MetadataRecords};
