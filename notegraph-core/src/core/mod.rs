//! Internal domain modules for the notegraph core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod attachment;
pub mod attribute;
pub mod attribute_cache;
pub mod blob;
pub mod branch;
pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod note;
pub mod note_path;
pub mod note_type;
pub mod rows;
pub mod transport;
pub mod updater;

#[cfg(test)]
pub(crate) mod test_support;

#[doc(inline)]
pub use attachment::Attachment;
#[doc(inline)]
pub use attribute::{
    validate_attribute_name, Attribute, AttributeDefinition, AttributeType, LabelType, Multiplicity,
};
#[doc(inline)]
pub use attribute_cache::AttributeInheritanceCache;
#[doc(inline)]
pub use blob::{Blob, BlobCache, BlobEntity};
#[doc(inline)]
pub use branch::{Branch, VIRTUAL_BRANCH_PREFIX};
#[doc(inline)]
pub use cache::{CacheEvent, GraphCache, SearchOutcome};
#[doc(inline)]
pub use config::CacheConfig;
#[doc(inline)]
pub use error::{NotegraphError, Result};
#[doc(inline)]
pub use graph::Graph;
#[doc(inline)]
pub use note::{Note, NoteRef, ScriptEnv};
#[doc(inline)]
pub use note_path::{NotePathRecord, NOTE_PATH_SEPARATOR};
#[doc(inline)]
pub use note_type::NoteType;
#[doc(inline)]
pub use rows::{
    AttachmentRow, AttributeRow, BlobRow, BranchRow, EntityChange, NoteRow, SearchNoteResponse,
    SubtreeResponse,
};
#[doc(inline)]
pub use transport::Transport;
#[doc(inline)]
pub use updater::{LoadResults, RevisionChange};
