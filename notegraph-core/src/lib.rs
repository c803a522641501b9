//! Client-side cache of a server-held note graph.
//!
//! The primary entry point is [`GraphCache`], which lazily loads notes,
//! branches and attributes through a [`Transport`], keeps them wired into a
//! [`Graph`], and patches that graph as server change notifications arrive.
//! Read access goes through [`NoteRef`] views obtained from the graph.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    attachment::Attachment,
    attribute::{
        validate_attribute_name, Attribute, AttributeDefinition, AttributeType, LabelType,
        Multiplicity,
    },
    attribute_cache::AttributeInheritanceCache,
    blob::{Blob, BlobCache, BlobEntity},
    branch::{Branch, VIRTUAL_BRANCH_PREFIX},
    cache::{CacheEvent, GraphCache, SearchOutcome},
    config::CacheConfig,
    error::{NotegraphError, Result},
    graph::Graph,
    note::{Note, NoteRef, ScriptEnv},
    note_path::{NotePathRecord, NOTE_PATH_SEPARATOR},
    note_type::NoteType,
    rows::{
        AttachmentRow, AttributeRow, BlobRow, BranchRow, EntityChange, NoteRow, SearchNoteResponse,
        SubtreeResponse,
    },
    transport::Transport,
    updater::{LoadResults, RevisionChange},
};
