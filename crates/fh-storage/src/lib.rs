//! fh-storage - Storage library for fanhub
//!
//! This crate provides the file-system implementation of the comment store.

mod comment_store;

pub use comment_store::{FileSystemStore, PostCommentsFile, CURRENT_SCHEMA_VERSION};
