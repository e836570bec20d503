//! fh-core - Core library for fanhub
//!
//! This crate provides the core logic behind a fan-community post's comment
//! section: the comment model, the threaded comment forest, validation, the
//! comment store abstraction, the thread controller and export.

pub mod error;
pub mod types;
pub mod config;
pub mod comment;
pub mod thread;
pub mod export;
pub mod time;

pub use error::{FanHubError, Result};
pub use types::*;
