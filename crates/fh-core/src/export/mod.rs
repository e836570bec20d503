//! Export functionality for comment threads
//!
//! This module renders a post's comment forest as indented text, Markdown,
//! or nested JSON.
//!
//! # Example
//!
//! ```ignore
//! use fh_core::export::ExportManager;
//!
//! let manager = ExportManager::new();
//! let text = manager.export(thread.post_id(), thread.forest(), "text")?;
//! let json = manager.export(thread.post_id(), thread.forest(), "json")?;
//! ```

mod exporter;
mod json;
mod markdown;
mod text;

pub use exporter::{ExportManager, ThreadExporter};
pub use json::JsonExporter;
pub use markdown::MarkdownExporter;
pub use text::TextExporter;
