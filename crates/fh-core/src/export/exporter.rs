//! Exporter trait and manager

use crate::comment::CommentForest;
use crate::config::DisplayConfig;
use crate::error::{FanHubError, Result};
use crate::types::PostId;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Trait for thread exporters
pub trait ThreadExporter: Send + Sync {
    /// Export a post's comment forest to string
    fn export(&self, post_id: &PostId, forest: &CommentForest) -> Result<String>;

    /// Get the format name
    fn format_name(&self) -> &str;

    /// Get the file extension
    fn file_extension(&self) -> &str;
}

/// Manager for handling multiple export formats
pub struct ExportManager {
    exporters: HashMap<String, Box<dyn ThreadExporter>>,
}

impl ExportManager {
    /// Create a new export manager with default exporters
    pub fn new() -> Self {
        Self::from_config(&DisplayConfig::default())
    }

    /// Create a manager whose text exporters follow the display settings
    pub fn from_config(display: &DisplayConfig) -> Self {
        let mut manager = Self {
            exporters: HashMap::new(),
        };

        manager.register(Box::new(
            super::text::TextExporter::new()
                .with_indent(display.indent)
                .with_relative_times(display.relative_times),
        ));
        manager.register(Box::new(
            super::markdown::MarkdownExporter::new().with_indent(display.indent),
        ));
        manager.register(Box::new(super::json::JsonExporter::new(false)));
        manager.register(Box::new(super::json::JsonExporter::compact()));

        manager
    }

    /// Register a new exporter
    pub fn register(&mut self, exporter: Box<dyn ThreadExporter>) {
        self.exporters
            .insert(exporter.format_name().to_string(), exporter);
    }

    fn exporter(&self, format: &str) -> Result<&dyn ThreadExporter> {
        self.exporters
            .get(format)
            .map(|e| e.as_ref())
            .ok_or_else(|| FanHubError::Validation(format!("Unknown export format: {}", format)))
    }

    /// Export a forest to the specified format
    pub fn export(&self, post_id: &PostId, forest: &CommentForest, format: &str) -> Result<String> {
        self.exporter(format)?.export(post_id, forest)
    }

    /// Export a forest to a file, returning the path written
    ///
    /// The format's extension is added when `path` has none.
    pub fn export_to_file(
        &self,
        post_id: &PostId,
        forest: &CommentForest,
        format: &str,
        path: &Path,
    ) -> Result<PathBuf> {
        let exporter = self.exporter(format)?;
        let content = exporter.export(post_id, forest)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let final_path = if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension(exporter.file_extension())
        };

        // Atomic write using temp file
        let temp_path = final_path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.flush()?;
        }
        fs::rename(&temp_path, &final_path)?;

        debug!("Exported post {} as {} to {:?}", post_id, format, final_path);
        Ok(final_path)
    }

    /// Get available format names, sorted
    pub fn formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.exporters.keys().map(|s| s.as_str()).collect();
        formats.sort_unstable();
        formats
    }
}

impl Default for ExportManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::CommentRecord;
    use crate::types::{CommentId, UserId};
    use chrono::Utc;
    use tempfile::TempDir;

    fn forest() -> CommentForest {
        CommentForest::build(vec![CommentRecord::new(
            CommentId::from_string("a"),
            UserId::from_string("u"),
            "hello",
            None,
            Utc::now(),
        )])
    }

    #[test]
    fn test_default_formats() {
        let manager = ExportManager::new();
        assert_eq!(
            manager.formats(),
            vec!["json", "json-compact", "markdown", "text"]
        );
    }

    #[test]
    fn test_unknown_format() {
        let manager = ExportManager::new();
        let result = manager.export(&PostId::from_string("p"), &forest(), "yaml");
        assert!(matches!(result, Err(FanHubError::Validation(_))));
    }

    #[test]
    fn test_export_to_file_adds_extension() {
        let dir = TempDir::new().unwrap();
        let manager = ExportManager::new();

        let written = manager
            .export_to_file(
                &PostId::from_string("p"),
                &forest(),
                "markdown",
                &dir.path().join("out/thread"),
            )
            .unwrap();

        assert_eq!(written, dir.path().join("out/thread.md"));
        let content = fs::read_to_string(&written).unwrap();
        assert!(content.contains("hello"));
        assert!(!dir.path().join("out/thread.tmp").exists());
    }
}
