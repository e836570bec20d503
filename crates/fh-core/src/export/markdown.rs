//! Markdown exporter for comment threads

use super::exporter::ThreadExporter;
use crate::comment::CommentForest;
use crate::error::Result;
use crate::time::format_absolute;
use crate::types::PostId;

/// Markdown exporter rendering threads as nested lists
pub struct MarkdownExporter {
    /// Spaces per nesting level
    indent: usize,
    /// Include the summary section
    include_stats: bool,
}

impl MarkdownExporter {
    /// Create a new Markdown exporter with default settings
    pub fn new() -> Self {
        Self {
            indent: 2,
            include_stats: true,
        }
    }

    /// Set spaces per nesting level (at least 2, so lists still nest)
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent.max(2);
        self
    }

    /// Set whether to include statistics
    pub fn with_stats(mut self, include: bool) -> Self {
        self.include_stats = include;
        self
    }

    fn render_stats(&self, forest: &CommentForest) -> String {
        if !self.include_stats {
            return String::new();
        }

        let mut stats = String::new();
        stats.push_str("## Summary\n\n");
        stats.push_str(&format!("- **Comments:** {}\n", forest.len()));
        stats.push_str(&format!("- **Threads:** {}\n", forest.root_count()));
        stats.push_str(&format!(
            "- **Participants:** {}\n",
            forest.author_ids().len()
        ));
        stats.push_str(&format!("- **Deepest reply level:** {}\n", forest.max_depth()));
        stats.push('\n');
        stats
    }

    fn render_thread(&self, forest: &CommentForest) -> String {
        if forest.is_empty() {
            return "_No comments yet._\n".to_string();
        }

        let mut output = String::from("## Comments\n\n");
        for (depth, record) in forest.iter() {
            let pad = " ".repeat(depth * self.indent);
            output.push_str(&format!(
                "{}- **{}** · {}{}\n",
                pad,
                record.author_id,
                format_absolute(record.created_at),
                if record.is_edited { " _(edited)_" } else { "" }
            ));
            for line in record.text.lines() {
                output.push_str(&format!("{}  {}\n", pad, line));
            }
        }
        output
    }
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadExporter for MarkdownExporter {
    fn export(&self, post_id: &PostId, forest: &CommentForest) -> Result<String> {
        let mut output = format!("# Comments on post `{}`\n\n", post_id);
        output.push_str(&self.render_stats(forest));
        output.push_str(&self.render_thread(forest));
        Ok(output)
    }

    fn format_name(&self) -> &str {
        "markdown"
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}
