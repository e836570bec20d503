//! Plain-text thread renderer

use super::exporter::ThreadExporter;
use crate::comment::CommentForest;
use crate::error::Result;
use crate::time::{format_absolute, format_relative};
use crate::types::PostId;
use chrono::{DateTime, Utc};

/// Indented plain-text rendering, one block per comment
pub struct TextExporter {
    indent: usize,
    relative_times: bool,
    now: Option<DateTime<Utc>>,
}

impl TextExporter {
    pub fn new() -> Self {
        Self {
            indent: 2,
            relative_times: true,
            now: None,
        }
    }

    /// Spaces per nesting level
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Use relative instead of absolute timestamps
    pub fn with_relative_times(mut self, relative: bool) -> Self {
        self.relative_times = relative;
        self
    }

    /// Pin "now" for relative timestamps
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn timestamp(&self, at: DateTime<Utc>) -> String {
        if self.relative_times {
            format_relative(at, self.now.unwrap_or_else(Utc::now))
        } else {
            format_absolute(at)
        }
    }
}

impl Default for TextExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadExporter for TextExporter {
    fn export(&self, post_id: &PostId, forest: &CommentForest) -> Result<String> {
        let mut output = format!(
            "Post {} · {} comment{}\n",
            post_id,
            forest.len(),
            if forest.len() == 1 { "" } else { "s" }
        );

        if forest.is_empty() {
            output.push_str("\nNo comments yet. Be the first to comment!\n");
            return Ok(output);
        }

        for (depth, record) in forest.iter() {
            let pad = " ".repeat(depth * self.indent);
            if depth == 0 {
                output.push('\n');
            }

            output.push_str(&format!(
                "{}{} · {}{} [{}]\n",
                pad,
                record.author_id,
                self.timestamp(record.created_at),
                if record.is_edited { " (edited)" } else { "" },
                record.id
            ));
            for line in record.text.lines() {
                output.push_str(&format!("{}  {}\n", pad, line));
            }
        }

        Ok(output)
    }

    fn format_name(&self) -> &str {
        "text"
    }

    fn file_extension(&self) -> &str {
        "txt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::CommentRecord;
    use crate::types::{CommentId, UserId};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 18, 30, 0).unwrap()
    }

    fn rec(id: &str, parent: Option<&str>, text: &str, minutes_ago: i64) -> CommentRecord {
        CommentRecord::new(
            CommentId::from_string(id),
            UserId::from_string(format!("fan-{}", id)),
            text,
            parent.map(CommentId::from_string),
            now() - Duration::minutes(minutes_ago),
        )
    }

    #[test]
    fn test_text_rendering() {
        let mut edited = rec("b", Some("a"), "me too\nsecond line", 5);
        edited.is_edited = true;
        let forest = CommentForest::build(vec![rec("a", None, "love this", 90), edited]);

        let output = TextExporter::new()
            .with_now(now())
            .export(&PostId::from_string("p1"), &forest)
            .unwrap();

        assert_eq!(
            output,
            "Post p1 · 2 comments\n\
             \n\
             fan-a · 1 hour ago [a]\n\
             \x20\x20love this\n\
             \x20\x20fan-b · 5 minutes ago (edited) [b]\n\
             \x20\x20\x20\x20me too\n\
             \x20\x20\x20\x20second line\n"
        );
    }

    #[test]
    fn test_empty_thread() {
        let output = TextExporter::new()
            .export(&PostId::from_string("p1"), &CommentForest::new())
            .unwrap();
        assert!(output.starts_with("Post p1 · 0 comments"));
        assert!(output.contains("No comments yet"));
    }

    #[test]
    fn test_absolute_times() {
        let forest = CommentForest::build(vec![rec("a", None, "hi", 0)]);
        let output = TextExporter::new()
            .with_relative_times(false)
            .export(&PostId::from_string("p1"), &forest)
            .unwrap();
        assert!(output.contains("2024-05-15 18:30 UTC"));
    }
}
