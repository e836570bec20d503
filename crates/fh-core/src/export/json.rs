//! JSON exporter for comment threads
//!
//! The document nests replies under `children`. It is written with an
//! explicit stack over the forest's pre-order walk, so arbitrarily deep
//! threads export without recursion; each comment's own fields go through
//! serde.

use super::exporter::ThreadExporter;
use crate::comment::{CommentForest, CommentRecord};
use crate::error::Result;
use crate::types::{PostId, ProtocolVersion};
use serde::Serialize;

/// JSON exporter with compact mode support
pub struct JsonExporter {
    /// Whether to use pretty-print formatting
    pretty: bool,
    /// Format name
    name: String,
}

impl JsonExporter {
    /// Create a new JSON exporter
    pub fn new(compact: bool) -> Self {
        Self {
            pretty: !compact,
            name: if compact {
                "json-compact".to_string()
            } else {
                "json".to_string()
            },
        }
    }

    /// Create a compact JSON exporter
    pub fn compact() -> Self {
        Self::new(true)
    }

    /// Create a pretty-printed JSON exporter
    pub fn pretty() -> Self {
        Self::new(false)
    }
}

impl ThreadExporter for JsonExporter {
    fn export(&self, post_id: &PostId, forest: &CommentForest) -> Result<String> {
        let mut w = JsonWriter::new(self.pretty);

        w.out.push('{');
        w.field(1, "version", &ProtocolVersion::V1_0.to_string())?;
        w.field(1, "postId", post_id)?;
        w.field(1, "commentCount", &forest.len())?;
        w.field(1, "threadCount", &forest.root_count())?;
        w.break_line(1);
        w.key("comments")?;
        w.out.push('[');

        // One entry per open comment on the current path: has it replies yet?
        let mut open: Vec<bool> = Vec::new();
        let mut any_root = false;
        for (depth, record) in forest.iter() {
            while open.len() > depth {
                let had_children = open.pop().unwrap_or(false);
                w.close_node(node_level(open.len()), had_children);
            }

            let has_sibling_before = match open.last_mut() {
                Some(parent_has_children) => std::mem::replace(parent_has_children, true),
                None => std::mem::replace(&mut any_root, true),
            };
            if has_sibling_before {
                w.out.push(',');
            }
            w.break_line(node_level(depth));
            w.open_node(record, node_level(depth))?;
            open.push(false);
        }
        while let Some(had_children) = open.pop() {
            w.close_node(node_level(open.len()), had_children);
        }

        if any_root {
            w.break_line(1);
        }
        w.out.push(']');
        w.break_line(0);
        w.out.push('}');
        Ok(w.out)
    }

    fn format_name(&self) -> &str {
        &self.name
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}

/// Indent level of a comment object at `depth`
fn node_level(depth: usize) -> usize {
    2 + 2 * depth
}

struct JsonWriter {
    out: String,
    pretty: bool,
}

impl JsonWriter {
    fn new(pretty: bool) -> Self {
        Self {
            out: String::new(),
            pretty,
        }
    }

    fn break_line(&mut self, level: usize) {
        if self.pretty {
            self.out.push('\n');
            self.out.push_str(&"  ".repeat(level));
        }
    }

    fn key(&mut self, key: &str) -> Result<()> {
        self.out.push_str(&serde_json::to_string(key)?);
        self.out.push(':');
        if self.pretty {
            self.out.push(' ');
        }
        Ok(())
    }

    fn field<T: Serialize + ?Sized>(&mut self, level: usize, key: &str, value: &T) -> Result<()> {
        self.break_line(level);
        self.key(key)?;
        self.out.push_str(&serde_json::to_string(value)?);
        self.out.push(',');
        Ok(())
    }

    /// Write the record's fields and open its `children` array
    fn open_node(&mut self, record: &CommentRecord, level: usize) -> Result<()> {
        let body = if self.pretty {
            serde_json::to_string_pretty(record)?
        } else {
            serde_json::to_string(record)?
        };
        // Leave the object open so the replies can follow its fields.
        let fields = body.strip_suffix('}').unwrap_or(&body).trim_end();

        if self.pretty {
            let indent = "  ".repeat(level);
            for (i, line) in fields.lines().enumerate() {
                if i > 0 {
                    self.out.push('\n');
                    self.out.push_str(&indent);
                }
                self.out.push_str(line);
            }
        } else {
            self.out.push_str(fields);
        }

        self.out.push(',');
        self.break_line(level + 1);
        self.key("children")?;
        self.out.push('[');
        Ok(())
    }

    fn close_node(&mut self, level: usize, had_children: bool) {
        if had_children {
            self.break_line(level + 1);
        }
        self.out.push(']');
        self.break_line(level);
        self.out.push('}');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommentId, UserId};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn rec(id: &str, parent: Option<&str>) -> CommentRecord {
        CommentRecord::new(
            CommentId::from_string(id),
            UserId::from_string("u"),
            "t",
            parent.map(CommentId::from_string),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        )
    }

    fn forest() -> CommentForest {
        CommentForest::build(vec![
            rec("a", None),
            rec("b", Some("a")),
            rec("c", None),
            rec("d", Some("b")),
            rec("e", Some("a")),
        ])
    }

    fn chain(depth: usize) -> CommentForest {
        let mut records = vec![rec("n0", None)];
        for i in 1..depth {
            let parent = format!("n{}", i - 1);
            records.push(rec(&format!("n{}", i), Some(parent.as_str())));
        }
        CommentForest::build(records)
    }

    #[test]
    fn test_json_structure() {
        let output = JsonExporter::pretty()
            .export(&PostId::from_string("p1"), &forest())
            .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["version"], "1.0");
        assert_eq!(value["postId"], "p1");
        assert_eq!(value["commentCount"], 5);
        assert_eq!(value["threadCount"], 2);
        assert_eq!(value["comments"][0]["id"], "a");
        assert_eq!(value["comments"][0]["children"][0]["parentId"], "a");
        assert_eq!(value["comments"][0]["children"][0]["children"][0]["id"], "d");
        assert_eq!(value["comments"][0]["children"][1]["id"], "e");
        assert_eq!(value["comments"][1]["children"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_matches_serialized_snapshot() {
        let forest = forest();
        let output = JsonExporter::pretty()
            .export(&PostId::from_string("p1"), &forest)
            .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["comments"], serde_json::to_value(forest.to_nodes()).unwrap());
    }

    #[test]
    fn test_pretty_layout() {
        let forest = CommentForest::build(vec![rec("a", None), rec("b", Some("a"))]);
        let output = JsonExporter::pretty()
            .export(&PostId::from_string("p1"), &forest)
            .unwrap();

        assert!(output.starts_with("{\n  \"version\": \"1.0\",\n  \"postId\": \"p1\",\n"));
        assert!(output.contains("\n  \"comments\": [\n    {\n      \"id\": \"a\",\n"));
        assert!(output.contains("\n      \"children\": [\n        {\n          \"id\": \"b\",\n"));
        assert!(output.contains("\"isEdited\": false,\n          \"children\": []\n        }\n      ]\n    }\n  ]\n}"));
    }

    #[test]
    fn test_empty_forest() {
        let output = JsonExporter::compact()
            .export(&PostId::from_string("p1"), &CommentForest::new())
            .unwrap();
        assert_eq!(
            output,
            r#"{"version":"1.0","postId":"p1","commentCount":0,"threadCount":0,"comments":[]}"#
        );
    }

    #[test]
    fn test_compact_has_no_newlines() {
        let exporter = JsonExporter::compact();
        assert_eq!(exporter.format_name(), "json-compact");
        let output = exporter
            .export(&PostId::from_string("p1"), &forest())
            .unwrap();
        assert!(!output.contains('\n'));

        let pretty = JsonExporter::pretty()
            .export(&PostId::from_string("p1"), &forest())
            .unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&output).unwrap(),
            serde_json::from_str::<Value>(&pretty).unwrap()
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let mut record = rec("a", None);
        record.text = "line one\n\"quoted\" }".to_string();
        let output = JsonExporter::pretty()
            .export(&PostId::from_string("p1"), &CommentForest::build(vec![record]))
            .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["comments"][0]["text"], "line one\n\"quoted\" }");
    }

    #[test]
    fn test_nesting_follows_chain() {
        // Two JSON levels per comment keeps this under serde_json's read limit.
        let depth = 50;
        let output = JsonExporter::compact()
            .export(&PostId::from_string("p1"), &chain(depth))
            .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        let mut node = &value["comments"][0];
        for i in 1..depth {
            node = &node["children"][0];
            assert_eq!(node["id"], format!("n{}", i));
        }
        assert_eq!(node["children"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_deep_chain_exports_without_recursion() {
        let depth = 10_000;
        let output = JsonExporter::compact()
            .export(&PostId::from_string("p1"), &chain(depth))
            .unwrap();

        assert!(output.contains("\"id\":\"n9999\""));
        assert_eq!(output.matches("\"children\"").count(), depth);
        // Innermost reply closes first, then every ancestor, then the document.
        let closing = format!("[]}}{}]}}", "]}".repeat(depth - 1));
        assert!(output.ends_with(&closing));
    }
}
