//! Comment data models

use crate::types::{CommentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment as stored for a post
///
/// Field names follow the document shape of the comment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    /// Store-assigned identifier
    pub id: CommentId,
    /// User-authored content
    pub text: String,
    /// Authoring user
    pub author_id: UserId,
    /// Comment this one replies to; `None` for top-level comments
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    /// When the store accepted the comment
    pub created_at: DateTime<Utc>,
    /// When the text last changed
    #[serde(default = "epoch")]
    pub updated_at: DateTime<Utc>,
    /// Set once the text has been edited
    #[serde(default)]
    pub is_edited: bool,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl CommentRecord {
    /// Create a fresh, unedited record
    pub fn new(
        id: CommentId,
        author_id: UserId,
        text: impl Into<String>,
        parent_id: Option<CommentId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            author_id,
            parent_id,
            created_at,
            updated_at: created_at,
            is_edited: false,
        }
    }

    /// Replace the text and mark the comment as edited
    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.is_edited = true;
        self.updated_at = Utc::now();
    }

    /// Whether this comment is a reply to another comment
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Whether the record names itself as its parent
    pub fn is_self_parented(&self) -> bool {
        self.parent_id.as_ref() == Some(&self.id)
    }
}

/// Payload for creating a comment, before the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    /// Comment content
    pub text: String,
    /// Authoring user
    pub author_id: UserId,
    /// Comment being replied to
    #[serde(default)]
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    /// Turn the draft into a record with the identity the store assigned
    pub fn into_record(self, id: CommentId, created_at: DateTime<Utc>) -> CommentRecord {
        CommentRecord::new(id, self.author_id, self.text, self.parent_id, created_at)
    }
}

/// Owned, nested view of a comment and its replies
///
/// Dropping is iterative. Serde support recurses, so whole threads of
/// unbounded depth are exported through `JsonExporter` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    /// The comment itself
    #[serde(flatten)]
    pub record: CommentRecord,
    /// Direct replies, in arrival order
    #[serde(default)]
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    /// Create a leaf node
    pub fn leaf(record: CommentRecord) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including this one
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
