//! Comment store trait and abstractions

use super::model::{CommentRecord, NewComment};
use crate::error::Result;
use crate::types::{CommentId, PostId};
use std::collections::{HashMap, HashSet};

/// Trait for the backend that persists a post's comments
///
/// Implementations assign ids and timestamps on create, and delete a
/// comment's replies along with it.
pub trait CommentStore: Send + Sync {
    /// All comments of a post, oldest first
    fn list(&self, post_id: &PostId) -> Result<Vec<CommentRecord>>;

    /// Persist a new comment and return the stored record
    fn create(&self, post_id: &PostId, draft: NewComment) -> Result<CommentRecord>;

    /// Replace a comment's text and return the stored record
    fn update_text(&self, post_id: &PostId, comment_id: &CommentId, text: &str) -> Result<CommentRecord>;

    /// Delete a comment and its replies, returning every removed id
    fn delete(&self, post_id: &PostId, comment_id: &CommentId) -> Result<Vec<CommentId>>;

    /// Number of comments the post currently has
    fn comment_count(&self, post_id: &PostId) -> Result<u64>;
}

/// Ids of `root` and every record that transitively replies to it
///
/// `root` comes first; the rest follow in breadth-first order. Parent cycles
/// in `records` are tolerated.
pub fn cascade_ids(records: &[CommentRecord], root: &CommentId) -> Vec<CommentId> {
    let mut replies: HashMap<&CommentId, Vec<&CommentId>> = HashMap::new();
    for record in records {
        if let Some(parent) = &record.parent_id {
            replies.entry(parent).or_default().push(&record.id);
        }
    }

    let mut seen: HashSet<&CommentId> = HashSet::new();
    let mut ordered = Vec::new();
    let mut queue = std::collections::VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        ordered.push(id.clone());
        if let Some(children) = replies.get(id) {
            queue.extend(children.iter().copied());
        }
    }
    ordered
}

/// Sort records oldest first, keeping store order for equal timestamps
pub fn sort_by_creation(records: &mut [CommentRecord]) {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
}
