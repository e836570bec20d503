//! Comment builder for fluent API

use super::model::NewComment;
use crate::error::{FanHubError, Result};
use crate::types::{CommentId, UserId};

/// Builder for comment drafts
pub struct CommentBuilder {
    author_id: UserId,
    text: Option<String>,
    parent_id: Option<CommentId>,
}

impl CommentBuilder {
    /// Start a draft for the given author
    pub fn new(author_id: UserId) -> Self {
        Self {
            author_id,
            text: None,
            parent_id: None,
        }
    }

    /// Set the comment text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Make the draft a reply
    pub fn reply_to(mut self, parent_id: CommentId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Build the draft
    pub fn build(self) -> Result<NewComment> {
        let text = self.text.ok_or_else(|| {
            FanHubError::Validation("Comment text is required".to_string())
        })?;

        if text.trim().is_empty() {
            return Err(FanHubError::Validation(
                "Comment text cannot be empty".to_string(),
            ));
        }

        Ok(NewComment {
            text,
            author_id: self.author_id,
            parent_id: self.parent_id,
        })
    }
}
