//! Comment validation

use super::model::NewComment;
use crate::error::{FanHubError, Result};

/// Maximum comment length (default)
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Minimum comment length
pub const MIN_COMMENT_LENGTH: usize = 1;

/// Validator for comment payloads
pub struct CommentValidator {
    max_length: usize,
    min_length: usize,
}

impl CommentValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            max_length: MAX_COMMENT_LENGTH,
            min_length: MIN_COMMENT_LENGTH,
        }
    }

    /// Create a new validator with custom max length
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            min_length: MIN_COMMENT_LENGTH,
        }
    }

    /// Validate comment text
    ///
    /// Length is counted in characters after trimming.
    pub fn validate_text(&self, text: &str) -> Result<()> {
        let length = text.trim().chars().count();

        if length < self.min_length {
            return Err(FanHubError::Validation(
                "Comment text cannot be empty".to_string(),
            ));
        }

        if length > self.max_length {
            return Err(FanHubError::Validation(format!(
                "Comment text exceeds maximum length of {} characters",
                self.max_length
            )));
        }

        Ok(())
    }

    /// Validate a draft before it is sent to the store
    pub fn validate_new(&self, draft: &NewComment) -> Result<()> {
        self.validate_text(&draft.text)?;

        if draft.author_id.as_str().trim().is_empty() {
            return Err(FanHubError::Validation(
                "Comment author is required".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for CommentValidator {
    fn default() -> Self {
        Self::new()
    }
}
