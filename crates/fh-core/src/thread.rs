//! Comment thread of a single post
//!
//! A [`CommentThread`] is what a post page works with: it loads the post's
//! comments once, builds the forest, and then applies each change to the
//! store first and to the local forest only after the store accepted it.
//! A failed store call leaves the forest exactly as it was.

use crate::comment::{
    BuildOptions, CommentForest, CommentRecord, CommentStore, CommentValidator, NewComment,
    ReplyPlacement,
};
use crate::config::Config;
use crate::error::{FanHubError, Result};
use crate::types::{Actor, CommentId, PostId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of posting a comment
#[derive(Debug, Clone)]
pub struct Posted {
    /// The record as stored
    pub record: CommentRecord,
    /// Whether the comment was added to the local forest
    pub visible: bool,
}

/// Live comment thread for one post
pub struct CommentThread {
    store: Arc<dyn CommentStore>,
    post_id: PostId,
    forest: CommentForest,
    validator: CommentValidator,
    options: BuildOptions,
}

impl CommentThread {
    /// Load a post's comments with default settings
    pub fn open(store: Arc<dyn CommentStore>, post_id: PostId) -> Result<Self> {
        Self::open_with(store, post_id, &Config::default())
    }

    /// Load a post's comments using the given configuration
    pub fn open_with(store: Arc<dyn CommentStore>, post_id: PostId, config: &Config) -> Result<Self> {
        post_id.validate()?;
        let options = config.build_options();
        let records = store
            .list(&post_id)
            .map_err(|e| e.with_context(format!("loading comments of post {}", post_id)))?;
        let forest = CommentForest::build_with(records, options);
        info!(
            "Opened thread for post {} ({} comments)",
            post_id,
            forest.len()
        );

        Ok(Self {
            store,
            post_id,
            forest,
            validator: CommentValidator::with_max_length(config.comments.max_length),
            options,
        })
    }

    /// The post this thread belongs to
    pub fn post_id(&self) -> &PostId {
        &self.post_id
    }

    /// Current forest
    pub fn forest(&self) -> &CommentForest {
        &self.forest
    }

    /// Comment counter kept by the store
    pub fn comment_count(&self) -> Result<u64> {
        self.store.comment_count(&self.post_id)
    }

    /// Post a new comment or reply
    pub fn post(&mut self, draft: NewComment) -> Result<Posted> {
        self.validator.validate_new(&draft)?;

        let record = self
            .store
            .create(&self.post_id, draft)
            .map_err(|e| e.with_context("posting comment"))?;

        let visible = match record.parent_id.clone() {
            None => self.forest.insert_root(record.clone()),
            Some(parent_id) => {
                let placement = self.forest.insert_reply(&parent_id, record.clone());
                debug!("Reply {} placed as {:?}", record.id, placement);
                placement != ReplyPlacement::Dropped
            }
        };

        info!("Posted comment {} on post {}", record.id, self.post_id);
        Ok(Posted { record, visible })
    }

    /// Check that `actor` may change the comment, before any write
    ///
    /// Comments missing from the local forest (dropped orphans, stale views)
    /// are looked up in the store.
    fn authorize(&self, actor: &Actor, comment_id: &CommentId) -> Result<()> {
        let author = match self.forest.get(comment_id) {
            Some(record) => record.author_id.clone(),
            None => self
                .store
                .list(&self.post_id)?
                .into_iter()
                .find(|record| &record.id == comment_id)
                .map(|record| record.author_id)
                .ok_or_else(|| FanHubError::CommentNotFound(comment_id.to_string()))?,
        };

        if actor.can_modify(&author) {
            Ok(())
        } else {
            warn!(
                "{} tried to change comment {} by {}",
                actor.user_id, comment_id, author
            );
            Err(FanHubError::PermissionDenied(format!(
                "{} is neither the author of comment {} nor an admin",
                actor.user_id, comment_id
            )))
        }
    }

    /// Edit a comment's text on behalf of `actor`
    pub fn edit(&mut self, actor: &Actor, comment_id: &CommentId, text: &str) -> Result<CommentRecord> {
        self.validator.validate_text(text)?;
        self.authorize(actor, comment_id)?;

        let record = self
            .store
            .update_text(&self.post_id, comment_id, text)
            .map_err(|e| e.with_context(format!("editing comment {}", comment_id)))?;

        if !self.forest.update_record(&record) {
            debug!("Edited comment {} is not in the local thread", comment_id);
        }
        info!("Edited comment {} on post {}", comment_id, self.post_id);
        Ok(record)
    }

    /// Delete a comment and its replies on behalf of `actor`
    ///
    /// Returns the ids the store removed.
    pub fn remove(&mut self, actor: &Actor, comment_id: &CommentId) -> Result<Vec<CommentId>> {
        self.authorize(actor, comment_id)?;
        let removed = self
            .store
            .delete(&self.post_id, comment_id)
            .map_err(|e| e.with_context(format!("deleting comment {}", comment_id)))?;

        let local = self.forest.delete_subtree(comment_id);
        if local.len() != removed.len() {
            debug!(
                "Store removed {} comment(s), local thread removed {}",
                removed.len(),
                local.len()
            );
        }
        info!(
            "Deleted comment {} and {} repl(ies) on post {}",
            comment_id,
            removed.len().saturating_sub(1),
            self.post_id
        );
        Ok(removed)
    }

    /// Reload everything from the store
    pub fn refresh(&mut self) -> Result<()> {
        let records = self.store.list(&self.post_id)?;
        self.forest = CommentForest::build_with(records, self.options);
        debug!("Refreshed thread for post {}", self.post_id);
        Ok(())
    }
}
