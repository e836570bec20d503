//! Threaded comment forest
//!
//! Comments arrive from the store as a flat list in which replies point at
//! their parent through `parent_id`. [`CommentForest`] turns that list into
//! ordered trees and keeps them consistent as comments are posted, edited and
//! deleted, so a thread does not have to be fetched again after every change.
//!
//! Nodes live in an arena and refer to each other by index; an id map gives
//! constant-time lookup. Roots and every children list keep arrival order.
//! Every traversal is iterative, so nesting depth is not limited by the stack.

use super::model::{CommentNode, CommentRecord};
use crate::types::{CommentId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Handling of comments whose parent is not part of the loaded set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    /// Show the orphan (and its replies) as a top-level comment
    Promote,
    /// Leave the orphan and its replies out of the forest
    Drop,
}

impl Default for OrphanPolicy {
    fn default() -> Self {
        OrphanPolicy::Promote
    }
}

/// Handling of a reply whose parent is no longer in the forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyFallback {
    /// Append the reply to the top level, as a rebuild would
    PromoteToRoot,
    /// Discard the reply locally; the next refresh shows it
    Drop,
}

impl Default for ReplyFallback {
    fn default() -> Self {
        ReplyFallback::PromoteToRoot
    }
}

/// Policies applied while building and mutating a forest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub orphan_policy: OrphanPolicy,
    pub reply_fallback: ReplyFallback,
}

/// Where [`CommentForest::insert_reply`] put the new comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyPlacement {
    /// Appended to the parent's replies
    Nested,
    /// Parent missing; appended to the top level
    Promoted,
    /// Not inserted (parent missing under `ReplyFallback::Drop`, or duplicate id)
    Dropped,
}

#[derive(Debug, Clone)]
struct Slot {
    record: CommentRecord,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Slot {
    fn new(record: CommentRecord, parent: Option<usize>) -> Self {
        Self {
            record,
            parent,
            children: Vec::new(),
        }
    }
}

enum Link {
    Root,
    Child(usize),
    Orphan,
}

/// Ordered forest of comment threads for one post
#[derive(Debug, Clone, Default)]
pub struct CommentForest {
    /// Arena; `None` marks a deleted node
    slots: Vec<Option<Slot>>,
    /// Top-level comments in display order
    roots: Vec<usize>,
    /// Live nodes by comment id
    index: HashMap<CommentId, usize>,
    options: BuildOptions,
}

impl CommentForest {
    /// Create an empty forest with default policies
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty forest with the given policies
    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Build a forest from the flat list of a post's comments
    pub fn build(records: impl IntoIterator<Item = CommentRecord>) -> Self {
        Self::build_with(records, BuildOptions::default())
    }

    /// Build a forest with explicit policies
    ///
    /// Children may appear before their parent in `records`. Roots and
    /// sibling lists follow the order of `records`. The first record with a
    /// given id wins; later duplicates are skipped. A record naming itself as
    /// parent is treated as top-level, and reference cycles are broken by
    /// promoting the earliest unreachable record of each cycle to the top
    /// level.
    pub fn build_with(records: impl IntoIterator<Item = CommentRecord>, options: BuildOptions) -> Self {
        let mut forest = Self::with_options(options);

        for record in records {
            if forest.index.contains_key(&record.id) {
                warn!("Skipping duplicate comment {}", record.id);
                continue;
            }
            forest.push(record, None);
        }

        let mut dropped = Vec::new();
        for idx in 0..forest.slots.len() {
            match forest.resolve_parent(idx) {
                Link::Root => forest.roots.push(idx),
                Link::Child(parent) => forest.attach(idx, parent),
                Link::Orphan => match options.orphan_policy {
                    OrphanPolicy::Promote => forest.roots.push(idx),
                    OrphanPolicy::Drop => dropped.push(idx),
                },
            }
        }

        forest.repair_cycles(&dropped);

        for idx in dropped {
            let removed = forest.remove_at(idx);
            debug!("Dropped {} comment(s) under a missing parent", removed.len());
        }

        debug!(
            "Built comment forest: {} comments, {} threads",
            forest.len(),
            forest.roots.len()
        );
        forest
    }

    /// Policies in effect
    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Append a confirmed top-level comment
    ///
    /// Returns `false` and leaves the forest unchanged if the id is already
    /// present.
    pub fn insert_root(&mut self, record: CommentRecord) -> bool {
        if self.index.contains_key(&record.id) {
            warn!("Comment {} already in thread, not inserting", record.id);
            return false;
        }
        let idx = self.push(record, None);
        self.roots.push(idx);
        true
    }

    /// Append a confirmed reply under `parent_id`
    ///
    /// The record's `parent_id` is set to `parent_id`. When the parent is not
    /// in the forest the configured [`ReplyFallback`] decides the outcome.
    pub fn insert_reply(&mut self, parent_id: &CommentId, mut record: CommentRecord) -> ReplyPlacement {
        if self.index.contains_key(&record.id) {
            warn!("Comment {} already in thread, not inserting", record.id);
            return ReplyPlacement::Dropped;
        }
        record.parent_id = Some(parent_id.clone());

        if let Some(parent) = self.index.get(parent_id).copied() {
            let idx = self.push(record, Some(parent));
            if let Some(slot) = self.slot_mut(parent) {
                slot.children.push(idx);
            }
            return ReplyPlacement::Nested;
        }

        match self.options.reply_fallback {
            ReplyFallback::PromoteToRoot => {
                debug!(
                    "Parent {} of reply {} not in thread, promoting",
                    parent_id, record.id
                );
                let idx = self.push(record, None);
                self.roots.push(idx);
                ReplyPlacement::Promoted
            }
            ReplyFallback::Drop => {
                debug!(
                    "Parent {} of reply {} not in thread, dropping",
                    parent_id, record.id
                );
                ReplyPlacement::Dropped
            }
        }
    }

    /// Replace a comment's text and mark it edited
    ///
    /// Returns `false` when the comment is not in the forest.
    pub fn update_text(&mut self, comment_id: &CommentId, text: impl Into<String>) -> bool {
        let Some(idx) = self.index.get(comment_id).copied() else {
            debug!("Edit target {} not in thread", comment_id);
            return false;
        };
        match self.slot_mut(idx) {
            Some(slot) => {
                slot.record.edit(text);
                true
            }
            None => false,
        }
    }

    /// Apply the text, edit flag and timestamp of a store-confirmed record
    pub fn update_record(&mut self, record: &CommentRecord) -> bool {
        let Some(idx) = self.index.get(&record.id).copied() else {
            debug!("Edit target {} not in thread", record.id);
            return false;
        };
        match self.slot_mut(idx) {
            Some(slot) => {
                slot.record.text = record.text.clone();
                slot.record.is_edited = record.is_edited;
                slot.record.updated_at = record.updated_at;
                true
            }
            None => false,
        }
    }

    /// Remove a comment together with all of its replies
    ///
    /// Returns the removed records in pre-order; empty when the comment is
    /// not in the forest.
    pub fn delete_subtree(&mut self, comment_id: &CommentId) -> Vec<CommentRecord> {
        match self.index.get(comment_id).copied() {
            Some(idx) => self.remove_at(idx),
            None => {
                debug!("Delete target {} not in thread", comment_id);
                Vec::new()
            }
        }
    }

    /// Total number of comments at all depths
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check if a comment is present
    pub fn contains(&self, comment_id: &CommentId) -> bool {
        self.index.contains_key(comment_id)
    }

    /// Get a comment by ID
    pub fn get(&self, comment_id: &CommentId) -> Option<&CommentRecord> {
        self.lookup(comment_id).map(|slot| &slot.record)
    }

    /// Top-level comments in order
    pub fn roots(&self) -> impl Iterator<Item = &CommentRecord> + '_ {
        self.roots
            .iter()
            .filter_map(move |&idx| self.slot(idx))
            .map(|slot| &slot.record)
    }

    /// Number of top-level comments
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Direct replies to a comment, in order
    pub fn children(&self, comment_id: &CommentId) -> Vec<&CommentRecord> {
        self.lookup(comment_id)
            .map(|slot| {
                slot.children
                    .iter()
                    .filter_map(|&idx| self.slot(idx))
                    .map(|child| &child.record)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The comment a reply is nested under
    pub fn parent(&self, comment_id: &CommentId) -> Option<&CommentRecord> {
        let parent = self.lookup(comment_id)?.parent?;
        self.slot(parent).map(|slot| &slot.record)
    }

    /// Number of direct replies
    pub fn reply_count(&self, comment_id: &CommentId) -> usize {
        self.lookup(comment_id)
            .map(|slot| slot.children.len())
            .unwrap_or(0)
    }

    /// Number of replies at any depth below a comment
    pub fn descendant_count(&self, comment_id: &CommentId) -> usize {
        let Some(slot) = self.lookup(comment_id) else {
            return 0;
        };
        let mut count = 0;
        let mut stack: Vec<usize> = slot.children.clone();
        while let Some(idx) = stack.pop() {
            if let Some(child) = self.slot(idx) {
                count += 1;
                stack.extend(child.children.iter().copied());
            }
        }
        count
    }

    /// Nesting depth of a comment (top level is 0)
    pub fn depth(&self, comment_id: &CommentId) -> Option<usize> {
        let mut slot = self.lookup(comment_id)?;
        let mut depth = 0;
        while let Some(parent) = slot.parent {
            slot = self.slot(parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Deepest nesting level in the forest
    pub fn max_depth(&self) -> usize {
        self.iter().map(|(depth, _)| depth).max().unwrap_or(0)
    }

    /// Depth-first, pre-order walk yielding `(depth, record)`
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            forest: self,
            stack: self.roots.iter().rev().map(|&idx| (idx, 0)).collect(),
        }
    }

    /// Distinct authors in thread order
    pub fn author_ids(&self) -> Vec<&UserId> {
        let mut seen = HashSet::new();
        self.iter()
            .map(|(_, record)| &record.author_id)
            .filter(|author| seen.insert(*author))
            .collect()
    }

    /// Owned nested snapshot of the forest
    pub fn to_nodes(&self) -> Vec<CommentNode> {
        let mut order = Vec::with_capacity(self.len());
        let mut walk = self.iter();
        while let Some((idx, _, _)) = walk.next_slot() {
            order.push(idx);
        }

        // Reverse pre-order visits every child before its parent.
        let mut built: HashMap<usize, CommentNode> = HashMap::with_capacity(order.len());
        for &idx in order.iter().rev() {
            if let Some(slot) = self.slot(idx) {
                let children = slot
                    .children
                    .iter()
                    .filter_map(|child| built.remove(child))
                    .collect();
                built.insert(
                    idx,
                    CommentNode {
                        record: slot.record.clone(),
                        children,
                    },
                );
            }
        }

        self.roots
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }

    fn slot(&self, idx: usize) -> Option<&Slot> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, idx: usize) -> Option<&mut Slot> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    fn lookup(&self, comment_id: &CommentId) -> Option<&Slot> {
        self.index.get(comment_id).and_then(|&idx| self.slot(idx))
    }

    fn push(&mut self, record: CommentRecord, parent: Option<usize>) -> usize {
        let idx = self.slots.len();
        self.index.insert(record.id.clone(), idx);
        self.slots.push(Some(Slot::new(record, parent)));
        idx
    }

    fn resolve_parent(&self, idx: usize) -> Link {
        let Some(slot) = self.slot(idx) else {
            return Link::Root;
        };
        let Some(parent_id) = slot.record.parent_id.as_ref() else {
            return Link::Root;
        };
        if slot.record.is_self_parented() {
            warn!("Comment {} names itself as parent, treating as top-level", parent_id);
            return Link::Root;
        }
        match self.index.get(parent_id) {
            Some(&parent) => Link::Child(parent),
            None => {
                debug!("Comment {} has missing parent {}", slot.record.id, parent_id);
                Link::Orphan
            }
        }
    }

    fn attach(&mut self, idx: usize, parent: usize) {
        if let Some(slot) = self.slot_mut(idx) {
            slot.parent = Some(parent);
        }
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.push(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        match self.slot(idx).and_then(|slot| slot.parent) {
            Some(parent) => {
                if let Some(slot) = self.slot_mut(parent) {
                    slot.children.retain(|&child| child != idx);
                }
                if let Some(slot) = self.slot_mut(idx) {
                    slot.parent = None;
                }
            }
            None => self.roots.retain(|&root| root != idx),
        }
    }

    /// Promote nodes that no root can reach (members of parent cycles)
    fn repair_cycles(&mut self, also_reached_from: &[usize]) {
        let mut reached = vec![false; self.slots.len()];
        let starts: Vec<usize> = self
            .roots
            .iter()
            .chain(also_reached_from)
            .copied()
            .collect();
        for start in starts {
            self.mark_reached(start, &mut reached);
        }

        for idx in 0..self.slots.len() {
            if reached[idx] || self.slot(idx).is_none() {
                continue;
            }
            if let Some(slot) = self.slot(idx) {
                warn!(
                    "Comment {} is part of a parent cycle, treating as top-level",
                    slot.record.id
                );
            }
            self.detach(idx);
            let pos = self.roots.partition_point(|&root| root < idx);
            self.roots.insert(pos, idx);
            self.mark_reached(idx, &mut reached);
        }
    }

    fn mark_reached(&self, start: usize, reached: &mut [bool]) {
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if reached[idx] {
                continue;
            }
            reached[idx] = true;
            if let Some(slot) = self.slot(idx) {
                stack.extend(slot.children.iter().copied());
            }
        }
    }

    fn remove_at(&mut self, idx: usize) -> Vec<CommentRecord> {
        self.detach(idx);

        let mut removed = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current).and_then(Option::take) else {
                continue;
            };
            self.index.remove(&slot.record.id);
            stack.extend(slot.children.iter().rev());
            removed.push(slot.record);
        }
        removed
    }
}

/// Pre-order iterator over a [`CommentForest`]
pub struct Iter<'a> {
    forest: &'a CommentForest,
    stack: Vec<(usize, usize)>,
}

impl<'a> Iter<'a> {
    fn next_slot(&mut self) -> Option<(usize, usize, &'a Slot)> {
        let forest = self.forest;
        while let Some((idx, depth)) = self.stack.pop() {
            let Some(slot) = forest.slot(idx) else {
                continue;
            };
            self.stack
                .extend(slot.children.iter().rev().map(|&child| (child, depth + 1)));
            return Some((idx, depth, slot));
        }
        None
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (usize, &'a CommentRecord);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_slot().map(|(_, depth, slot)| (depth, &slot.record))
    }
}
