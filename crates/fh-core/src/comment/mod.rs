//! Comment system module
//!
//! Handles the comment model, the threaded forest, validation and the
//! comment store abstraction.

pub mod model;
pub mod forest;
pub mod validator;
pub mod builder;
pub mod store;

pub use model::*;
pub use forest::{BuildOptions, CommentForest, OrphanPolicy, ReplyFallback, ReplyPlacement};
pub use validator::CommentValidator;
pub use builder::CommentBuilder;
pub use store::{cascade_ids, sort_by_creation, CommentStore};

#[cfg(test)]
pub use store::memory::MemoryStore;
