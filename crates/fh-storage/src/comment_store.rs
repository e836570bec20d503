//! File system storage for post comments

use chrono::Utc;
use fh_core::comment::{cascade_ids, sort_by_creation, CommentRecord, CommentStore, NewComment};
use fh_core::error::{FanHubError, Result};
use fh_core::types::{CommentId, PostId, ProtocolVersion};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Schema version written to new post files
pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

/// On-disk document holding one post's comments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCommentsFile {
    pub schema_version: String,
    pub post_id: PostId,
    pub comment_count: u64,
    pub comments: Vec<CommentRecord>,
}

impl PostCommentsFile {
    fn empty(post_id: &PostId) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            post_id: post_id.clone(),
            comment_count: 0,
            comments: Vec::new(),
        }
    }

    fn check_version(&self) -> Result<()> {
        let supported = ProtocolVersion::V1_0;
        match ProtocolVersion::parse(&self.schema_version) {
            Some(version) if version.is_compatible(&supported) => Ok(()),
            _ => Err(FanHubError::UnsupportedSchemaVersion(
                self.schema_version.clone(),
            )),
        }
    }
}

/// File system based comment store
///
/// Each post lives in `<base_dir>/posts/<post_id>.json`. Writes go through a
/// temp file and a rename, and are serialized within the process.
pub struct FileSystemStore {
    /// Posts subdirectory
    posts_dir: PathBuf,
    /// Held across read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileSystemStore {
    /// Create a new file system store
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let posts_dir = base_dir.into().join("posts");

        let store = Self {
            posts_dir,
            write_lock: Mutex::new(()),
        };

        store.ensure_dirs()?;
        Ok(store)
    }

    /// Default data directory (platform data dir, or ~/.fanhub)
    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("com", "fanhub", "fanhub")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".fanhub")
            })
    }

    fn ensure_dirs(&self) -> Result<()> {
        if !self.posts_dir.exists() {
            fs::create_dir_all(&self.posts_dir).map_err(|e| {
                FanHubError::Io(e).with_context(format!(
                    "creating posts directory {}",
                    self.posts_dir.display()
                ))
            })?;
            debug!("Created posts directory: {:?}", self.posts_dir);
        }
        Ok(())
    }

    fn post_path(&self, post_id: &PostId) -> PathBuf {
        self.posts_dir.join(format!("{}.json", post_id))
    }

    fn temp_path(&self, post_id: &PostId) -> PathBuf {
        self.posts_dir.join(format!(".{}.json.tmp", post_id))
    }

    /// Write a post document atomically
    fn atomic_write(&self, file: &PostCommentsFile) -> Result<()> {
        let final_path = self.replace_post(&file.post_id, file)?;
        debug!(
            "Saved {} comments of post {} to {:?}",
            file.comments.len(),
            file.post_id,
            final_path
        );
        Ok(())
    }

    /// Serialize into the temp file, then rename over the post file.
    /// The temp file never outlives a failed write.
    fn replace_post<T: Serialize>(&self, post_id: &PostId, value: &T) -> Result<PathBuf> {
        let temp_path = self.temp_path(post_id);
        let final_path = self.post_path(post_id);

        let written = Self::write_json(&temp_path, value).and_then(|()| {
            fs::rename(&temp_path, &final_path)
                .map_err(|e| FanHubError::Io(e).with_context("renaming temp file"))
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(final_path)
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let temp_file = fs::File::create(path)
            .map_err(|e| FanHubError::Io(e).with_context("creating temp file"))?;
        let mut writer = BufWriter::new(temp_file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a post document, `None` when the post has no file yet
    fn read_post(&self, path: &Path) -> Result<Option<PostCommentsFile>> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FanHubError::Io(e)),
        };

        let post: PostCommentsFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| FanHubError::Serde(e).with_context(format!("parsing {}", path.display())))?;
        post.check_version()?;
        Ok(Some(post))
    }

    fn load_existing(&self, post_id: &PostId) -> Result<PostCommentsFile> {
        self.read_post(&self.post_path(post_id))?
            .ok_or_else(|| FanHubError::PostNotFound(post_id.to_string()))
    }

    /// Run `f` on the post's document under the write lock and persist it
    fn modify<T>(
        &self,
        post_id: &PostId,
        create: bool,
        f: impl FnOnce(&mut PostCommentsFile) -> Result<T>,
    ) -> Result<T> {
        post_id.validate()?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut post = match self.read_post(&self.post_path(post_id))? {
            Some(post) => post,
            None if create => PostCommentsFile::empty(post_id),
            None => return Err(FanHubError::PostNotFound(post_id.to_string())),
        };

        let out = f(&mut post)?;
        post.schema_version = CURRENT_SCHEMA_VERSION.to_string();
        self.atomic_write(&post)?;
        Ok(out)
    }

    /// Posts that have a comments file
    pub fn posts(&self) -> Result<Vec<PostId>> {
        let entries = fs::read_dir(&self.posts_dir).map_err(|e| {
            FanHubError::Io(e).with_context("reading posts directory")
        })?;

        let mut posts = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.extension().map(|e| e == "json").unwrap_or(false) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if !stem.starts_with('.') => posts.push(PostId::from_string(stem)),
                _ => {}
            }
        }

        posts.sort();
        Ok(posts)
    }

    /// Get posts directory
    pub fn posts_dir(&self) -> &PathBuf {
        &self.posts_dir
    }
}

impl CommentStore for FileSystemStore {
    fn list(&self, post_id: &PostId) -> Result<Vec<CommentRecord>> {
        post_id.validate()?;
        let mut records = self
            .read_post(&self.post_path(post_id))?
            .map(|post| post.comments)
            .unwrap_or_default();
        sort_by_creation(&mut records);
        Ok(records)
    }

    fn create(&self, post_id: &PostId, draft: NewComment) -> Result<CommentRecord> {
        let record = draft.into_record(CommentId::generate(), Utc::now());
        let stored = record.clone();
        self.modify(post_id, true, move |post| {
            post.comments.push(record);
            post.comment_count += 1;
            Ok(())
        })?;
        info!("Created comment {} on post {}", stored.id, post_id);
        Ok(stored)
    }

    fn update_text(&self, post_id: &PostId, comment_id: &CommentId, text: &str) -> Result<CommentRecord> {
        self.modify(post_id, false, |post| {
            let record = post
                .comments
                .iter_mut()
                .find(|c| &c.id == comment_id)
                .ok_or_else(|| FanHubError::CommentNotFound(comment_id.to_string()))?;
            record.edit(text);
            Ok(record.clone())
        })
    }

    fn delete(&self, post_id: &PostId, comment_id: &CommentId) -> Result<Vec<CommentId>> {
        let removed = self.modify(post_id, false, |post| {
            if !post.comments.iter().any(|c| &c.id == comment_id) {
                return Err(FanHubError::CommentNotFound(comment_id.to_string()));
            }

            let removed = cascade_ids(&post.comments, comment_id);
            let doomed: HashSet<&CommentId> = removed.iter().collect();
            post.comments.retain(|c| !doomed.contains(&c.id));
            post.comment_count = post.comment_count.saturating_sub(removed.len() as u64);
            Ok(removed)
        })?;

        info!(
            "Deleted comment {} and {} replies from post {}",
            comment_id,
            removed.len().saturating_sub(1),
            post_id
        );
        Ok(removed)
    }

    fn comment_count(&self, post_id: &PostId) -> Result<u64> {
        post_id.validate()?;
        match self.load_existing(post_id) {
            Ok(post) => Ok(post.comment_count),
            Err(FanHubError::PostNotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fh_core::types::UserId;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_test_store() -> (FileSystemStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    fn draft(text: &str, parent: Option<&CommentId>) -> NewComment {
        NewComment {
            text: text.to_string(),
            author_id: UserId::from_string("bunny"),
            parent_id: parent.cloned(),
        }
    }

    fn post() -> PostId {
        PostId::from_string("comeback-teaser")
    }

    #[test]
    fn test_store_creation() {
        let (store, _temp) = create_test_store();
        assert!(store.posts_dir().exists());
        assert!(store.posts().unwrap().is_empty());
    }

    #[test]
    fn test_list_unknown_post_is_empty() {
        let (store, _temp) = create_test_store();
        assert!(store.list(&post()).unwrap().is_empty());
        assert_eq!(store.comment_count(&post()).unwrap(), 0);
    }

    #[test]
    fn test_create_and_list() {
        let (store, _temp) = create_test_store();

        let root = store.create(&post(), draft("first!", None)).unwrap();
        let reply = store.create(&post(), draft("second", Some(&root.id))).unwrap();

        assert_eq!(root.id.as_str().len(), 32);
        assert_eq!(reply.parent_id.as_ref(), Some(&root.id));
        assert!(!root.is_edited);

        let listed = store.list(&post()).unwrap();
        let ids: Vec<_> = listed.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![root.id, reply.id]);
        assert_eq!(store.comment_count(&post()).unwrap(), 2);
        assert_eq!(store.posts().unwrap(), vec![post()]);
    }

    #[test]
    fn test_update_text_marks_edited() {
        let (store, _temp) = create_test_store();
        let created = store.create(&post(), draft("typo", None)).unwrap();

        let updated = store.update_text(&post(), &created.id, "fixed").unwrap();
        assert_eq!(updated.text, "fixed");
        assert!(updated.is_edited);
        assert!(updated.updated_at >= created.created_at);

        let listed = store.list(&post()).unwrap();
        assert_eq!(listed[0].text, "fixed");
        assert!(listed[0].is_edited);
    }

    #[test]
    fn test_update_missing() {
        let (store, _temp) = create_test_store();

        let no_post = store.update_text(&post(), &CommentId::from_string("x"), "t");
        assert!(matches!(no_post, Err(FanHubError::PostNotFound(_))));

        store.create(&post(), draft("hi", None)).unwrap();
        let no_comment = store.update_text(&post(), &CommentId::from_string("x"), "t");
        assert!(matches!(no_comment, Err(FanHubError::CommentNotFound(_))));
    }

    #[test]
    fn test_delete_cascades_and_counts() {
        let (store, _temp) = create_test_store();
        let a = store.create(&post(), draft("a", None)).unwrap();
        let b = store.create(&post(), draft("b", Some(&a.id))).unwrap();
        let c = store.create(&post(), draft("c", Some(&b.id))).unwrap();
        let d = store.create(&post(), draft("d", None)).unwrap();

        let removed = store.delete(&post(), &b.id).unwrap();
        assert_eq!(removed, vec![b.id, c.id]);

        let remaining: Vec<_> = store
            .list(&post())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(remaining, vec![a.id, d.id]);
        assert_eq!(store.comment_count(&post()).unwrap(), 2);
    }

    #[test]
    fn test_delete_missing_comment() {
        let (store, _temp) = create_test_store();
        store.create(&post(), draft("a", None)).unwrap();

        let result = store.delete(&post(), &CommentId::from_string("nope"));
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(store.comment_count(&post()).unwrap(), 1);
    }

    #[test]
    fn test_atomic_write() {
        let (store, _temp) = create_test_store();
        let created = store.create(&post(), draft("hello", None)).unwrap();

        assert!(!store.temp_path(&post()).exists());
        let content = fs::read_to_string(store.post_path(&post())).unwrap();
        assert!(content.contains("\"schema_version\": \"1.0\""));
        assert!(content.contains("\"comment_count\": 1"));
        assert!(content.contains("\"authorId\": \"bunny\""));
        assert!(content.contains(created.id.as_str()));
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot encode"))
        }
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let (store, _temp) = create_test_store();
        store.create(&post(), draft("kept", None)).unwrap();
        let before = fs::read_to_string(store.post_path(&post())).unwrap();

        assert!(store.replace_post(&post(), &Unserializable).is_err());

        assert!(!store.temp_path(&post()).exists());
        assert_eq!(fs::read_to_string(store.post_path(&post())).unwrap(), before);
        assert_eq!(store.list(&post()).unwrap()[0].text, "kept");
    }

    #[test]
    fn test_rejects_unknown_major_version() {
        let (store, _temp) = create_test_store();
        fs::write(
            store.post_path(&post()),
            r#"{"schema_version":"2.0","post_id":"comeback-teaser","comment_count":0,"comments":[]}"#,
        )
        .unwrap();

        let result = store.list(&post());
        assert!(matches!(result, Err(FanHubError::UnsupportedSchemaVersion(v)) if v == "2.0"));
    }

    #[test]
    fn test_accepts_newer_minor_version() {
        let (store, _temp) = create_test_store();
        fs::write(
            store.post_path(&post()),
            r#"{"schema_version":"1.3","post_id":"comeback-teaser","comment_count":1,"comments":[
                {"id":"c1","text":"old","authorId":"u","createdAt":"2024-01-01T00:00:00Z"}
            ]}"#,
        )
        .unwrap();

        let listed = store.list(&post()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].parent_id, None);
        assert!(!listed[0].is_edited);
    }

    #[test]
    fn test_rejects_invalid_post_id() {
        let (store, _temp) = create_test_store();
        let bad = PostId::from_string("../escape");
        assert!(store.list(&bad).is_err());
        assert!(store.create(&bad, draft("x", None)).is_err());
    }

    #[test]
    fn test_ignores_temp_and_non_json_files() {
        let (store, _temp) = create_test_store();
        fs::write(store.posts_dir().join(".p.json.tmp"), "{}").unwrap();
        fs::write(store.posts_dir().join("readme.txt"), "x").unwrap();
        assert!(store.posts().unwrap().is_empty());
    }
}
