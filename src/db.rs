use anyhow::Context;
use jiff::Timestamp;
use tracing::{debug, warn};

use crate::error::{DeleteError, IndexError, SubmitError, ValidationError};
use crate::models::Comment;
use crate::store::KeyValueStore;

pub const COMMENTS_KEY: &str = "comments";
pub const USERNAME_KEY: &str = "username";

/// Owns the comment sequence and the last-used username on top of a
/// [`KeyValueStore`]. Every mutation rewrites the full sequence.
pub struct CommentStore<S> {
    store: S,
    comments: Vec<Comment>,
    cached_last_username: Option<String>,
}

impl<S: KeyValueStore> CommentStore<S> {
    /// Wrap a store and load whatever comments it already holds.
    pub fn open(store: S) -> Self {
        let comments = load(&store);
        Self {
            store,
            comments,
            cached_last_username: None,
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Re-read the persisted sequence, discarding the in-memory copy.
    pub fn reload(&mut self) -> &[Comment] {
        self.comments = load(&self.store);
        &self.comments
    }

    pub fn submit(&mut self, username: &str, content: &str) -> Result<Comment, SubmitError> {
        self.submit_at(username, content, Timestamp::now())
    }

    /// Validate, append a comment created at `now`, and persist.
    pub fn submit_at(
        &mut self,
        username: &str,
        content: &str,
        now: Timestamp,
    ) -> Result<Comment, SubmitError> {
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername.into());
        }
        if content.is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }

        let comment = Comment::new(username.to_owned(), content.to_owned(), now);
        self.comments.push(comment.clone());

        if let Err(e) = self.save() {
            self.comments.pop();
            return Err(SubmitError::Store(e));
        }

        debug!(username, total = self.comments.len(), "Submitted comment");
        Ok(comment)
    }

    /// Remove the comment at `index`, shifting later comments down by one.
    pub fn delete_at(&mut self, index: usize) -> Result<Comment, DeleteError> {
        if index >= self.comments.len() {
            return Err(IndexError::OutOfRange {
                index,
                len: self.comments.len(),
            }
            .into());
        }

        let removed = self.comments.remove(index);

        if let Err(e) = self.save() {
            self.comments.insert(index, removed);
            return Err(DeleteError::Store(e));
        }

        debug!(index, total = self.comments.len(), "Deleted comment");
        Ok(removed)
    }

    /// Read the remembered username. An empty stored value counts as unset.
    pub fn load_last_username(&mut self) -> Option<String> {
        let username = match self.store.get(USERNAME_KEY) {
            Ok(value) => value.filter(|name| !name.is_empty()),
            Err(e) => {
                warn!("Failed to read remembered username: {e:#}");
                None
            }
        };

        if username.is_some() {
            self.cached_last_username.clone_from(&username);
        }
        username
    }

    /// Persist `username` and cache it.
    pub fn remember_username(&mut self, username: &str) -> anyhow::Result<()> {
        self.store
            .set(USERNAME_KEY, username)
            .context("Failed to save username")?;
        self.cached_last_username = Some(username.to_owned());
        debug!(username, "Remembered username");
        Ok(())
    }

    /// Remember `candidate` only if it is non-empty and differs from the
    /// cached value. Returns whether a write happened.
    pub fn update_username(&mut self, candidate: &str) -> anyhow::Result<bool> {
        if candidate.is_empty() || self.cached_last_username.as_deref() == Some(candidate) {
            return Ok(false);
        }
        self.remember_username(candidate)?;
        Ok(true)
    }

    pub fn cached_last_username(&self) -> Option<&str> {
        self.cached_last_username.as_deref()
    }

    fn save(&mut self) -> anyhow::Result<()> {
        let content =
            serde_json::to_string(&self.comments).context("Failed to serialize comments")?;
        self.store
            .set(COMMENTS_KEY, &content)
            .context("Failed to persist comments")
    }
}

/// Read the persisted sequence, falling back to empty when it is missing,
/// unreadable, or not valid JSON.
pub fn load<S: KeyValueStore>(store: &S) -> Vec<Comment> {
    let raw = match store.get(COMMENTS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Failed to read comments, starting empty: {e:#}");
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(comments) => comments,
        Err(e) => {
            warn!("Stored comments are corrupt, starting empty: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};
    use anyhow::bail;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    fn ts(ms: i64) -> Timestamp {
        Timestamp::from_millisecond(ms).unwrap()
    }

    fn persisted(store: &CommentStore<MemoryStore>) -> Vec<Comment> {
        serde_json::from_str(&store.store().get(COMMENTS_KEY).unwrap().unwrap()).unwrap()
    }

    /// A store whose writes always fail, as when the disk is full.
    #[derive(Default)]
    struct FullStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for FullStore {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            bail!("quota exceeded")
        }
    }

    #[fixture]
    fn empty() -> CommentStore<MemoryStore> {
        CommentStore::open(MemoryStore::new())
    }

    /// Three comments from "a", "b", "c", created at 1000, 2000, 3000 ms.
    #[fixture]
    fn three() -> CommentStore<MemoryStore> {
        let mut store = CommentStore::open(MemoryStore::new());
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            let ms = 1000 * (i64::try_from(i).unwrap() + 1);
            store.submit_at(name, "text", ts(ms)).unwrap();
        }
        store
    }

    // -- load --

    #[rstest]
    fn load_missing_key_is_empty() {
        assert!(load(&MemoryStore::new()).is_empty());
    }

    // Corrupt or wrongly-shaped data is treated as if nothing were stored.
    #[rstest]
    #[case::garbage("not json")]
    #[case::object("{\"username\":\"a\"}")]
    #[case::bad_record("[{\"username\":\"a\"}]")]
    #[case::truncated("[{\"username\":\"a\",\"content\":\"b\",")]
    fn load_corrupt_data_is_empty(#[case] raw: &str) {
        let mut store = MemoryStore::new();
        store.set(COMMENTS_KEY, raw).unwrap();
        assert!(load(&store).is_empty());
        assert!(CommentStore::open(store).is_empty());
    }

    #[rstest]
    fn load_empty_array() {
        let mut store = MemoryStore::new();
        store.set(COMMENTS_KEY, "[]").unwrap();
        assert!(load(&store).is_empty());
    }

    // -- submit --

    #[rstest]
    fn submit_appends_and_persists(mut empty: CommentStore<MemoryStore>) {
        let comment = empty.submit_at("ada", "hello", ts(42)).unwrap();

        assert_eq!(comment.username(), "ada");
        assert_eq!(comment.content(), "hello");
        assert_eq!(comment.created_time(), ts(42));
        assert_eq!(empty.comments(), &[comment.clone()]);
        assert_eq!(persisted(&empty), vec![comment]);
    }

    #[rstest]
    fn submit_grows_persisted_sequence_by_one(mut three: CommentStore<MemoryStore>) {
        let before = persisted(&three).len();
        three.submit_at("d", "more", ts(4000)).unwrap();
        let after = persisted(&three);
        assert_eq!(after.len(), before + 1);
        assert_eq!(after.last().unwrap().username(), "d");
    }

    #[rstest]
    fn submit_uses_current_time(mut empty: CommentStore<MemoryStore>) {
        let before = Timestamp::now();
        let comment = empty.submit("ada", "hello").unwrap();
        let after = Timestamp::now();
        assert!(comment.created_time() >= before && comment.created_time() <= after);
    }

    // Validation failures must not touch the store at all.
    #[rstest]
    #[case::no_username("", "x", ValidationError::EmptyUsername)]
    #[case::no_content("x", "", ValidationError::EmptyContent)]
    #[case::neither("", "", ValidationError::EmptyUsername)]
    fn submit_rejects_empty_fields(
        mut three: CommentStore<MemoryStore>,
        #[case] username: &str,
        #[case] content: &str,
        #[case] expected: ValidationError,
    ) {
        let before = persisted(&three);
        let err = three.submit_at(username, content, ts(9000)).unwrap_err();
        assert!(matches!(err, SubmitError::Validation(v) if v == expected));
        assert_eq!(three.len(), 3);
        assert_eq!(persisted(&three), before);
    }

    #[rstest]
    fn submit_validation_writes_nothing_to_fresh_store(mut empty: CommentStore<MemoryStore>) {
        assert!(empty.submit_at("", "x", ts(1)).is_err());
        assert_eq!(empty.store().get(COMMENTS_KEY).unwrap(), None);
    }

    #[rstest]
    fn submit_store_failure_leaves_memory_unchanged() {
        let mut store = CommentStore::open(FullStore::default());
        let err = store.submit_at("a", "b", ts(1)).unwrap_err();
        assert!(matches!(err, SubmitError::Store(_)));
        assert!(store.is_empty());
    }

    // -- delete_at --

    #[rstest]
    #[case::first(0, ["b", "c"])]
    #[case::middle(1, ["a", "c"])]
    #[case::last(2, ["a", "b"])]
    fn delete_at_removes_and_shifts(
        mut three: CommentStore<MemoryStore>,
        #[case] index: usize,
        #[case] remaining: [&str; 2],
    ) {
        let removed = three.delete_at(index).unwrap();
        assert_eq!(removed.username(), ["a", "b", "c"][index]);

        let names: Vec<&str> = three.comments().iter().map(Comment::username).collect();
        assert_eq!(names, remaining);

        let persisted_names: Vec<String> = persisted(&three)
            .iter()
            .map(|c| c.username().to_owned())
            .collect();
        assert_eq!(persisted_names, remaining);
    }

    #[rstest]
    #[case(3)]
    #[case(usize::MAX)]
    fn delete_at_out_of_range(mut three: CommentStore<MemoryStore>, #[case] index: usize) {
        let before = persisted(&three);
        let err = three.delete_at(index).unwrap_err();
        assert!(matches!(
            err,
            DeleteError::Index(IndexError::OutOfRange { len: 3, .. })
        ));
        assert_eq!(three.len(), 3);
        assert_eq!(persisted(&three), before);
    }

    #[rstest]
    fn delete_at_on_empty_fails(mut empty: CommentStore<MemoryStore>) {
        assert!(empty.delete_at(0).is_err());
    }

    #[rstest]
    fn delete_at_store_failure_restores_element() {
        let mut inner = MemoryStore::new();
        inner
            .set(
                COMMENTS_KEY,
                r#"[{"username":"a","content":"x","createdTime":1},{"username":"b","content":"y","createdTime":2}]"#,
            )
            .unwrap();
        let mut store = CommentStore::open(FullStore { inner });

        assert!(matches!(store.delete_at(0), Err(DeleteError::Store(_))));
        let names: Vec<&str> = store.comments().iter().map(Comment::username).collect();
        assert_eq!(names, ["a", "b"]);
    }

    // -- reload / round trip --

    // Reopening a file-backed store (a "page reload") yields exactly what
    // was persisted.
    #[rstest]
    fn reopen_round_trips_through_file_store() {
        let dir = TempDir::new().unwrap();
        let mut store = CommentStore::open(FileStore::open(dir.path()).unwrap());
        store.submit_at("ada", "first `code`", ts(1_000)).unwrap();
        store.submit_at("bob", "second", ts(2_000)).unwrap();
        store.delete_at(0).unwrap();

        let reopened = CommentStore::open(FileStore::open(dir.path()).unwrap());
        assert_eq!(reopened.comments(), store.comments());
        assert_eq!(reopened.comments()[0].username(), "bob");
    }

    // Comments stamped with the live clock compare equal to what a reload
    // returns, not just ones created at whole-millisecond times.
    #[rstest]
    fn submit_with_current_time_matches_reload() {
        let dir = TempDir::new().unwrap();
        let mut store = CommentStore::open(FileStore::open(dir.path()).unwrap());
        let posted = store.submit("ada", "hello").unwrap();
        store.submit("bob", "again").unwrap();

        let reopened = CommentStore::open(FileStore::open(dir.path()).unwrap());
        assert_eq!(reopened.comments(), store.comments());
        assert_eq!(reopened.comments()[0], posted);
    }

    // Another writer's changes become visible after reload; the last writer
    // wins on the next save.
    #[rstest]
    fn reload_picks_up_external_writes() {
        let dir = TempDir::new().unwrap();
        let mut first = CommentStore::open(FileStore::open(dir.path()).unwrap());
        let mut second = CommentStore::open(FileStore::open(dir.path()).unwrap());

        second.submit_at("bob", "from elsewhere", ts(5)).unwrap();
        assert!(first.is_empty());
        assert_eq!(first.reload().len(), 1);

        first.submit_at("ada", "mine", ts(6)).unwrap();
        second.submit_at("bob", "clobber", ts(7)).unwrap();

        let names: Vec<String> = CommentStore::open(FileStore::open(dir.path()).unwrap())
            .comments()
            .iter()
            .map(|c| c.content().to_owned())
            .collect();
        assert_eq!(names, ["from elsewhere", "clobber"]);
    }

    // -- usernames --

    #[rstest]
    fn last_username_absent_by_default(mut empty: CommentStore<MemoryStore>) {
        assert_eq!(empty.load_last_username(), None);
        assert_eq!(empty.cached_last_username(), None);
    }

    #[rstest]
    fn last_username_empty_value_is_absent() {
        let mut inner = MemoryStore::new();
        inner.set(USERNAME_KEY, "").unwrap();
        let mut store = CommentStore::open(inner);
        assert_eq!(store.load_last_username(), None);
    }

    #[rstest]
    fn remember_username_persists_and_caches(mut empty: CommentStore<MemoryStore>) {
        empty.remember_username("ada").unwrap();
        assert_eq!(empty.cached_last_username(), Some("ada"));
        assert_eq!(
            empty.store().get(USERNAME_KEY).unwrap().as_deref(),
            Some("ada")
        );
        assert_eq!(empty.load_last_username().as_deref(), Some("ada"));
    }

    #[rstest]
    fn load_last_username_primes_cache() {
        let mut inner = MemoryStore::new();
        inner.set(USERNAME_KEY, "ada").unwrap();
        let mut store = CommentStore::open(inner);

        assert_eq!(store.load_last_username().as_deref(), Some("ada"));
        assert!(!store.update_username("ada").unwrap());
    }

    #[rstest]
    #[case::empty("", false)]
    #[case::same("ada", false)]
    #[case::changed("bob", true)]
    fn update_username_skips_redundant_writes(
        mut empty: CommentStore<MemoryStore>,
        #[case] candidate: &str,
        #[case] written: bool,
    ) {
        empty.remember_username("ada").unwrap();
        assert_eq!(empty.update_username(candidate).unwrap(), written);

        let expected = if written { candidate } else { "ada" };
        assert_eq!(
            empty.store().get(USERNAME_KEY).unwrap().as_deref(),
            Some(expected)
        );
    }

    #[rstest]
    fn remember_username_store_failure_keeps_cache() {
        let mut store = CommentStore::open(FullStore::default());
        assert!(store.remember_username("ada").is_err());
        assert_eq!(store.cached_last_username(), None);
    }
}
