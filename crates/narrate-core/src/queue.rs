//! The ordered queue of texts and documents to compile.
//!
//! List position is compile order. The compiler never sees the live
//! [`Queue`]; it receives a [`Queue::snapshot`] by value.

use crate::error::{NarrateError, NarrateResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

/// Display name given to pasted text
pub const TEXT_ITEM_NAME: &str = "Text Input";

/// Where a queue item's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Pasted plain text, synthesized verbatim
    Text,
    /// Uploaded markup document, cleaned before synthesis
    Document,
}

/// Extraction strategy for the story region of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CleaningProfile {
    /// Generic story pages
    #[default]
    Regular,
    /// Site-specific reader pages
    SiteSpecific,
}

impl std::fmt::Display for CleaningProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Regular => write!(f, "Regular"),
            Self::SiteSpecific => write!(f, "SiteSpecific"),
        }
    }
}

/// One unit of text pending synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Stable identity, used to tag compile errors
    pub id: Uuid,
    /// Origin of the content
    pub source: SourceKind,
    /// Text or markup as added
    pub raw_content: String,
    /// Extraction strategy applied to documents
    pub profile: CleaningProfile,
    /// User-editable label
    pub display_name: String,
}

impl QueueItem {
    /// Create a text item
    #[must_use]
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: SourceKind::Text,
            raw_content: content.into(),
            profile: CleaningProfile::Regular,
            display_name: TEXT_ITEM_NAME.to_string(),
        }
    }

    /// Create a document item from markup already read into memory
    #[must_use]
    pub fn document<N: Into<String>, S: Into<String>>(name: N, markup: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: SourceKind::Document,
            raw_content: markup.into(),
            profile: CleaningProfile::Regular,
            display_name: name.into(),
        }
    }

    /// Read a document item from disk, named after the file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> NarrateResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            NarrateError::file(format!("Failed to read document {}: {e}", path.display()))
        })?;
        let markup = String::from_utf8_lossy(&bytes).into_owned();

        debug!("Read document {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::document(document_name(path), markup))
    }

    /// Set the cleaning profile
    #[must_use]
    pub const fn with_profile(mut self, profile: CleaningProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the display name
    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.display_name = name.into();
        self
    }
}

/// File name up to its first dot: `chapter.1.html` becomes `chapter`
fn document_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or_default()
        .to_string()
}

/// Caller-owned, editable list of queue items
#[derive(Debug, Clone, Default)]
pub struct Queue {
    items: Vec<QueueItem>,
}

impl Queue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append pasted text; whitespace-only input is ignored
    ///
    /// Returns the new item's id, or `None` if nothing was added.
    pub fn add_text(&mut self, text: &str) -> Option<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(self.push(QueueItem::text(text)))
    }

    /// Append an item and return its id
    pub fn push(&mut self, item: QueueItem) -> Uuid {
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Read documents from disk and append them in the given order
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be read; nothing is appended then.
    pub async fn add_documents<P: AsRef<Path>>(&mut self, paths: &[P]) -> NarrateResult<Vec<Uuid>> {
        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            loaded.push(QueueItem::from_file(path).await?);
        }
        Ok(loaded.into_iter().map(|item| self.push(item)).collect())
    }

    /// Rename the item at `index`
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn rename<S: Into<String>>(&mut self, index: usize, name: S) -> NarrateResult<()> {
        self.item_mut(index)?.display_name = name.into();
        Ok(())
    }

    /// Change the cleaning profile of the item at `index`
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn set_profile(&mut self, index: usize, profile: CleaningProfile) -> NarrateResult<()> {
        self.item_mut(index)?.profile = profile;
        Ok(())
    }

    /// Swap the item at `index` with its predecessor; no-op at the top
    pub fn move_up(&mut self, index: usize) {
        if index > 0 && index < self.items.len() {
            self.items.swap(index - 1, index);
        }
    }

    /// Swap the item at `index` with its successor; no-op at the bottom
    pub fn move_down(&mut self, index: usize) {
        if index + 1 < self.items.len() {
            self.items.swap(index, index + 1);
        }
    }

    /// Remove and return the item at `index`
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range.
    pub fn remove(&mut self, index: usize) -> NarrateResult<QueueItem> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Items in compile order
    #[must_use]
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Independent copy of the items for one compile run
    #[must_use]
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.clone()
    }

    fn item_mut(&mut self, index: usize) -> NarrateResult<&mut QueueItem> {
        self.check_index(index)?;
        Ok(&mut self.items[index])
    }

    fn check_index(&self, index: usize) -> NarrateResult<()> {
        if index >= self.items.len() {
            return Err(NarrateError::invalid_input(format!(
                "Queue index {index} out of range for {} items",
                self.items.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(queue: &Queue) -> Vec<&str> {
        queue.items().iter().map(|item| item.display_name.as_str()).collect()
    }

    fn sample_queue() -> Queue {
        let mut queue = Queue::new();
        queue.push(QueueItem::text("one").with_name("a"));
        queue.push(QueueItem::text("two").with_name("b"));
        queue.push(QueueItem::text("three").with_name("c"));
        queue
    }

    #[test]
    fn test_add_text_trims_and_skips_blank() {
        let mut queue = Queue::new();
        assert!(queue.add_text("   \n ").is_none());
        assert!(queue.is_empty());

        let id = queue.add_text("  Hello there  ").unwrap();
        assert_eq!(queue.len(), 1);
        let item = &queue.items()[0];
        assert_eq!(item.id, id);
        assert_eq!(item.raw_content, "Hello there");
        assert_eq!(item.source, SourceKind::Text);
        assert_eq!(item.profile, CleaningProfile::Regular);
        assert_eq!(item.display_name, TEXT_ITEM_NAME);
    }

    #[test]
    fn test_move_up_and_down() {
        let mut queue = sample_queue();

        queue.move_up(0);
        assert_eq!(names(&queue), ["a", "b", "c"]);

        queue.move_up(2);
        assert_eq!(names(&queue), ["a", "c", "b"]);

        queue.move_down(2);
        assert_eq!(names(&queue), ["a", "c", "b"]);

        queue.move_down(0);
        assert_eq!(names(&queue), ["c", "a", "b"]);

        queue.move_up(7);
        assert_eq!(names(&queue), ["c", "a", "b"]);
    }

    #[test]
    fn test_rename_profile_remove() {
        let mut queue = sample_queue();

        queue.rename(1, "Chapter 2").unwrap();
        queue.set_profile(1, CleaningProfile::SiteSpecific).unwrap();
        assert_eq!(queue.items()[1].display_name, "Chapter 2");
        assert_eq!(queue.items()[1].profile, CleaningProfile::SiteSpecific);

        let removed = queue.remove(0).unwrap();
        assert_eq!(removed.display_name, "a");
        assert_eq!(names(&queue), ["Chapter 2", "c"]);

        assert!(queue.rename(5, "x").is_err());
        assert!(queue.set_profile(2, CleaningProfile::Regular).is_err());
        assert!(queue.remove(2).is_err());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut queue = sample_queue();
        let snapshot = queue.snapshot();

        queue.remove(0).unwrap();
        queue.rename(0, "changed").unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].display_name, "a");
        assert_eq!(snapshot[1].display_name, "b");
    }

    #[test]
    fn test_document_name() {
        assert_eq!(document_name(Path::new("/tmp/chapter.1.html")), "chapter");
        assert_eq!(document_name(Path::new("story.htm")), "story");
        assert_eq!(document_name(Path::new("README")), "README");
    }

    #[tokio::test]
    async fn test_add_documents_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = dir.path().join("part1.html");
        let second = dir.path().join("part2.html");
        std::fs::write(&first, "<p>first</p>").unwrap();
        std::fs::write(&second, "<p>second</p>").unwrap();

        let mut queue = Queue::new();
        let ids = queue.add_documents(&[&first, &second]).await.unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(names(&queue), ["part1", "part2"]);
        assert_eq!(queue.items()[0].source, SourceKind::Document);
        assert_eq!(queue.items()[1].raw_content, "<p>second</p>");
    }

    #[tokio::test]
    async fn test_add_documents_missing_file_appends_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let present = dir.path().join("here.html");
        std::fs::write(&present, "x").unwrap();

        let mut queue = Queue::new();
        let result = queue
            .add_documents(&[present, dir.path().join("gone.html")])
            .await;

        assert!(matches!(result, Err(NarrateError::FileError { .. })));
        assert!(queue.is_empty());
    }
}
