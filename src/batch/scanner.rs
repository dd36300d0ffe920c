// ABOUTME: Scanners that enumerate work items onto the pipeline channel.
// ABOUTME: Remote listing follows a paginated cursor; filesystem scan walks a directory tree.

use super::error::{BoxError, ScanError};
use crate::types::WorkItem;
use async_trait::async_trait;
use flume::Sender;
use nonempty::NonEmpty;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Produces work items.
///
/// The scanner receives the only sender of the item channel by value, so the
/// channel closes exactly once, when `scan` returns, on every exit path.
#[async_trait]
pub trait Scanner<C: Send + Sync>: Send + Sync {
    async fn scan(&self, client: &C, items: Sender<WorkItem>) -> Result<(), ScanError>;
}

/// One page of a remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<WorkItem>,
    /// Opaque cursor of the next page. Empty when there is none.
    pub cursor: String,
}

/// Fetches one page of a paginated remote listing.
#[async_trait]
pub trait PageLister<C: Send + Sync>: Send + Sync {
    /// `cursor` is empty for the first page.
    async fn list_page(&self, client: &C, cursor: &str) -> Result<Page, BoxError>;
}

/// Returns the total number of items a run is expected to process.
#[async_trait]
pub trait Counter<C: Send + Sync>: Send + Sync {
    async fn count(&self, client: &C) -> Result<u64, BoxError>;
}

/// Walks every page of a remote listing.
#[derive(Debug, Clone)]
pub struct RemoteListingScanner<L> {
    lister: L,
}

impl<L> RemoteListingScanner<L> {
    pub fn new(lister: L) -> Self {
        Self { lister }
    }
}

#[async_trait]
impl<C, L> Scanner<C> for RemoteListingScanner<L>
where
    C: Send + Sync,
    L: PageLister<C>,
{
    async fn scan(&self, client: &C, items: Sender<WorkItem>) -> Result<(), ScanError> {
        let mut cursor = String::new();
        let mut pages = 0usize;

        loop {
            let page = self
                .lister
                .list_page(client, &cursor)
                .await
                .map_err(ScanError::Listing)?;
            pages += 1;

            let count = page.items.len();
            for item in page.items {
                items
                    .send_async(item)
                    .await
                    .map_err(|_| ScanError::PipelineClosed)?;
            }

            // A cursor equal to the previous one would loop forever.
            if page.cursor.is_empty() || page.cursor == cursor || count == 0 {
                tracing::debug!("remote listing finished after {} page(s)", pages);
                return Ok(());
            }
            cursor = page.cursor;
        }
    }
}

/// Walks a local directory and emits paths of files with a whitelisted
/// extension.
#[derive(Debug, Clone)]
pub struct FilesystemScanner {
    root: PathBuf,
    recursive: bool,
    /// Sorted for binary search.
    extensions: Vec<String>,
}

impl FilesystemScanner {
    pub fn new(root: impl Into<PathBuf>, recursive: bool, extensions: NonEmpty<String>) -> Self {
        let mut extensions: Vec<String> = extensions.into();
        extensions.sort();
        extensions.dedup();

        Self {
            root: root.into(),
            recursive,
            extensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a file with this path and size should be uploaded.
    /// Extensions match case-sensitively; empty files never match.
    pub fn accepts(&self, path: &Path, len: u64) -> bool {
        if len == 0 {
            return false;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => self
                .extensions
                .binary_search_by(|candidate| candidate.as_str().cmp(ext))
                .is_ok(),
            _ => false,
        }
    }

    fn walk(&self, items: &Sender<WorkItem>) -> Result<(), ScanError> {
        // Depth 1 still covers the files directly inside the root.
        let max_depth = if self.recursive { usize::MAX } else { 1 };

        for entry in WalkDir::new(&self.root).max_depth(max_depth) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let len = entry.metadata()?.len();
            if !self.accepts(entry.path(), len) {
                continue;
            }

            // Work items are strings; a lossy conversion would name another file.
            let Some(path) = entry.path().to_str() else {
                tracing::warn!("skipping non UTF-8 path {}", entry.path().display());
                continue;
            };
            tracing::trace!("found {}", path);
            items
                .send(WorkItem::new(path))
                .map_err(|_| ScanError::PipelineClosed)?;
        }

        Ok(())
    }
}

#[async_trait]
impl<C: Send + Sync> Scanner<C> for FilesystemScanner {
    async fn scan(&self, _client: &C, items: Sender<WorkItem>) -> Result<(), ScanError> {
        tracing::debug!(
            "scanning {} (recursive: {})",
            self.root.display(),
            self.recursive
        );

        // walkdir and the blocking send both stay off the async workers.
        let scanner = self.clone();
        tokio::task::spawn_blocking(move || scanner.walk(&items))
            .await
            .map_err(|e| ScanError::Aborted(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(extensions: &[&str]) -> FilesystemScanner {
        let extensions = NonEmpty::from_vec(extensions.iter().map(|e| e.to_string()).collect())
            .expect("at least one extension");
        FilesystemScanner::new("/unused", false, extensions)
    }

    #[test]
    fn accepts_whitelisted_extensions() {
        let scanner = scanner(&["png", "gif", "jpg"]);
        assert!(scanner.accepts(Path::new("a/cat.jpg"), 10));
        assert!(scanner.accepts(Path::new("a/cat.png"), 10));
        assert!(!scanner.accepts(Path::new("a/cat.tiff"), 10));
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        let scanner = scanner(&["jpg"]);
        assert!(!scanner.accepts(Path::new("CAT.JPG"), 10));
    }

    #[test]
    fn rejects_empty_and_extensionless_files() {
        let scanner = scanner(&["jpg"]);
        assert!(!scanner.accepts(Path::new("cat.jpg"), 0));
        assert!(!scanner.accepts(Path::new("README"), 10));
        assert!(!scanner.accepts(Path::new("trailing."), 10));
    }

    #[test]
    fn duplicate_extensions_are_collapsed() {
        let scanner = scanner(&["jpg", "png", "jpg"]);
        assert_eq!(scanner.extensions, vec!["jpg", "png"]);
    }
}
