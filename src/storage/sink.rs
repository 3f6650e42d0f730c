//! Persistence sink writing the crawl directory tree

use crate::storage::{StorageError, StorageResult, UrlIndex};
use crate::CrawlError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

const ORIGINAL_DIR: &str = "original";
const PARSED_DIR: &str = "parsed";
const LINKS_DIR: &str = "links";
const IDS_FILE: &str = "ids.txt";

/// Prefix of files that have not been assigned an ID yet
const STAGING_PREFIX: &str = "pending-";

/// Files written for one page before it has an ID
///
/// Dropping a `StagedPage` does not remove anything from disk; hand it back
/// to [`PersistenceSink::commit`] or [`PersistenceSink::discard`].
#[derive(Debug)]
pub struct StagedPage {
    key: u64,
    extension: String,
    original: PathBuf,
    parsed: Option<PathBuf>,
    links: Option<PathBuf>,
}

impl StagedPage {
    /// Extension the original file will keep after commit
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Staging path of the original bytes
    pub fn original_path(&self) -> &Path {
        &self.original
    }

    fn staged_files(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.original)
            .chain(self.parsed.iter())
            .chain(self.links.iter())
    }
}

/// Writes page artifacts under a data directory
///
/// Staging writes run concurrently from many workers; [`commit`](Self::commit)
/// is a handful of renames and is meant to be called while the frontier lock
/// is held.
#[derive(Debug)]
pub struct PersistenceSink {
    root: PathBuf,
    staging_counter: AtomicU64,
}

impl PersistenceSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staging_counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn original_dir(&self) -> PathBuf {
        self.root.join(ORIGINAL_DIR)
    }

    pub fn parsed_dir(&self) -> PathBuf {
        self.root.join(PARSED_DIR)
    }

    pub fn links_dir(&self) -> PathBuf {
        self.root.join(LINKS_DIR)
    }

    pub fn ids_path(&self) -> PathBuf {
        self.root.join(IDS_FILE)
    }

    /// Creates the directory tree and clears artifacts of earlier runs
    ///
    /// Directory creation failures are fatal for the crawl. Files left in
    /// `original/`, `parsed/` and `links/` (and a stale `ids.txt`) are removed
    /// so the tree only ever describes the current run.
    ///
    /// # Returns
    ///
    /// The number of stale files removed
    pub fn prepare(&self) -> crate::Result<usize> {
        let mut removed = 0;

        for dir in [self.original_dir(), self.parsed_dir(), self.links_dir()] {
            std::fs::create_dir_all(&dir).map_err(|source| CrawlError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            removed += sweep_dir(&dir)?;
        }

        let ids = self.ids_path();
        match std::fs::remove_file(&ids) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::io(ids, e).into()),
        }

        if removed > 0 {
            tracing::info!(
                "Removed {} stale files from {}",
                removed,
                self.root.display()
            );
        }

        Ok(removed)
    }

    /// Saves downloaded bytes under a fresh staging name
    pub async fn stage_original(&self, extension: &str, bytes: &[u8]) -> StorageResult<StagedPage> {
        let key = self.staging_counter.fetch_add(1, Ordering::Relaxed);
        let original = self
            .original_dir()
            .join(format!("{}{}.{}", STAGING_PREFIX, key, extension));

        tokio::fs::write(&original, bytes)
            .await
            .map_err(|e| StorageError::io(&original, e))?;

        Ok(StagedPage {
            key,
            extension: extension.to_string(),
            original,
            parsed: None,
            links: None,
        })
    }

    /// Saves the extracted text and outbound links next to a staged original
    ///
    /// Links are written one per line in the order given.
    pub async fn stage_document(
        &self,
        staged: &mut StagedPage,
        text: &str,
        links: &[Url],
    ) -> StorageResult<()> {
        let parsed = self
            .parsed_dir()
            .join(format!("{}{}.txt", STAGING_PREFIX, staged.key));
        tokio::fs::write(&parsed, text.as_bytes())
            .await
            .map_err(|e| StorageError::io(&parsed, e))?;
        staged.parsed = Some(parsed);

        let mut content = String::new();
        for link in links {
            content.push_str(link.as_str());
            content.push('\n');
        }

        let links_path = self
            .links_dir()
            .join(format!("{}{}.txt", STAGING_PREFIX, staged.key));
        tokio::fs::write(&links_path, content.as_bytes())
            .await
            .map_err(|e| StorageError::io(&links_path, e))?;
        staged.links = Some(links_path);

        Ok(())
    }

    /// Moves a fully staged page to its permanent `<id>` names
    ///
    /// Either all three files end up under the new ID or none do: if a rename
    /// fails, files already moved are deleted along with the remaining staged
    /// ones, and the error is returned.
    pub fn commit(&self, staged: StagedPage, id: u64) -> StorageResult<()> {
        let (Some(parsed), Some(links)) = (staged.parsed.clone(), staged.links.clone()) else {
            let path = staged.original.clone();
            self.discard(staged);
            return Err(StorageError::io(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "page has no staged text or links",
                ),
            ));
        };

        let moves = [
            (
                staged.original.clone(),
                self.original_dir()
                    .join(format!("{}.{}", id, staged.extension)),
            ),
            (parsed, self.parsed_dir().join(format!("{}.txt", id))),
            (links, self.links_dir().join(format!("{}.txt", id))),
        ];

        for (i, (from, to)) in moves.iter().enumerate() {
            if let Err(e) = std::fs::rename(from, to) {
                tracing::error!(
                    "Failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    e
                );
                for (_, moved) in &moves[..i] {
                    remove_quietly(moved);
                }
                for (pending, _) in &moves[i..] {
                    remove_quietly(pending);
                }
                return Err(StorageError::io(to, e));
            }
        }

        Ok(())
    }

    /// Deletes every file of a staged page
    pub fn discard(&self, staged: StagedPage) {
        for path in staged.staged_files() {
            remove_quietly(path);
        }
    }

    /// Writes `ids.txt`
    pub fn write_ids(&self, index: &UrlIndex) -> crate::Result<()> {
        index.save(&self.ids_path()).map_err(|e| match e {
            StorageError::Io { path, source } => CrawlError::WriteIndex { path, source },
            other => other.into(),
        })
    }
}

/// Removes every regular file in `dir`, returning how many were removed
fn sweep_dir(dir: &Path) -> crate::Result<usize> {
    let mut removed = 0;
    let entries = std::fs::read_dir(dir).map_err(|e| StorageError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| StorageError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            std::fs::remove_file(&path).map_err(|e| StorageError::io(&path, e))?;
            removed += 1;
        }
    }

    Ok(removed)
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}
