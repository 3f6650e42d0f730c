//! Bidirectional ID <-> URL table backing `ids.txt`

use crate::storage::{StorageError, StorageResult};
use crate::url::normalize;
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Mapping between permanent page IDs and canonical URLs
///
/// IDs handed out by [`UrlIndex::assign`] start at 1 and grow by one per
/// accepted page, so the IDs of a crawl are always dense.
#[derive(Debug, Clone)]
pub struct UrlIndex {
    by_id: BTreeMap<u64, String>,
    by_url: HashMap<String, u64>,
    next_id: u64,
}

impl UrlIndex {
    /// Creates an empty index whose first ID will be 1
    pub fn new() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_url: HashMap::new(),
            next_id: 1,
        }
    }

    /// The ID the next call to [`assign`](Self::assign) will hand out
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Assigns the next ID to a canonical URL
    ///
    /// If the URL already has an ID, that ID is returned and nothing changes.
    pub fn assign(&mut self, canonical: String) -> u64 {
        if let Some(&id) = self.by_url.get(&canonical) {
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.by_id.insert(id, canonical.clone());
        self.by_url.insert(canonical, id);
        id
    }

    /// Looks up the ID of a URL
    ///
    /// The query is normalized first, so `https://example.com/a/` finds the
    /// entry stored for `http://example.com/a`.
    pub fn id_of(&self, url: &str) -> Option<u64> {
        self.by_url.get(&normalize(url)).copied()
    }

    /// Looks up the canonical URL stored under an ID
    pub fn url_of(&self, id: u64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates over `(id, url)` pairs in ascending ID order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.by_id.iter().map(|(id, url)| (*id, url.as_str()))
    }

    /// Writes the index as `<url> <id>` lines sorted by ID
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let file = std::fs::File::create(path).map_err(|e| StorageError::io(path, e))?;
        let mut writer = BufWriter::new(file);

        for (id, url) in self.iter() {
            writeln!(writer, "{} {}", url, id).map_err(|e| StorageError::io(path, e))?;
        }

        writer.flush().map_err(|e| StorageError::io(path, e))?;
        Ok(())
    }

    /// Reads an index previously written by [`save`](Self::save)
    ///
    /// Blank lines are ignored. A line without an ID, with a non-numeric or
    /// zero ID, or repeating an ID or URL is reported as corrupt.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| StorageError::io(path, e))?;
        let reader = BufReader::new(file);
        let mut index = Self::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| StorageError::io(path, e))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let corrupt = || StorageError::Corrupt {
                line: number + 1,
                content: line.clone(),
            };

            let (url, id) = trimmed.rsplit_once(' ').ok_or_else(corrupt)?;
            let id: u64 = id.parse().map_err(|_| corrupt())?;
            let url = url.trim_end();

            if id == 0
                || url.is_empty()
                || index.by_id.contains_key(&id)
                || index.by_url.contains_key(url)
            {
                return Err(corrupt());
            }

            index.by_id.insert(id, url.to_string());
            index.by_url.insert(url.to_string(), id);
            index.next_id = index.next_id.max(id + 1);
        }

        Ok(index)
    }
}

impl Default for UrlIndex {
    fn default() -> Self {
        Self::new()
    }
}
