//! On-disk layout of shard and replica files.
//!
//! # Storage Layout
//!
//! ```text
//! <shard_dir>/
//! +-- 0.txt       # Shard 0, primary
//! +-- 0-1.txt     # Shard 0, replication level 1
//! +-- 0-2.txt     # Shard 0, replication level 2
//! +-- 1.txt       # Shard 1, primary
//! +-- ...
//! ```
//!
//! File contents are the raw slice of the dataset. Files whose stem does
//! not parse as an `EntryId`, or whose extension differs, are ignored.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::Result;
use crate::storage::index::EntryId;

/// Directory holding primary and replica files.
#[derive(Debug, Clone)]
pub struct ShardDir {
    root: PathBuf,
    extension: String,
}

impl ShardDir {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// File path for a primary or replica.
    pub fn path_for(&self, id: &EntryId) -> PathBuf {
        self.root.join(format!("{}.{}", id, self.extension))
    }

    pub fn exists(&self, id: &EntryId) -> bool {
        self.path_for(id).is_file()
    }

    /// Write (or overwrite) a file, creating the directory if needed.
    pub fn write(&self, id: &EntryId, data: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(id), data)?;
        Ok(())
    }

    pub fn read(&self, id: &EntryId) -> Result<Vec<u8>> {
        Ok(fs::read(self.path_for(id))?)
    }

    /// File size in bytes.
    pub fn size(&self, id: &EntryId) -> Result<u64> {
        Ok(fs::metadata(self.path_for(id))?.len())
    }

    /// Byte-for-byte copy of `from` onto `to`. Returns bytes copied.
    pub fn copy(&self, from: &EntryId, to: &EntryId) -> Result<u64> {
        fs::create_dir_all(&self.root)?;
        Ok(fs::copy(self.path_for(from), self.path_for(to))?)
    }

    /// Delete a file. Returns false if it was already absent.
    pub fn remove(&self, id: &EntryId) -> Result<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// All shard/replica files present, in id order.
    ///
    /// A missing directory lists as empty.
    pub fn list(&self) -> Result<Vec<EntryId>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(id) = stem.parse::<EntryId>() {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Primary shard ids with a file on disk.
    pub fn primaries(&self) -> Result<Vec<u32>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|id| !id.is_replica())
            .map(|id| id.shard())
            .collect())
    }

    /// Replica files on disk.
    pub fn replicas(&self) -> Result<Vec<EntryId>> {
        Ok(self.list()?.into_iter().filter(EntryId::is_replica).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_follow_naming_scheme() {
        let dir = ShardDir::new("/data", "txt");
        assert_eq!(dir.path_for(&EntryId::Shard(3)), PathBuf::from("/data/3.txt"));
        assert_eq!(
            dir.path_for(&EntryId::Replica { shard: 3, level: 2 }),
            PathBuf::from("/data/3-2.txt")
        );
    }

    #[test]
    fn test_write_read_copy_remove() {
        let tmp = tempdir().unwrap();
        let dir = ShardDir::new(tmp.path().join("data"), "txt");
        let primary = EntryId::Shard(0);
        let replica = EntryId::Replica { shard: 0, level: 1 };

        dir.write(&primary, b"abcd").unwrap();
        assert_eq!(dir.read(&primary).unwrap(), b"abcd");
        assert_eq!(dir.size(&primary).unwrap(), 4);

        assert_eq!(dir.copy(&primary, &replica).unwrap(), 4);
        assert_eq!(dir.read(&replica).unwrap(), b"abcd");

        assert!(dir.remove(&replica).unwrap());
        assert!(!dir.remove(&replica).unwrap());
        assert!(!dir.exists(&replica));
    }

    #[test]
    fn test_list_skips_foreign_files() {
        let tmp = tempdir().unwrap();
        let dir = ShardDir::new(tmp.path(), "txt");
        for name in ["10.txt", "2.txt", "2-1.txt", "notes.txt", "3.bin", "4-x.txt"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        fs::create_dir(tmp.path().join("5.txt")).unwrap();

        assert_eq!(
            dir.list().unwrap(),
            vec![
                EntryId::Shard(2),
                EntryId::Replica { shard: 2, level: 1 },
                EntryId::Shard(10),
            ]
        );
        assert_eq!(dir.primaries().unwrap(), vec![2, 10]);
        assert_eq!(dir.replicas().unwrap(), vec![EntryId::Replica { shard: 2, level: 1 }]);
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let tmp = tempdir().unwrap();
        let dir = ShardDir::new(tmp.path().join("absent"), "txt");
        assert!(dir.list().unwrap().is_empty());
    }
}
