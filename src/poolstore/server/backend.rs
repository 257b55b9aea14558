use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use fnv::FnvHashMap;
use tracing::debug;

use crate::poolstore::common::{Error, ObjectId, Result};
use crate::poolstore::config::{BackendKind, Settings};

/// A key to bytes map the server dispatches into. Implementations need no
/// internal locking, the dispatch loop is the only caller.
pub trait StorageBackend: Send {
    fn init(&mut self) -> Result<()>;
    fn put(&mut self, oid: ObjectId, data: &[u8]) -> Result<()>;
    fn exists(&self, oid: ObjectId) -> bool;
    /// Returns a shared view of the stored bytes. The memory backend clones a
    /// Bytes handle without copying the blob.
    fn get(&self, oid: ObjectId) -> Result<Bytes>;
    fn remove(&mut self, oid: ObjectId) -> Result<bool>;
    fn size(&self, oid: ObjectId) -> Result<u64>;
}

pub fn build_backend(conf: &Settings) -> Box<dyn StorageBackend> {
    match conf.backend {
        BackendKind::Memory => Box::new(MemoryBackend::new()),
        BackendKind::Disk => Box::new(DiskBackend::new(&conf.storage_path)),
    }
}

/// Blobs held in an in-process hash table, lost on shutdown.
pub struct MemoryBackend {
    store: FnvHashMap<ObjectId, Bytes>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            store: FnvHashMap::default(),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn put(&mut self, oid: ObjectId, data: &[u8]) -> Result<()> {
        self.store.insert(oid, Bytes::copy_from_slice(data));
        Ok(())
    }

    fn exists(&self, oid: ObjectId) -> bool {
        self.store.contains_key(&oid)
    }

    fn get(&self, oid: ObjectId) -> Result<Bytes> {
        self.store
            .get(&oid)
            .cloned()
            .ok_or_else(|| Error::no_such_id(oid))
    }

    fn remove(&mut self, oid: ObjectId) -> Result<bool> {
        Ok(self.store.remove(&oid).is_some())
    }

    fn size(&self, oid: ObjectId) -> Result<u64> {
        self.store
            .get(&oid)
            .map(|b| b.len() as u64)
            .ok_or_else(|| Error::no_such_id(oid))
    }
}

/// One file per blob, named by the id in hex, under a configured directory.
/// Writes go to a temp file first and are renamed into place so a crash
/// mid-write never leaves a torn blob behind.
pub struct DiskBackend {
    dir: PathBuf,
}

impl DiskBackend {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        DiskBackend {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn blob_path(&self, oid: ObjectId) -> PathBuf {
        self.dir.join(format!("{:016x}", oid))
    }
}

impl StorageBackend for DiskBackend {
    fn init(&mut self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        debug!(dir = %self.dir.to_string_lossy(), "disk backend initialized");
        Ok(())
    }

    fn put(&mut self, oid: ObjectId, data: &[u8]) -> Result<()> {
        let path = self.blob_path(oid);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn exists(&self, oid: ObjectId) -> bool {
        self.blob_path(oid).is_file()
    }

    fn get(&self, oid: ObjectId) -> Result<Bytes> {
        Ok(Bytes::from(fs::read(self.blob_path(oid))?))
    }

    fn remove(&mut self, oid: ObjectId) -> Result<bool> {
        match fs::remove_file(self.blob_path(oid)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn size(&self, oid: ObjectId) -> Result<u64> {
        Ok(fs::metadata(self.blob_path(oid))?.len())
    }
}
