pub mod error;
pub mod models;
pub mod queries;

use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

pub use error::{Result, StoreError};
pub use models::{ChirpRecord, Document, RefreshTokenSlot, UserRecord};

/// JSON document store.
///
/// The whole database lives in one file. Every call loads it, and every
/// mutating call writes it back in full. A single readers-writer lock keeps
/// mutations from interleaving with each other or with readers.
pub struct Database {
    path: PathBuf,
    lock: RwLock<()>,
}

impl Database {
    /// Start from a clean slate: any existing file at `path` is removed and
    /// replaced with an empty one.
    pub fn initialize(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed previous document at {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::File::create(&path)?;

        info!("Document store initialized at {}", path.display());
        Ok(Self::at(path))
    }

    /// Open an existing document, creating an empty one if the file is missing.
    /// Fails if the file exists but does not parse.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            fs::File::create(&path)?;
        }

        let db = Self::at(path);
        let doc = db.load()?;
        info!(
            "Document store opened at {} ({} chirps, {} users)",
            db.path.display(),
            doc.chirps.len(),
            doc.users.len()
        );
        Ok(db)
    }

    fn at(path: PathBuf) -> Self {
        Self {
            path,
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full document. An empty file is an empty document.
    pub fn load(&self) -> Result<Document> {
        let _guard = self.lock.read().map_err(|_| StoreError::LockPoisoned)?;
        read_document(&self.path)
    }

    /// Replace the full document on disk.
    pub fn save(&self, doc: &Document) -> Result<()> {
        let _guard = self.lock.write().map_err(|_| StoreError::LockPoisoned)?;
        write_document(&self.path, doc)
    }

    /// Run `f` against a freshly loaded document under the shared lock.
    pub(crate) fn with_doc<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Document) -> Result<T>,
    {
        let _guard = self.lock.read().map_err(|_| StoreError::LockPoisoned)?;
        let doc = read_document(&self.path)?;
        f(&doc)
    }

    /// Load, mutate and save under the exclusive lock.
    /// Nothing is written if `f` fails.
    pub(crate) fn with_doc_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let _guard = self.lock.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut doc = read_document(&self.path)?;
        let out = f(&mut doc)?;
        write_document(&self.path, &doc)?;
        Ok(out)
    }
}

fn read_document(path: &Path) -> Result<Document> {
    let content = fs::read(path)?;
    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::default());
    }
    Ok(serde_json::from_slice(&content)?)
}

/// Write to a sibling temp file and rename over the target, so a crash
/// mid-write leaves the previous document in place.
fn write_document(path: &Path, doc: &Document) -> Result<()> {
    let data = serde_json::to_vec(doc)?;

    let tmp = temp_path(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
