//! File-backed vector store.
//!
//! Each collection lives in `{dir}/{collection}.json`. The file is read the
//! first time a collection is touched and rewritten in full on every `add`,
//! via a temporary file and a rename, so a crash mid-write leaves the previous
//! version intact. Only one process should use a directory at a time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{IndexRecord, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, check_dimensions, rank};

const BACKEND: &str = "Persistent";

#[derive(Debug, Serialize, Deserialize)]
struct Collection {
    dimensions: usize,
    records: Vec<IndexRecord>,
}

#[derive(Serialize)]
struct CollectionRef<'a> {
    dimensions: usize,
    records: &'a [IndexRecord],
}

/// A vector store that persists collections as JSON files in a directory.
///
/// # Example
///
/// ```rust,ignore
/// use ragswitch_rag::{PersistentVectorStore, VectorStore};
///
/// let store = PersistentVectorStore::open("./chroma_db")?;
/// store.create_collection("rag_documents", 384).await?;
/// ```
#[derive(Debug)]
pub struct PersistentVectorStore {
    dir: PathBuf,
    collections: RwLock<HashMap<String, Collection>>,
}

impl PersistentVectorStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!(backend = BACKEND, dir = %dir.display(), "opened vector store");
        Ok(Self { dir, collections: RwLock::new(HashMap::new()) })
    }

    /// The directory holding the collection files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(store_error(format!(
                "invalid collection name '{name}': use ASCII letters, digits, '_' or '-'"
            )));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    async fn read_file(&self, name: &str) -> Result<Option<Collection>> {
        let path = self.path_for(name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let collection: Collection = serde_json::from_slice(&bytes).map_err(|e| {
            store_error(format!("failed to parse {}: {e}", path.display()))
        })?;
        debug!(
            backend = BACKEND,
            collection = name,
            records = collection.records.len(),
            "loaded collection"
        );
        Ok(Some(collection))
    }

    async fn write_file(
        &self,
        name: &str,
        dimensions: usize,
        records: &[IndexRecord],
    ) -> Result<()> {
        let path = self.path_for(name)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(&CollectionRef { dimensions, records })
            .map_err(|e| store_error(format!("failed to serialize collection '{name}': {e}")))?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Make sure `name` is in the cache if it exists on disk.
    async fn load_into(
        &self,
        collections: &mut HashMap<String, Collection>,
        name: &str,
    ) -> Result<()> {
        if !collections.contains_key(name) {
            if let Some(collection) = self.read_file(name).await? {
                collections.insert(name.to_string(), collection);
            }
        }
        Ok(())
    }
}

fn store_error(message: impl Into<String>) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message: message.into() }
}

fn missing(collection: &str) -> RagError {
    store_error(format!("collection '{collection}' does not exist"))
}

#[async_trait]
impl VectorStore for PersistentVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        self.load_into(&mut collections, name).await?;

        if let Some(existing) = collections.get(name) {
            if existing.dimensions != dimensions {
                return Err(store_error(format!(
                    "collection '{name}' has {} dimensions, requested {dimensions}",
                    existing.dimensions
                )));
            }
            return Ok(());
        }

        self.write_file(name, dimensions, &[]).await?;
        collections.insert(name.to_string(), Collection { dimensions, records: Vec::new() });
        info!(backend = BACKEND, collection = name, dimensions, "created collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        match tokio::fs::remove_file(self.path_for(name)?).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!(backend = BACKEND, collection = name, "deleted collection");
        Ok(())
    }

    async fn add(&self, collection: &str, records: &[IndexRecord]) -> Result<()> {
        let mut collections = self.collections.write().await;
        self.load_into(&mut collections, collection).await?;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        check_dimensions(BACKEND, collection, store.dimensions, records)?;

        let mut next = Vec::with_capacity(store.records.len() + records.len());
        next.extend_from_slice(&store.records);
        next.extend_from_slice(records);
        self.write_file(collection, store.dimensions, &next).await?;
        store.records = next;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let mut collections = self.collections.write().await;
        self.load_into(&mut collections, collection).await?;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(rank(&store.records, embedding, top_k))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let mut collections = self.collections.write().await;
        self.load_into(&mut collections, collection).await?;
        Ok(collections.get(collection).map_or(0, |c| c.records.len()))
    }
}
