use super::engine::{
    DocumentStore, FetchOptions, FetchResponse, PutManyResponse, StoreError, StoreResult,
};
use super::filter::FetchQuery;
use crate::core::{Document, KEY_FIELD, document_key};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Default number of items a single fetch returns.
pub const DEFAULT_PAGE_SIZE: usize = 1000;
/// Largest batch accepted by `put_many`.
pub const MAX_BATCH_SIZE: usize = 25;

const GENERATED_KEY_LEN: usize = 12;

type Documents = BTreeMap<String, Document>;

/// In-process document store with key-ordered collections.
///
/// Pages are capped at `page_size` items regardless of the requested limit, so
/// callers must follow continuation cursors exactly as with a remote backend.
pub struct MemoryDocumentStore {
    /// Collections, each behind its own lock
    collections: RwLock<HashMap<String, Arc<RwLock<Documents>>>>,
    page_size: usize,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
        }
    }

    /// Number of documents currently stored in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collection(collection).await.read().await.len()
    }

    async fn collection(&self, name: &str) -> Arc<RwLock<Documents>> {
        if let Some(handle) = self.collections.read().await.get(name) {
            return handle.clone();
        }
        self.collections
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    fn take_key(document: &mut Document, documents: &Documents) -> StoreResult<String> {
        match document.get(KEY_FIELD) {
            Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
            Some(Value::String(_)) | None => {
                let key = loop {
                    let candidate = Uuid::new_v4().simple().to_string()[..GENERATED_KEY_LEN]
                        .to_string();
                    if !documents.contains_key(&candidate) {
                        break candidate;
                    }
                };
                document.insert(KEY_FIELD.to_string(), Value::String(key.clone()));
                Ok(key)
            }
            Some(other) => Err(StoreError::InvalidDocument(format!(
                "key must be a string, got {other}"
            ))),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, collection: &str, mut document: Document) -> StoreResult<Document> {
        let handle = self.collection(collection).await;
        let mut documents = handle.write().await;
        let key = Self::take_key(&mut document, &documents)?;
        documents.insert(key, document.clone());
        Ok(document)
    }

    async fn insert(&self, collection: &str, mut document: Document) -> StoreResult<Document> {
        let handle = self.collection(collection).await;
        let mut documents = handle.write().await;
        let key = Self::take_key(&mut document, &documents)?;
        if documents.contains_key(&key) {
            return Err(StoreError::KeyExists(key));
        }
        documents.insert(key, document.clone());
        Ok(document)
    }

    async fn put_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StoreResult<PutManyResponse> {
        if documents.len() > MAX_BATCH_SIZE {
            return Err(StoreError::InvalidDocument(format!(
                "batch of {} exceeds the limit of {MAX_BATCH_SIZE}",
                documents.len()
            )));
        }

        let handle = self.collection(collection).await;
        let mut stored = handle.write().await;
        let mut response = PutManyResponse::default();
        for mut document in documents {
            match Self::take_key(&mut document, &stored) {
                Ok(key) => {
                    stored.insert(key, document.clone());
                    response.processed.push(document);
                }
                Err(_) => response.failed.push(document),
            }
        }
        Ok(response)
    }

    async fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        let handle = self.collection(collection).await;
        let documents = handle.read().await;
        Ok(documents.get(key).cloned())
    }

    async fn fetch(
        &self,
        collection: &str,
        query: &FetchQuery,
        options: &FetchOptions,
    ) -> StoreResult<FetchResponse> {
        let limit = match options.limit {
            Some(limit) if limit > 0 => limit.min(self.page_size),
            _ => self.page_size,
        };
        let start = match options.last.as_deref() {
            Some(last) => Bound::Excluded(last.to_string()),
            None => Bound::Unbounded,
        };

        let handle = self.collection(collection).await;
        let documents = handle.read().await;
        let mut matching = documents
            .range((start, Bound::Unbounded))
            .map(|(_, document)| document)
            .filter(|document| query.matches(document));

        let items: Vec<Document> = matching.by_ref().take(limit).cloned().collect();
        let last = if matching.next().is_some() {
            items
                .last()
                .and_then(document_key)
                .map(str::to_string)
        } else {
            None
        };

        Ok(FetchResponse {
            count: items.len(),
            items,
            last,
        })
    }

    async fn update(&self, collection: &str, updates: Document, key: &str) -> StoreResult<()> {
        let handle = self.collection(collection).await;
        let mut documents = handle.write().await;
        let document = documents
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        for (path, value) in updates {
            if path == KEY_FIELD {
                return Err(StoreError::InvalidDocument(
                    "the key field cannot be updated".to_string(),
                ));
            }
            set_path(document, &path, value)?;
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        let handle = self.collection(collection).await;
        handle.write().await.remove(key);
        Ok(())
    }
}

fn set_path(document: &mut Document, path: &str, value: Value) -> StoreResult<()> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = segments
        .pop()
        .filter(|leaf| !leaf.is_empty())
        .ok_or_else(|| StoreError::InvalidDocument(format!("invalid field path '{path}'")))?;

    let mut current = document;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Document::new()));
        current = slot.as_object_mut().ok_or_else(|| {
            StoreError::InvalidDocument(format!("'{segment}' in '{path}' is not an object"))
        })?;
    }
    current.insert(leaf.to_string(), value);
    Ok(())
}
