use super::filter::FetchQuery;
use crate::core::Document;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record '{0}' not found")]
    NotFound(String),

    #[error("record '{0}' already exists")]
    KeyExists(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Paging options for [`DocumentStore::fetch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum number of items in the page. The backend may return fewer.
    pub limit: Option<usize>,
    /// Continuation cursor: the page starts strictly after this key.
    pub last: Option<String>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn after(mut self, last: impl Into<String>) -> Self {
        self.last = Some(last.into());
        self
    }
}

/// One page of a fetch. `last` is present iff more pages remain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchResponse {
    pub items: Vec<Document>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutManyResponse {
    pub processed: Vec<Document>,
    pub failed: Vec<Document>,
}

/// Contract of the schemaless backend holding every ledger collection.
///
/// The backend filters on field equality and substring containment only, pages
/// results behind an opaque continuation cursor and never aggregates. Anything
/// beyond that is computed by the query layer on top of [`DocumentStore::fetch`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a document, overwriting any document under the same key. A key is
    /// assigned when the document carries none.
    async fn put(&self, collection: &str, document: Document) -> StoreResult<Document>;

    /// Conditional put: fails with [`StoreError::KeyExists`] instead of overwriting.
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<Document>;

    async fn put_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> StoreResult<PutManyResponse>;

    async fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>>;

    async fn fetch(
        &self,
        collection: &str,
        query: &FetchQuery,
        options: &FetchOptions,
    ) -> StoreResult<FetchResponse>;

    /// Applies a partial update. Field names may be dotted paths into nested objects.
    async fn update(&self, collection: &str, updates: Document, key: &str) -> StoreResult<()>;

    /// Removes a document. Deleting an absent key is not an error.
    async fn delete(&self, collection: &str, key: &str) -> StoreResult<()>;
}
