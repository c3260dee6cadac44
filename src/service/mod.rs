//! Application service: the ledger operations exposed over HTTP.
//!
//! Every operation is a short sequence of awaited store calls. Writes spanning
//! several collections are sequenced, not transactional; a failure part-way
//! leaves the earlier writes in place and is reported to the caller.

mod accounts;
mod collections;
pub mod dto;
mod locks;
mod students;

pub use locks::KeyedLocks;

use crate::config::ServiceConfig;
use crate::core::{Collection, Document, LedgerError, Result, StoreResultExt, from_document};
use crate::keys::KeyAllocator;
use crate::query::fetch_page;
use crate::storage::{DocumentStore, FetchOptions, FetchQuery, StoreError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn DocumentStore>,
    keys: KeyAllocator,
    collection_locks: Arc<KeyedLocks>,
    config: ServiceConfig,
}

impl LedgerService {
    pub fn new(store: Arc<dyn DocumentStore>, config: ServiceConfig) -> Self {
        let keys = KeyAllocator::new(store.clone(), config.retry);
        Self::with_key_allocator(store, keys, config)
    }

    pub fn with_key_allocator(
        store: Arc<dyn DocumentStore>,
        keys: KeyAllocator,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            keys,
            collection_locks: Arc::new(KeyedLocks::new()),
            config,
        }
    }

    /// Reads every page of a query. Only used for small, bounded groups.
    async fn fetch_all(&self, collection: Collection, query: &FetchQuery) -> Result<Vec<Document>> {
        let mut items = Vec::new();
        let mut options = FetchOptions::new();
        loop {
            let page = fetch_page(self.store.as_ref(), collection, query, &options).await?;
            items.extend(page.items);
            match page.continuation {
                Some(next) => options.last = Some(next),
                None => return Ok(items),
            }
        }
    }

    async fn get_record<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>> {
        self.store
            .get(collection.name(), key)
            .await
            .at(collection)?
            .map(from_document::<T>)
            .transpose()
    }

    /// Partial update of one record; an absent record is a caller error.
    async fn update_record(&self, collection: Collection, updates: Document, key: &str) -> Result<()> {
        match self.store.update(collection.name(), updates, key).await {
            Err(StoreError::NotFound(_)) => {
                Err(LedgerError::not_found(format!("no record '{key}' in {collection}")))
            }
            other => other.at(collection),
        }
    }

    /// Applies the same partial update to each key, collecting failures.
    async fn update_each(&self, collection: Collection, updates: &Document, keys: &[String]) -> Result<()> {
        let mut messages = Vec::new();
        for key in keys {
            if let Err(err) = self
                .store
                .update(collection.name(), updates.clone(), key)
                .await
            {
                messages.push(format!("{key}: {err}"));
            }
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::MultiWrite {
                collection,
                messages,
            })
        }
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let cost = self.config.password_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|err| LedgerError::internal(format!("password hashing task failed: {err}")))?
            .map_err(LedgerError::from)
    }
}

fn single_field(field: &str, value: impl Into<Value>) -> Document {
    let mut document = Document::new();
    document.insert(field.to_string(), value.into());
    document
}

fn keys_of(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(crate::core::document_key)
        .map(str::to_string)
        .collect()
}
