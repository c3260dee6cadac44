//! Filtered pagination over a backend that cannot evaluate the filter.
//!
//! The store's continuation cursor is positional over every scanned record,
//! while callers page over accepted records only. When a scan stops in the
//! middle of a backend page the store cursor already points past records nobody
//! reviewed, so the caller-facing cursor carries two positions:
//!
//! - `lastAccepted`: key of the last item handed out. Resuming after it never
//!   skips a record, at the price of re-reviewing rejected ones.
//! - `continuation`: the store cursor, set only when every record before it was
//!   reviewed. Resuming from it skips the rejected tail without losing anything.

use super::page::fetch_page;
use crate::core::{Collection, Document, Result, document_key};
use crate::storage::{DocumentStore, FetchOptions, FetchQuery};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeCursor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accepted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
}

impl ResumeCursor {
    /// Cursor resuming right after the given record key.
    pub fn after(key: impl Into<String>) -> Self {
        Self {
            last_accepted: Some(key.into()),
            continuation: None,
        }
    }

    /// Store key the next scan starts after.
    pub fn position(&self) -> Option<&str> {
        self.continuation
            .as_deref()
            .or(self.last_accepted.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredPage {
    pub items: Vec<Document>,
    /// Absent when nothing was accepted and the backend is exhausted.
    #[serde(rename = "last", skip_serializing_if = "Option::is_none")]
    pub resume: Option<ResumeCursor>,
}

/// A scan applying a caller-side predicate to a store query.
pub struct FilteredScan<'a> {
    store: &'a dyn DocumentStore,
    collection: Collection,
    query: &'a FetchQuery,
    page_budget: Option<usize>,
}

impl<'a> FilteredScan<'a> {
    pub fn new(store: &'a dyn DocumentStore, collection: Collection, query: &'a FetchQuery) -> Self {
        Self {
            store,
            collection,
            query,
            page_budget: None,
        }
    }

    /// Caps the number of backend pages one call may read.
    pub fn with_page_budget(mut self, page_budget: Option<usize>) -> Self {
        self.page_budget = page_budget.filter(|&pages| pages > 0);
        self
    }

    /// Collects up to `desired` items satisfying `predicate`, starting after `start`.
    pub async fn collect<P>(
        &self,
        predicate: P,
        desired: usize,
        start: Option<&ResumeCursor>,
    ) -> Result<FilteredPage>
    where
        P: Fn(&Document) -> bool,
    {
        if desired == 0 {
            return Ok(FilteredPage::default());
        }

        let mut options = FetchOptions {
            limit: None,
            last: start.and_then(ResumeCursor::position).map(str::to_string),
        };
        let mut accepted: Vec<Document> = Vec::with_capacity(desired);
        let mut pages = 0usize;

        let continuation = loop {
            let page = fetch_page(self.store, self.collection, self.query, &options).await?;
            pages += 1;

            let scanned = page.items.len();
            let mut reviewed = 0usize;
            for item in page.items {
                reviewed += 1;
                if predicate(&item) {
                    accepted.push(item);
                    if accepted.len() == desired {
                        break;
                    }
                }
            }
            debug!(
                collection = %self.collection,
                page = pages,
                scanned,
                reviewed,
                accepted = accepted.len(),
                "filtered page"
            );

            let Some(next) = page.continuation else {
                break None;
            };
            if accepted.len() == desired {
                break (reviewed == scanned).then_some(next);
            }
            if self.page_budget.is_some_and(|budget| pages >= budget) {
                break Some(next);
            }
            options.last = Some(next);
        };

        let last_accepted = accepted.last().and_then(document_key).map(str::to_string);
        let resume = (last_accepted.is_some() || continuation.is_some()).then(|| ResumeCursor {
            last_accepted,
            continuation,
        });

        Ok(FilteredPage {
            items: accepted,
            resume,
        })
    }
}

/// Convenience wrapper around [`FilteredScan::collect`] without a page budget.
pub async fn filtered_page<P>(
    store: &dyn DocumentStore,
    collection: Collection,
    query: &FetchQuery,
    predicate: P,
    desired: usize,
    start: Option<&ResumeCursor>,
) -> Result<FilteredPage>
where
    P: Fn(&Document) -> bool,
{
    FilteredScan::new(store, collection, query)
        .collect(predicate, desired, start)
        .await
}
