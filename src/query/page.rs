use super::count::count_all;
use crate::core::{Collection, Document, Result, StoreResultExt};
use crate::storage::{DocumentStore, FetchOptions, FetchQuery};
use serde::Serialize;
use tracing::debug;

/// One backend page. `continuation == None` means the data is exhausted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Document>,
    pub continuation: Option<String>,
}

/// Single pass-through call to the store's paged fetch.
pub async fn fetch_page(
    store: &dyn DocumentStore,
    collection: Collection,
    query: &FetchQuery,
    options: &FetchOptions,
) -> Result<Page> {
    let response = store
        .fetch(collection.name(), query, options)
        .await
        .at(collection)?;
    debug!(
        %collection,
        count = response.count,
        after = ?options.last,
        more = response.last.is_some(),
        "fetched page"
    );
    Ok(Page {
        items: response.items,
        continuation: response.last,
    })
}

/// A `{query, options}` pair plus whether an exact total may be offered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    pub query: FetchQuery,
    pub options: FetchOptions,
    /// An exact total is only computed for a first, unfiltered, limited page.
    pub is_total_count: bool,
}

impl PageRequest {
    pub fn new(query: FetchQuery, options: FetchOptions) -> Self {
        let is_total_count = options.limit.is_some()
            && options.last.is_none()
            && !query.alternatives().iter().any(|filter| filter.has_contains());
        Self {
            query,
            options,
            is_total_count,
        }
    }
}

/// Caller-facing page of a plain listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub items: Vec<Document>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// Fetches one page and, when allowed, the exact total by full scan.
pub async fn fetch_listing(
    store: &dyn DocumentStore,
    collection: Collection,
    request: &PageRequest,
) -> Result<ListingPage> {
    let page = fetch_page(store, collection, &request.query, &request.options).await?;
    let total_count = if request.is_total_count {
        Some(count_all(store, collection, &request.query).await?)
    } else {
        None
    };

    Ok(ListingPage {
        count: page.items.len(),
        items: page.items,
        last: page.continuation,
        total_count,
    })
}
