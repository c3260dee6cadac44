use super::page::fetch_page;
use super::predicate::collection_covers;
use crate::core::{Collection, Result};
use crate::records::collection::{CLASS_NAME_FIELD, SESSION_YEAR_FIELD};
use crate::storage::{DocumentStore, FetchOptions, FetchQuery, Filter};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Suffix appended to class names in the unpaid half of a report.
pub const UNPAID_SUFFIX: &str = "-unpaid";

/// Counts every record matching `query` by paging through all of them.
///
/// Cost grows with the number of matching records; there is no cached counter.
pub async fn count_all(
    store: &dyn DocumentStore,
    collection: Collection,
    query: &FetchQuery,
) -> Result<u64> {
    let mut total = 0u64;
    let mut options = FetchOptions::new();
    loop {
        let page = fetch_page(store, collection, query, &options).await?;
        total += page.items.len() as u64;
        match page.continuation {
            Some(next) => options.last = Some(next),
            None => return Ok(total),
        }
    }
}

/// Paid and unpaid student counts per class for one fee type and period set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub paid: BTreeMap<String, u64>,
    #[serde(rename = "unPaid")]
    pub un_paid: BTreeMap<String, u64>,
}

impl CollectionReport {
    fn record(&mut self, class_name: &str, paid: bool) {
        if paid {
            *self.paid.entry(class_name.to_string()).or_default() += 1;
        } else {
            *self
                .un_paid
                .entry(format!("{class_name}{UNPAID_SUFFIX}"))
                .or_default() += 1;
        }
    }
}

/// Full scan of a session year's collection rows, grouped by class.
pub async fn classwise_report(
    store: &dyn DocumentStore,
    fee_type: &str,
    session_year: u32,
    sessions: &[u32],
) -> Result<CollectionReport> {
    let query = FetchQuery::from(Filter::new().eq(SESSION_YEAR_FIELD, session_year));
    let mut report = CollectionReport::default();
    let mut options = FetchOptions::new();
    loop {
        let page = fetch_page(store, Collection::Collections, &query, &options).await?;
        for row in &page.items {
            let class_name = row
                .get(CLASS_NAME_FIELD)
                .and_then(Value::as_str)
                .unwrap_or_default();
            report.record(class_name, collection_covers(row, fee_type, sessions));
        }
        match page.continuation {
            Some(next) => options.last = Some(next),
            None => return Ok(report),
        }
    }
}
