//! Session-set predicates the document store cannot evaluate itself.

use crate::core::Document;
use crate::storage::filter::lookup;
use serde_json::Value;

/// True iff every required period is present in `candidate`.
///
/// An empty requirement matches anything.
pub fn sessions_match(required: &[u32], candidate: &[u32]) -> bool {
    required.iter().all(|period| candidate.contains(period))
}

/// Reads a JSON array of period numbers. Non-integer entries are skipped.
pub fn session_values(value: &Value) -> Option<Vec<u32>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_u64)
            .filter_map(|period| u32::try_from(period).ok())
            .collect(),
    )
}

/// Whether a collection row records every required period as paid for `fee_type`.
///
/// A row without the fee type never matches, not even an empty requirement.
pub fn collection_covers(document: &Document, fee_type: &str, required: &[u32]) -> bool {
    document
        .get("collectionInfo")
        .and_then(Value::as_object)
        .and_then(|info| info.get(fee_type))
        .and_then(session_values)
        .is_some_and(|paid| sessions_match(required, &paid))
}

/// Whether an account entry covers every required period.
pub fn account_covers(document: &Document, required: &[u32]) -> bool {
    lookup(document, "session")
        .and_then(session_values)
        .is_some_and(|covered| sessions_match(required, &covered))
}
