use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SESSION_YEAR_FIELD: &str = "sessionYear";
pub const CLASS_NAME_FIELD: &str = "className";
pub const COLLECTION_INFO_FIELD: &str = "collectionInfo";

/// Paid periods per fee type for one student and session year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub std_name: String,
    pub student_id: String,
    pub session_year: u32,
    #[serde(default)]
    pub collection_info: BTreeMap<String, Vec<u32>>,
    #[serde(default)]
    pub class_id: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub sec: String,
}

/// Appends the periods not yet present, keeping existing order.
pub fn merge_periods(paid: &[u32], periods: &[u32]) -> Vec<u32> {
    let mut merged = paid.to_vec();
    for period in periods {
        if !merged.contains(period) {
            merged.push(*period);
        }
    }
    merged
}

/// Removes every occurrence of the given periods by value.
pub fn withdraw_periods(paid: &[u32], periods: &[u32]) -> Vec<u32> {
    paid.iter()
        .copied()
        .filter(|period| !periods.contains(period))
        .collect()
}
