use super::LedgerService;
use super::dto::{CollectionReportRequest, StudentCollectionRequest, StudentPatch};
use crate::core::{Collection, Document, LedgerError, Result, StoreResultExt, to_document};
use crate::query::{CollectionReport, FilteredPage, FilteredScan, classwise_report, collection_covers};
use crate::records::collection::{
    CLASS_NAME_FIELD, COLLECTION_INFO_FIELD, SESSION_YEAR_FIELD, merge_periods, withdraw_periods,
};
use crate::records::{AccountEntry, CollectionRecord, STUDENT_ID_FIELD};
use crate::storage::{FetchOptions, FetchQuery, Filter};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

impl LedgerService {
    /// Paid/unpaid counts per class for a fee type and period set.
    pub async fn collection_report(
        &self,
        request: CollectionReportRequest,
    ) -> Result<CollectionReport> {
        request.validate()?;
        classwise_report(
            self.store.as_ref(),
            &request.fee_type,
            request.session_year,
            &request.session,
        )
        .await
    }

    /// Students of one class who have (or have not) paid every requested period.
    pub async fn student_collection_page(
        &self,
        request: StudentCollectionRequest,
    ) -> Result<FilteredPage> {
        request.validate(self.config.max_page_limit)?;
        let StudentCollectionRequest {
            fee_type,
            session_year,
            session,
            class_name,
            is_paid,
            limit,
            last,
        } = request;

        let query = FetchQuery::from(
            Filter::new()
                .eq(SESSION_YEAR_FIELD, session_year)
                .eq(CLASS_NAME_FIELD, class_name),
        );
        let start = last.and_then(|cursor| cursor.into_cursor());
        FilteredScan::new(self.store.as_ref(), Collection::Collections, &query)
            .with_page_budget(self.config.scan_page_budget)
            .collect(
                |row| collection_covers(row, &fee_type, &session) == is_paid,
                limit,
                start.as_ref(),
            )
            .await
    }

    async fn find_collection_records(
        &self,
        student_id: &str,
        session_year: u32,
    ) -> Result<Vec<CollectionRecord>> {
        let query = FetchQuery::from(
            Filter::new()
                .eq(STUDENT_ID_FIELD, student_id)
                .eq(SESSION_YEAR_FIELD, session_year),
        );
        self.fetch_all(Collection::Collections, &query)
            .await?
            .into_iter()
            .map(crate::core::from_document)
            .collect()
    }

    /// Marks the entry's periods as paid in its collection record, creating the
    /// record on the first payment of the session year.
    pub(crate) async fn record_paid_periods(&self, entry: &AccountEntry) -> Result<()> {
        let lock_key = format!("{}:{}", entry.student_id, entry.session_year);
        let _guard = self.collection_locks.lock(&lock_key).await;

        let records = self
            .find_collection_records(&entry.student_id, entry.session_year)
            .await?;

        let Some((record, duplicates)) = records.split_first() else {
            return self.create_collection_record(entry).await;
        };
        if !duplicates.is_empty() {
            warn!(
                student_id = %entry.student_id,
                session_year = entry.session_year,
                duplicates = duplicates.len(),
                "multiple collection records, merging into the first"
            );
        }

        let key = record
            .key
            .as_deref()
            .ok_or_else(|| LedgerError::internal("collection record without key"))?;
        let paid = record
            .collection_info
            .get(&entry.fee_type)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let merged = merge_periods(paid, &entry.session);
        self.store
            .update(
                Collection::Collections.name(),
                fee_periods_update(&entry.fee_type, &merged),
                key,
            )
            .await
            .at(Collection::Collections)?;
        debug!(key, fee_type = %entry.fee_type, periods = ?merged, "merged paid periods");
        Ok(())
    }

    async fn create_collection_record(&self, entry: &AccountEntry) -> Result<()> {
        let key = self
            .keys
            .allocate_year_key(Collection::Collections, entry.session_year)
            .await?;
        let record = CollectionRecord {
            key: Some(key.clone()),
            std_name: entry.std_name.clone(),
            student_id: entry.student_id.clone(),
            session_year: entry.session_year,
            collection_info: BTreeMap::from([(
                entry.fee_type.clone(),
                merge_periods(&[], &entry.session),
            )]),
            class_id: entry.class_id.clone(),
            class_name: entry.class_name.clone(),
            sec: entry.sec.clone(),
        };
        self.store
            .insert(Collection::Collections.name(), to_document(&record)?)
            .await
            .at(Collection::Collections)?;
        info!(
            key = %key,
            student_id = %entry.student_id,
            session_year = entry.session_year,
            "created collection record"
        );
        Ok(())
    }

    /// Removes the entry's periods from its collection record, if any.
    pub(crate) async fn withdraw_paid_periods(&self, entry: &AccountEntry) -> Result<()> {
        let lock_key = format!("{}:{}", entry.student_id, entry.session_year);
        let _guard = self.collection_locks.lock(&lock_key).await;

        let records = self
            .find_collection_records(&entry.student_id, entry.session_year)
            .await?;
        let Some(record) = records.first() else {
            return Ok(());
        };
        let Some(paid) = record.collection_info.get(&entry.fee_type) else {
            return Ok(());
        };
        let key = record
            .key
            .as_deref()
            .ok_or_else(|| LedgerError::internal("collection record without key"))?;

        let remaining = withdraw_periods(paid, &entry.session);
        self.store
            .update(
                Collection::Collections.name(),
                fee_periods_update(&entry.fee_type, &remaining),
                key,
            )
            .await
            .at(Collection::Collections)?;
        debug!(key, fee_type = %entry.fee_type, periods = ?remaining, "withdrew paid periods");
        Ok(())
    }

    /// Mirrors a class placement change onto the student's newest collection record.
    ///
    /// Collection keys sort newest session year first, so the first row is the
    /// current one.
    pub(crate) async fn sync_class_placement(
        &self,
        student_id: &str,
        patch: &StudentPatch,
    ) -> Result<()> {
        let mut updates = Document::new();
        if let Some(class_name) = &patch.class_name {
            updates.insert(CLASS_NAME_FIELD.to_string(), json!(class_name));
        }
        if let Some(class_id) = &patch.class_id {
            updates.insert("classId".to_string(), json!(class_id));
        }
        if let Some(section) = &patch.section {
            updates.insert("sec".to_string(), json!(section));
        }
        if updates.is_empty() {
            return Ok(());
        }

        let query = FetchQuery::from(Filter::new().eq(STUDENT_ID_FIELD, student_id));
        let page = crate::query::fetch_page(
            self.store.as_ref(),
            Collection::Collections,
            &query,
            &FetchOptions::new().limit(1),
        )
        .await?;
        let Some(key) = page.items.first().and_then(crate::core::document_key) else {
            return Ok(());
        };
        self.store
            .update(Collection::Collections.name(), updates, key)
            .await
            .at(Collection::Collections)
    }
}

fn fee_periods_update(fee_type: &str, periods: &[u32]) -> Document {
    super::single_field(&format!("{COLLECTION_INFO_FIELD}.{fee_type}"), json!(periods))
}
