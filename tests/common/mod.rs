#![allow(dead_code)]

use async_trait::async_trait;
use feeledger::config::ServiceConfig;
use feeledger::core::Document;
use feeledger::keys::{RetryPolicy, SuffixSource};
use feeledger::records::AccountEntry;
use feeledger::service::dto::EnrollStudentRequest;
use feeledger::storage::{
    DocumentStore, FetchOptions, FetchQuery, FetchResponse, MemoryDocumentStore, PutManyResponse,
    StoreError, StoreResult,
};
use feeledger::LedgerService;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        retry: RetryPolicy::immediate(4),
        password_cost: 4,
        ..ServiceConfig::default()
    }
}

pub fn ledger(page_size: usize) -> (Arc<MemoryDocumentStore>, LedgerService) {
    let store = Arc::new(MemoryDocumentStore::with_page_size(page_size));
    let service = LedgerService::new(store.clone(), test_config());
    (store, service)
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Hands out scripted suffixes, then numbered fallbacks.
#[derive(Default)]
pub struct ScriptedSuffix {
    script: Mutex<VecDeque<String>>,
    issued: AtomicUsize,
}

impl ScriptedSuffix {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: Mutex::new(script.iter().map(|s| s.to_string()).collect()),
            issued: AtomicUsize::new(0),
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

impl SuffixSource for ScriptedSuffix {
    fn next_suffix(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| format!("fallback{n}"))
    }
}

/// Wraps the memory store and injects failures for one collection.
pub struct FlakyStore {
    pub inner: MemoryDocumentStore,
    /// Every call against this collection fails as unavailable.
    pub unavailable: Option<&'static str>,
    /// Batch writes persist only their first document.
    pub truncate_batches: bool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryDocumentStore::with_page_size(10),
            unavailable: None,
            truncate_batches: false,
        }
    }

    fn check(&self, collection: &str) -> StoreResult<()> {
        if self.unavailable == Some(collection) {
            return Err(StoreError::Unavailable(format!("{collection} is down")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn put(&self, collection: &str, document: Document) -> StoreResult<Document> {
        self.check(collection)?;
        self.inner.put(collection, document).await
    }

    async fn insert(&self, collection: &str, document: Document) -> StoreResult<Document> {
        self.check(collection)?;
        self.inner.insert(collection, document).await
    }

    async fn put_many(
        &self,
        collection: &str,
        mut documents: Vec<Document>,
    ) -> StoreResult<PutManyResponse> {
        self.check(collection)?;
        if self.truncate_batches {
            let failed = documents.split_off(documents.len().min(1));
            let mut response = self.inner.put_many(collection, documents).await?;
            response.failed = failed;
            return Ok(response);
        }
        self.inner.put_many(collection, documents).await
    }

    async fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        self.check(collection)?;
        self.inner.get(collection, key).await
    }

    async fn fetch(
        &self,
        collection: &str,
        query: &FetchQuery,
        options: &FetchOptions,
    ) -> StoreResult<FetchResponse> {
        self.check(collection)?;
        self.inner.fetch(collection, query, options).await
    }

    async fn update(&self, collection: &str, updates: Document, key: &str) -> StoreResult<()> {
        self.check(collection)?;
        self.inner.update(collection, updates, key).await
    }

    async fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.check(collection)?;
        self.inner.delete(collection, key).await
    }
}

pub fn fee_entry(fee_type: &str, session: &[u32]) -> Value {
    json!({
        "feeType": fee_type,
        "amount": 1500.0,
        "isInstallment": false,
        "dtDay": 1,
        "dtMonth": 4,
        "dtYear": 2024,
        "classId": "c5",
        "className": "5A",
        "sec": "A",
        "session": session,
        "sessionYear": 2024,
        "isSync": false,
        "isActive": true
    })
}

pub fn enrollment(login_id: &str, name: &str, tuition_sessions: &[u32]) -> EnrollStudentRequest {
    serde_json::from_value(json!({
        "studentInfo": {
            "stdLoginId": login_id,
            "name": name,
            "className": "5A",
            "classId": "c5",
            "section": "A",
            "rollNo": 7,
            "doa": "2024-04-01",
            "password": "secret1",
            "isSync": false,
            "isActive": true
        },
        "studentMoreInfo": {
            "medium": "English",
            "secondLang": "Hindi",
            "dob": "2015-06-12",
            "fatherName": "R. Kumar",
            "motherName": "S. Kumar",
            "lgName": "",
            "contact1": "9800000000",
            "address1": "12 Park Street",
            "isSync": false,
            "isActive": true
        },
        "studentAdmissionFeeInfo": fee_entry("admissionFee", &[1]),
        "studentTuitionFeeInfo": fee_entry("tuitionFee", tuition_sessions)
    }))
    .expect("valid enrollment payload")
}

pub fn account_entry(student_id: &str, fee_type: &str, session: &[u32]) -> AccountEntry {
    let mut value = fee_entry(fee_type, session);
    value["studentId"] = json!(student_id);
    value["stdName"] = json!("Asha");
    serde_json::from_value(value).expect("valid account entry")
}
