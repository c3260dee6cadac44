mod common;

use common::{FlakyStore, account_entry, enrollment, ledger, test_config};
use feeledger::core::{Collection, LedgerError};
use feeledger::records::AccountEntry;
use feeledger::service::dto::{
    AccountStatusRequest, DeleteAccountRequest, InstallmentGroupRequest, ListStudentsRequest,
    StatusChangeRequest, StudentCollectionRequest, StudentDetailPatch, StudentPatch,
    TransactionDetailsRequest, TransactionPage, UpdateStudentProfileRequest,
};
use feeledger::storage::{
    DocumentStore, FetchOptions, FetchQuery, Filter, MemoryDocumentStore, StoreError,
};
use feeledger::LedgerService;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

async fn collection_info(store: &MemoryDocumentStore, student_id: &str) -> Value {
    let response = store
        .fetch(
            "collections",
            &FetchQuery::from(Filter::new().eq("studentId", student_id)),
            &FetchOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(response.items.len(), 1, "one collection record per session year");
    response.items[0]["collectionInfo"].clone()
}

fn status(key_id: &str, is_active: bool) -> AccountStatusRequest {
    AccountStatusRequest {
        key_id: key_id.to_string(),
        is_active,
        is_main_installment: true,
    }
}

fn deletion(key_id: &str) -> DeleteAccountRequest {
    DeleteAccountRequest {
        key_id: key_id.to_string(),
        is_main_installment: true,
    }
}

#[tokio::test]
async fn enrollment_writes_every_record_and_merges_paid_periods() {
    let (store, ledger) = ledger(10);

    let receipt = assert_ok!(ledger.enroll_student(enrollment("AB123456", "Asha", &[1, 2, 3])).await);

    assert_eq!(receipt.std_login_id, "AB123456");
    assert_eq!(receipt.account_keys.len(), 2);

    let student = store.get("students", &receipt.student_id).await.unwrap().unwrap();
    let hash = student["password"].as_str().unwrap();
    assert_ne!(hash, "secret1");
    assert!(bcrypt::verify("secret1", hash).unwrap());

    let details = store.get("student_details", &receipt.detail_id).await.unwrap().unwrap();
    assert_eq!(details["studentId"], json!(receipt.student_id));

    for key in &receipt.account_keys {
        let entry = store.get("accounts", key).await.unwrap().unwrap();
        assert_eq!(entry["studentId"], json!(receipt.student_id));
        assert_eq!(entry["stdName"], json!("Asha"));
    }

    assert_eq!(
        collection_info(&store, &receipt.student_id).await,
        json!({"admissionFee": [1], "tuitionFee": [1, 2, 3]})
    );
}

#[tokio::test]
async fn second_enrollment_with_the_same_login_id_is_advanced() {
    let (_, ledger) = ledger(10);
    assert_ok!(ledger.enroll_student(enrollment("AB123456", "Asha", &[1])).await);

    let receipt = assert_ok!(ledger.enroll_student(enrollment("AB123456", "Ravi", &[1])).await);

    assert_eq!(receipt.std_login_id, "AB123459");
}

#[tokio::test]
async fn short_login_id_is_rejected_before_any_write() {
    let (store, ledger) = ledger(10);

    let err = assert_err!(ledger.enroll_student(enrollment("AB1234", "Asha", &[1])).await);

    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(store.len("students").await, 0);
}

#[tokio::test]
async fn account_status_round_trip_keeps_collection_info_in_step() {
    let (store, ledger) = ledger(10);
    let student = ledger
        .enroll_student(enrollment("AB123456", "Asha", &[1, 2, 3]))
        .await
        .unwrap();

    let receipt = assert_ok!(
        ledger
            .record_account_entry(account_entry(&student.student_id, "tuitionFee", &[4, 5]))
            .await
    );
    assert_eq!(
        collection_info(&store, &student.student_id).await,
        json!({"admissionFee": [1], "tuitionFee": [1, 2, 3, 4, 5]})
    );

    assert_ok!(ledger.set_account_status(status(&receipt.key, false)).await);
    assert_eq!(
        collection_info(&store, &student.student_id).await,
        json!({"admissionFee": [1], "tuitionFee": [1, 2, 3]})
    );

    assert_ok!(ledger.set_account_status(status(&receipt.key, true)).await);
    assert_ok!(ledger.set_account_status(status(&receipt.key, true)).await);
    assert_eq!(
        collection_info(&store, &student.student_id).await,
        json!({"admissionFee": [1], "tuitionFee": [1, 2, 3, 4, 5]})
    );
}

#[tokio::test]
async fn first_standalone_payment_creates_the_collection_record() {
    let (store, ledger) = ledger(10);

    assert_ok!(
        ledger
            .record_account_entry(account_entry("student42", "busFee", &[2, 1]))
            .await
    );

    assert_eq!(
        collection_info(&store, "student42").await,
        json!({"busFee": [2, 1]})
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_payments_share_one_collection_record() {
    let (store, ledger) = ledger(10);
    let ledger = Arc::new(ledger);

    let payments: Vec<_> = (1..=4u32)
        .map(|period| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                ledger
                    .record_account_entry(account_entry("student7", "tuitionFee", &[period]))
                    .await
            })
        })
        .collect();
    for payment in payments {
        assert_ok!(payment.await.unwrap());
    }

    assert_eq!(store.len("collections").await, 1);
    let mut periods: Vec<u64> = collection_info(&store, "student7").await["tuitionFee"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_u64)
        .collect();
    periods.sort_unstable();
    assert_eq!(periods, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn unknown_account_entry_is_not_found() {
    let (_, ledger) = ledger(10);

    let err = assert_err!(ledger.set_account_status(status("HJHFJGIE-missing", false)).await);
    assert!(matches!(err, LedgerError::NotFound(_)));

    let err = assert_err!(ledger.delete_account_entry(deletion("HJHFJGIE-missing")).await);
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn only_inactive_entries_can_be_deleted() {
    let (store, ledger) = ledger(10);
    let receipt = ledger
        .record_account_entry(account_entry("student42", "busFee", &[1]))
        .await
        .unwrap();

    let err = assert_err!(ledger.delete_account_entry(deletion(&receipt.key)).await);
    assert!(matches!(err, LedgerError::InvalidState(_)));

    ledger.set_account_status(status(&receipt.key, false)).await.unwrap();
    assert_ok!(ledger.delete_account_entry(deletion(&receipt.key)).await);
    assert_eq!(store.get("accounts", &receipt.key).await.unwrap(), None);
}

#[tokio::test]
async fn principal_status_and_deletion_cascade_over_installments() {
    let (store, ledger) = ledger(10);
    let principal = ledger
        .record_account_entry(account_entry("student42", "tuitionFee", &[6]))
        .await
        .unwrap();

    let mut installment: AccountEntry = account_entry("student42", "tuitionFee", &[6]);
    installment.is_installment = true;
    installment.installment_id = principal.key.clone();
    installment.amount = 500.0;
    let installment = ledger.record_account_entry(installment).await.unwrap();
    assert_eq!(
        collection_info(&store, "student42").await["tuitionFee"],
        json!([6]),
        "installment rows do not touch the collection record"
    );

    let group = ledger
        .installment_group(InstallmentGroupRequest {
            installment_id: principal.key.clone(),
            is_active: true,
        })
        .await
        .unwrap();
    let keys: Vec<&str> = group.iter().filter_map(|row| row["key"].as_str()).collect();
    assert_eq!(keys, vec![installment.key.as_str(), principal.key.as_str()]);

    ledger.set_account_status(status(&principal.key, false)).await.unwrap();
    let row = store.get("accounts", &installment.key).await.unwrap().unwrap();
    assert_eq!(row["isActive"], json!(false));
    assert_eq!(
        collection_info(&store, "student42").await["tuitionFee"],
        json!([])
    );

    assert_ok!(ledger.delete_account_entry(deletion(&principal.key)).await);
    assert_eq!(store.len("accounts").await, 0);
}

#[tokio::test]
async fn profile_update_needs_at_least_one_field() {
    let (_, ledger) = ledger(10);

    let err = assert_err!(
        ledger
            .update_student_profile(UpdateStudentProfileRequest {
                student_info_key: "abcdef123456".into(),
                ..Default::default()
            })
            .await
    );

    assert!(matches!(err, LedgerError::NoFieldsToUpdate));
}

#[tokio::test]
async fn class_change_is_mirrored_to_the_collection_record() {
    let (store, ledger) = ledger(10);
    let student = ledger
        .enroll_student(enrollment("AB123456", "Asha", &[1]))
        .await
        .unwrap();

    assert_ok!(
        ledger
            .update_student_profile(UpdateStudentProfileRequest {
                student_info_key: student.student_id.clone(),
                student_info: StudentPatch {
                    class_name: Some("6A".into()),
                    section: Some("B".into()),
                    ..Default::default()
                },
                ..Default::default()
            })
            .await
    );

    let record = store.get("students", &student.student_id).await.unwrap().unwrap();
    assert_eq!(record["className"], json!("6A"));
    assert_eq!(record["section"], json!("B"));

    let rows = store
        .fetch(
            "collections",
            &FetchQuery::from(Filter::new().eq("studentId", student.student_id.as_str())),
            &FetchOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(rows.items[0]["className"], json!("6A"));
    assert_eq!(rows.items[0]["sec"], json!("B"));
}

#[tokio::test]
async fn failed_profile_writes_are_aggregated() {
    let (_, ledger) = ledger(10);

    let err = assert_err!(
        ledger
            .update_student_profile(UpdateStudentProfileRequest {
                student_info_key: "nosuchstudent".into(),
                student_info: StudentPatch {
                    name: Some("Asha K".into()),
                    ..Default::default()
                },
                ..Default::default()
            })
            .await
    );

    match err {
        LedgerError::MultiWrite {
            collection,
            messages,
        } => {
            assert_eq!(collection, Collection::Students);
            assert_eq!(messages.len(), 1);
        }
        other => panic!("expected aggregated write failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unusable_login_id_rejects_the_profile_update_before_any_write() {
    let (store, ledger) = ledger(10);
    let student = ledger
        .enroll_student(enrollment("AB123456", "Asha", &[1]))
        .await
        .unwrap();

    let err = assert_err!(
        ledger
            .update_student_profile(UpdateStudentProfileRequest {
                student_info_key: student.student_id.clone(),
                student_info: StudentPatch {
                    std_login_id: Some("ABCDEFGH".into()),
                    ..Default::default()
                },
                student_more_info_key: student.detail_id.clone(),
                student_more_info: StudentDetailPatch {
                    father_name: Some("M. Kumar".into()),
                    ..Default::default()
                },
            })
            .await
    );

    assert!(matches!(err, LedgerError::Validation(_)));
    let details = store.get("student_details", &student.detail_id).await.unwrap().unwrap();
    assert_eq!(details["fatherName"], json!("R. Kumar"));
}

#[tokio::test]
async fn deactivating_an_unknown_student_is_not_found() {
    let (_, ledger) = ledger(10);

    let err = assert_err!(
        ledger
            .set_student_active(StatusChangeRequest {
                key_id: "abcdef123456".into(),
                is_active: false,
            })
            .await
    );

    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn student_listing_hides_passwords_and_offers_a_total() {
    let (_, ledger) = ledger(10);
    ledger.enroll_student(enrollment("AB123456", "Asha", &[1])).await.unwrap();
    ledger.enroll_student(enrollment("CD654321", "Ravi", &[1])).await.unwrap();

    let page = assert_ok!(
        ledger
            .list_students(ListStudentsRequest {
                is_active: true,
                limit: 10,
                ..Default::default()
            })
            .await
    );

    assert_eq!(page.count, 2);
    assert_eq!(page.total_count, Some(2));
    assert!(page.items.iter().all(|row| !row.contains_key("password")));

    let searched = ledger
        .list_students(ListStudentsRequest {
            is_active: true,
            limit: 10,
            name: "Rav".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.count, 1);
    assert_eq!(searched.total_count, None);
}

#[tokio::test]
async fn collection_page_separates_paid_from_unpaid_students() {
    let (_, ledger) = ledger(1);
    let paid = ledger
        .enroll_student(enrollment("AB123456", "Asha", &[1, 2, 3]))
        .await
        .unwrap();
    let unpaid = ledger
        .enroll_student(enrollment("CD654321", "Ravi", &[1]))
        .await
        .unwrap();

    let request = |is_paid| StudentCollectionRequest {
        fee_type: "tuitionFee".into(),
        session_year: 2024,
        session: vec![1, 2],
        class_name: "5A".into(),
        is_paid,
        limit: 5,
        last: None,
    };

    let page = assert_ok!(ledger.student_collection_page(request(true)).await);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0]["studentId"], json!(paid.student_id));

    let page = assert_ok!(ledger.student_collection_page(request(false)).await);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0]["studentId"], json!(unpaid.student_id));
}

#[tokio::test]
async fn transaction_details_switch_to_filtered_pages_for_periods() {
    let (_, ledger) = ledger(10);
    ledger
        .enroll_student(enrollment("AB123456", "Asha", &[1, 2, 3]))
        .await
        .unwrap();
    ledger
        .enroll_student(enrollment("CD654321", "Ravi", &[1]))
        .await
        .unwrap();

    let filtered = ledger
        .transaction_details(TransactionDetailsRequest {
            session: vec![2],
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    match filtered {
        TransactionPage::Filtered(page) => {
            assert_eq!(page.items.len(), 1);
            assert_eq!(page.items[0]["stdName"], json!("Asha"));
        }
        other => panic!("expected a filtered page, got {other:?}"),
    }

    let listing = ledger
        .transaction_details(TransactionDetailsRequest {
            fee_type: "admissionFee".into(),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    match listing {
        TransactionPage::Listing(page) => {
            assert_eq!(page.count, 2);
            assert_eq!(page.total_count, Some(2));
        }
        other => panic!("expected a plain listing, got {other:?}"),
    }
}

#[tokio::test]
async fn partial_batch_is_reported_with_its_collection() {
    let store = Arc::new(FlakyStore {
        truncate_batches: true,
        ..FlakyStore::new()
    });
    let ledger = LedgerService::new(store, test_config());

    let err = assert_err!(ledger.enroll_student(enrollment("AB123456", "Asha", &[1])).await);

    assert!(matches!(
        err,
        LedgerError::PartialBatch {
            collection: Collection::Accounts,
            processed: 1,
            expected: 2
        }
    ));
}

#[tokio::test]
async fn store_failures_are_tagged_with_their_collection() {
    let store = Arc::new(FlakyStore {
        unavailable: Some("accounts"),
        ..FlakyStore::new()
    });
    let ledger = LedgerService::new(store, test_config());

    let err = assert_err!(ledger.enroll_student(enrollment("AB123456", "Asha", &[1])).await);

    assert_eq!(err.collection(), Some(Collection::Accounts));
    assert!(matches!(
        err,
        LedgerError::Store {
            source: StoreError::Unavailable(_),
            ..
        }
    ));
}
