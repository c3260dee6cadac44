use axum::{Json, extract::State, http::StatusCode};

use super::extract::JsonBody;
use super::problem::ApiResult;
use crate::core::Document;
use crate::query::{CollectionReport, FilteredPage, ListingPage};
use crate::records::AccountEntry;
use crate::service::dto::{
    AccountReceipt, AccountStatusRequest, Acknowledgement, CollectionReportRequest,
    DeleteAccountRequest, EnrollStudentRequest, EnrollmentReceipt, InstallmentGroupRequest,
    ListAccountEntriesRequest, ListStudentsRequest, StatusChangeRequest, StudentCollectionRequest,
    StudentDetailsRequest, TransactionDetailsRequest, TransactionPage,
    UpdateStudentProfileRequest,
};
use crate::state::AppState;

fn listing(items: Vec<Document>) -> ListingPage {
    ListingPage {
        count: items.len(),
        items,
        ..ListingPage::default()
    }
}

pub async fn healthcheck() -> Json<Acknowledgement> {
    Json(Acknowledgement::ok())
}

pub async fn insert_student(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<EnrollStudentRequest>,
) -> ApiResult<(StatusCode, Json<EnrollmentReceipt>)> {
    let receipt = state.ledger.enroll_student(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get_students(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ListStudentsRequest>,
) -> ApiResult<Json<ListingPage>> {
    Ok(Json(state.ledger.list_students(request).await?))
}

pub async fn get_student_more_info(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<StudentDetailsRequest>,
) -> ApiResult<Json<ListingPage>> {
    let details = state.ledger.student_details(request).await?;
    Ok(Json(listing(details)))
}

pub async fn update_student_basic_info(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdateStudentProfileRequest>,
) -> ApiResult<Json<Acknowledgement>> {
    state.ledger.update_student_profile(request).await?;
    Ok(Json(Acknowledgement::ok()))
}

pub async fn update_student_basic_status_info(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<StatusChangeRequest>,
) -> ApiResult<Json<Acknowledgement>> {
    state.ledger.set_student_active(request).await?;
    Ok(Json(Acknowledgement::ok()))
}

pub async fn insert_student_account_info(
    State(state): State<AppState>,
    JsonBody(entry): JsonBody<AccountEntry>,
) -> ApiResult<(StatusCode, Json<AccountReceipt>)> {
    let receipt = state.ledger.record_account_entry(entry).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get_student_account_info(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ListAccountEntriesRequest>,
) -> ApiResult<Json<ListingPage>> {
    Ok(Json(state.ledger.list_account_entries(request).await?))
}

pub async fn get_student_account_installment_info(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<InstallmentGroupRequest>,
) -> ApiResult<Json<ListingPage>> {
    let group = state.ledger.installment_group(request).await?;
    Ok(Json(listing(group)))
}

pub async fn update_student_account_status_info(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AccountStatusRequest>,
) -> ApiResult<Json<Acknowledgement>> {
    state.ledger.set_account_status(request).await?;
    Ok(Json(Acknowledgement::ok()))
}

pub async fn delete_student_account_info(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<DeleteAccountRequest>,
) -> ApiResult<Json<Acknowledgement>> {
    state.ledger.delete_account_entry(request).await?;
    Ok(Json(Acknowledgement::ok()))
}

pub async fn get_student_collection_report(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CollectionReportRequest>,
) -> ApiResult<Json<CollectionReport>> {
    Ok(Json(state.ledger.collection_report(request).await?))
}

pub async fn get_student_collection_info(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<StudentCollectionRequest>,
) -> ApiResult<Json<FilteredPage>> {
    Ok(Json(state.ledger.student_collection_page(request).await?))
}

pub async fn get_account_transaction_details(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TransactionDetailsRequest>,
) -> ApiResult<Json<TransactionPage>> {
    Ok(Json(state.ledger.transaction_details(request).await?))
}
