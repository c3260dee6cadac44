//! HTTP surface: JSON POST endpoints over [`LedgerService`](crate::service::LedgerService).

mod extract;
mod handlers;
mod problem;

pub use extract::JsonBody;
pub use problem::{ApiFailure, ApiResult};

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;
use handlers::*;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/test", get(healthcheck))
        .route("/insertStudent", post(insert_student))
        .route("/getStudents", post(get_students))
        .route("/getStudentMoreInfo", post(get_student_more_info))
        .route("/updateStudentBasicInfo", post(update_student_basic_info))
        .route(
            "/updateStudentBasicStatusInfo",
            post(update_student_basic_status_info),
        )
        .route("/insertStudentAccountInfo", post(insert_student_account_info))
        .route("/getStudentAccountInfo", post(get_student_account_info))
        .route(
            "/getStudentAccountInstallmentInfo",
            post(get_student_account_installment_info),
        )
        .route(
            "/updateStudentAccountStatusInfo",
            post(update_student_account_status_info),
        )
        .route("/deleteStudentAccountInfo", post(delete_student_account_info))
        .route(
            "/getStudentCollectionReport",
            post(get_student_collection_report),
        )
        .route("/getStudentCollectionInfo", post(get_student_collection_info))
        .route(
            "/getAccountTransactionDetails",
            post(get_account_transaction_details),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS]),
        )
        .with_state(state)
}
