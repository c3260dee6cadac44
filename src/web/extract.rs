use axum::extract::FromRequest;

use super::problem::ApiFailure;

/// `Json` extractor whose rejections render as the failure body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiFailure))]
pub struct JsonBody<T>(pub T);
