//! `Json`, `Path` and `Query` extractors that reject with [`AppError`].

use axum::{
    extract::{
        FromRequest, FromRequestParts,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

use pazar_core::FieldError;

use crate::error::AppError;

#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                Self::Validation(vec![FieldError::new("body", err.body_text())])
            }
            other => Self::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Missing or malformed multipart boundary.
impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Listing {
        page: u32,
    }

    #[tokio::test]
    async fn test_unknown_stock_change_is_validation_error() {
        let request = Request::patch("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"replace":4}"#))
            .unwrap();
        let err = Json::<crate::models::StockChange>::from_request(request, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_bad_query_is_bad_request() {
        let (mut parts, ()) = Request::get("/?page=first").body(()).unwrap().into_parts();
        let err = Query::<Listing>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let (mut parts, ()) = Request::get("/?page=3").body(()).unwrap().into_parts();
        let Query(listing) = Query::<Listing>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(listing.page, 3);
    }
}
