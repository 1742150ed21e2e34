use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use snafu::{IntoError as _, Location, Snafu};

use crate::database::StoreError;
use crate::model::ValidationErrors;
use crate::service::QueryError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("invalid statistic: {source}"))]
    Validation {
        source: ValidationErrors,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("malformed request body: {source}"))]
    MalformedBody {
        source: JsonRejection,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("not found"))]
    NotFound {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid page."))]
    InvalidPage {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("statistic store failure: {source}"))]
    Store {
        source: StoreError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } | ApiError::InvalidPage { .. } => StatusCode::NOT_FOUND,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Invalid { source, .. } => ValidationSnafu.into_error(source),
            error => StoreSnafu.into_error(error),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::NotFound { .. } => NotFoundSnafu.build(),
            QueryError::Store { source, .. } => source.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Detail {
    detail: String,
}

impl Detail {
    fn response(status: StatusCode, detail: impl Into<String>) -> Response {
        let detail = Detail {
            detail: detail.into(),
        };
        (status, Json(detail)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            ApiError::Validation { source, .. } => (status, Json(source)).into_response(),
            ApiError::MalformedBody { source, .. } => Detail::response(status, source.body_text()),
            ApiError::NotFound { .. } => status.into_response(),
            error @ ApiError::InvalidPage { .. } => Detail::response(status, error.to_string()),
            ApiError::Store { source, location } => {
                tracing::error!(error = %source, %location, "request failed on the statistic store");
                Detail::response(status, "A server error occurred.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_validation_becomes_a_client_error() {
        let invalid = crate::database::InvalidSnafu
            .into_error(ValidationErrors::single("likes_count", "negative"));

        let error = ApiError::from(invalid);
        assert!(matches!(error, ApiError::Validation { .. }));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn not_found_has_an_empty_body() {
        let response = ApiError::from(crate::service::NotFoundSnafu.build()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}
