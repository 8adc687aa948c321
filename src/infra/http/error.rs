use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::{CatalogError, ErrorReport};
use crate::application::repos::RepoError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const CONFLICT: &str = "conflict";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { detail, .. } => ApiError::new(
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                "Resource not found",
                Some(detail),
            ),
            CatalogError::Conflict { detail, .. } => ApiError::new(
                StatusCode::CONFLICT,
                codes::CONFLICT,
                "Resource conflict",
                Some(detail),
            ),
            CatalogError::Validation(err) => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid input",
                Some(err.to_string()),
            ),
            CatalogError::Repo(err) => repo_to_api(err),
        }
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::CONFLICT,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOT_FOUND,
            "Resource not found",
            None,
        ),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let hint = self.hint.clone();
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Picked up by the response logging middleware.
        ErrorReport::from_message(
            "infra::http::error",
            self.status,
            format!("{}: {}", self.code, hint.as_deref().unwrap_or(self.message)),
        )
        .attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::ResourceKind;
    use crate::domain::error::DomainError;

    use super::*;

    #[test]
    fn catalog_errors_map_to_statuses() {
        let cases = [
            (CatalogError::missing(ResourceKind::Product, 9), StatusCode::NOT_FOUND),
            (
                CatalogError::conflict(ResourceKind::Category, "name taken"),
                StatusCode::CONFLICT,
            ),
            (
                CatalogError::Validation(DomainError::validation("stock", "negative")),
                StatusCode::BAD_REQUEST,
            ),
            (CatalogError::Repo(RepoError::Timeout), StatusCode::SERVICE_UNAVAILABLE),
            (
                CatalogError::Repo(RepoError::from_persistence("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn response_carries_error_report() {
        let response =
            ApiError::from(CatalogError::missing(ResourceKind::Variant, 3)).into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.status, StatusCode::NOT_FOUND);
        assert!(report.messages[0].starts_with("not_found"));
    }
}
