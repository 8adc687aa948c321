use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{
    application::repos::RepoError, cache::ResourceKind, domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Outcome of a catalog operation that did not produce a value.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{resource} not found: {detail}")]
    NotFound {
        resource: &'static str,
        detail: String,
    },
    #[error("{resource} conflict: {detail}")]
    Conflict {
        resource: &'static str,
        detail: String,
    },
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(RepoError),
}

impl CatalogError {
    pub fn missing(kind: ResourceKind, id: i64) -> Self {
        Self::NotFound {
            resource: kind.entity(),
            detail: format!("no {} with id {id}", kind.entity()),
        }
    }

    pub fn no_matches(kind: ResourceKind, term: &str) -> Self {
        Self::NotFound {
            resource: kind.entity(),
            detail: format!("no {} match `{term}`", kind.collection()),
        }
    }

    pub fn conflict(kind: ResourceKind, detail: impl Into<String>) -> Self {
        Self::Conflict {
            resource: kind.entity(),
            detail: detail.into(),
        }
    }

    /// Lifts a store error raised while writing `kind`.
    ///
    /// Unique violations become conflicts and rows that disappeared between the
    /// lookup and the write become not-found.
    pub fn from_repo(kind: ResourceKind, err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { constraint } => Self::conflict(
                kind,
                format!("unique constraint `{constraint}` would be violated"),
            ),
            RepoError::NotFound => Self::NotFound {
                resource: kind.entity(),
                detail: "row no longer exists".to_string(),
            },
            other => Self::Repo(other),
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(err: RepoError) -> Self {
        Self::Repo(err)
    }
}

/// Process-level failure surfaced by `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
