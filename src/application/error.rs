use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{domain::error::DomainError, infra::error::InfraError};

use super::render::RenderError;

/// Diagnostic chain attached to error responses so the logging middleware can
/// report what went wrong without exposing it to clients.
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

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("{0}")]
    Access(&'static str),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Short text for the person at the counter.
    pub fn presentation_message(&self) -> String {
        match self {
            AppError::Render(err) => err.user_message(),
            AppError::Access(message) => (*message).to_string(),
            AppError::Domain(err) => err.to_string(),
            AppError::Validation(message) => message.clone(),
            AppError::Infra(InfraError::Settings(_)) => "Tool misconfigured".to_string(),
            AppError::Infra(InfraError::Logging(_)) => {
                "Logging subsystem could not start".to_string()
            }
            AppError::Infra(InfraError::ReadFile { path, .. }) => {
                format!("Could not read {}.", path.display())
            }
            AppError::Infra(InfraError::Listen { addr, .. }) => {
                format!("Could not listen on {addr}.")
            }
            AppError::Infra(InfraError::RenderClient(_)) => {
                "Render service client could not start".to_string()
            }
            AppError::Unexpected(_) => super::render::GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
