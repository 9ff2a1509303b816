use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::schemas::{ErrorContext, GenericResponse};
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum CustomJWTTokenError {
    #[error("Token expired")]
    Expired,
    #[error("{0}")]
    Invalid(String),
}

impl std::fmt::Debug for CustomJWTTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Crate wide HTTP error. Every handler returns this, domain errors convert
/// into it through `From`.
#[allow(clippy::enum_variant_names)]
#[derive(thiserror::Error)]
pub enum GenericError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    ConflictError(String, ErrorContext),
    #[error("{0}")]
    DataNotFound(String),
    #[error("{0}")]
    InvalidJWT(String),
    #[error("{0}")]
    InsufficientPrivilegeError(String),
    #[error("{0}")]
    SerializationError(String),
    #[error("{0}")]
    DatabaseError(String, #[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
    #[error("{0}")]
    UnexpectedCustomError(String),
}

impl std::fmt::Debug for GenericError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl GenericError {
    pub fn conflict(message: impl Into<String>) -> Self {
        GenericError::ConflictError(message.into(), ErrorContext::new())
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GenericError::ConflictError(_, context) if !context.is_empty() => Some(context),
            _ => None,
        }
    }
}

impl ResponseError for GenericError {
    fn status_code(&self) -> StatusCode {
        match self {
            GenericError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GenericError::ConflictError(_, _) => StatusCode::CONFLICT,
            GenericError::DataNotFound(_) => StatusCode::NOT_FOUND,
            GenericError::InvalidJWT(_) => StatusCode::UNAUTHORIZED,
            GenericError::InsufficientPrivilegeError(_) => StatusCode::FORBIDDEN,
            GenericError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GenericError::DatabaseError(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
            GenericError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GenericError::UnexpectedCustomError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let status_code_str = status_code.as_str();
        let inner_error_msg = match self {
            GenericError::ValidationError(message)
            | GenericError::ConflictError(message, _)
            | GenericError::DataNotFound(message)
            | GenericError::InvalidJWT(message)
            | GenericError::InsufficientPrivilegeError(message)
            | GenericError::SerializationError(message)
            | GenericError::DatabaseError(message, _)
            | GenericError::UnexpectedCustomError(message) => message.to_string(),
            GenericError::UnexpectedError(error_msg) => error_msg.to_string(),
        };

        HttpResponse::build(status_code).json(GenericResponse::error(
            &inner_error_msg,
            status_code_str,
            self.context().cloned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;
    use serde_json::json;

    use super::GenericError;
    use crate::schemas::error_context;

    #[test]
    fn test_error_kinds_map_to_status_codes() {
        assert_eq!(
            GenericError::ValidationError("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GenericError::conflict("taken").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GenericError::DataNotFound("gone".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GenericError::UnexpectedError(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_context_is_exposed() {
        let error = GenericError::ConflictError(
            "Serum only has 1 in stock".into(),
            error_context([("available", json!(1))]),
        );
        let context = error.context().unwrap();
        assert_eq!(context.get("available"), Some(&json!(1)));
        assert!(GenericError::conflict("empty").context().is_none());
    }
}
