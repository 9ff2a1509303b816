use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Open key-value detail attached to conflict errors, e.g. the product that
/// ran out of stock and how many units are left.
pub type ErrorContext = BTreeMap<String, serde_json::Value>;

pub fn error_context<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> ErrorContext {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenericResponse<D> {
    pub status: bool,
    pub customer_message: String,
    pub code: String,
    pub data: Option<D>,
}

impl<D> GenericResponse<D> {
    pub fn success(message: &str, data: Option<D>) -> Self {
        Self {
            status: true,
            customer_message: String::from(message),
            code: String::from("200"),
            data,
        }
    }

    pub fn error(message: &str, code: &str, data: Option<D>) -> Self {
        Self {
            status: false,
            customer_message: String::from(message),
            code: String::from(code),
            data,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JWTClaims {
    pub sub: Uuid,
    pub exp: usize,
    pub token_type: TokenType,
}

#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy)]
pub enum CommunicationType {
    Transactional,
}

#[derive(Deserialize, Debug, Clone, ToSchema, utoipa::IntoParams)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page.unwrap_or(1).max(1) - 1) * self.limit()
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Implements `FromRequest` for a JSON request body so that malformed
/// payloads surface as `GenericError::ValidationError`.
#[macro_export]
macro_rules! impl_json_request {
    ($request_type:ty) => {
        impl actix_web::FromRequest for $request_type {
            type Error = $crate::errors::GenericError;
            type Future = futures::future::LocalBoxFuture<'static, Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                payload: &mut actix_web::dev::Payload,
            ) -> Self::Future {
                let fut = <actix_web::web::Json<Self> as actix_web::FromRequest>::from_request(
                    req, payload,
                );

                Box::pin(async move {
                    match fut.await {
                        Ok(json) => Ok(json.into_inner()),
                        Err(e) => Err($crate::errors::GenericError::ValidationError(e.to_string())),
                    }
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::PaginationQuery;

    #[test]
    fn test_pagination_defaults_and_bounds() {
        let query = PaginationQuery {
            page: None,
            limit: None,
        };
        assert_eq!(query.limit(), 20);
        assert_eq!(query.offset(), 0);

        let query = PaginationQuery {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(query.limit(), 100);
        assert_eq!(query.offset(), 200);

        let query = PaginationQuery {
            page: Some(0),
            limit: Some(0),
        };
        assert_eq!(query.limit(), 1);
        assert_eq!(query.offset(), 0);
    }
}
