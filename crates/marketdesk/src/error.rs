use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use marketdesk_models::params::TickerError;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

/// Errors a route handler can answer with. Bodies always carry `error`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 400 with optional extra fields such as `validTypes`.
    #[error("{message}")]
    BadRequest {
        message: String,
        fields: Map<String, Value>,
    },

    #[error("Not found")]
    NotFound,

    /// 500 with `{error, details}`.
    #[error("{message}: {details}")]
    Internal { message: String, details: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn not_found() -> Self {
        ApiError::NotFound
    }

    pub fn internal(message: impl Into<String>, details: impl ToString) -> Self {
        ApiError::Internal {
            message: message.into(),
            details: details.to_string(),
        }
    }

    /// Attach an extra field to a 400 body. No-op for other variants.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let ApiError::BadRequest { fields, .. } = &mut self {
            fields.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest { message, mut fields } => {
                fields.insert("error".to_string(), Value::String(message));
                fields
            }
            ApiError::NotFound => {
                let mut body = Map::new();
                body.insert("error".to_string(), Value::String("Not found".to_string()));
                body
            }
            ApiError::Internal { message, details } => {
                error!(error = %message, %details, "Request failed");
                let mut body = Map::new();
                body.insert("error".to_string(), Value::String(message));
                body.insert("details".to_string(), Value::String(details));
                body
            }
        };
        (status, Json(Value::Object(body))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Invalid JSON body").with_field("details", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("Invalid query parameters").with_field("details", rejection.body_text())
    }
}

impl From<TickerError> for ApiError {
    fn from(e: TickerError) -> Self {
        match e {
            TickerError::Missing => ApiError::bad_request("Missing required parameter: ticker"),
            TickerError::Invalid(_) => ApiError::bad_request(e.to_string()),
        }
    }
}
