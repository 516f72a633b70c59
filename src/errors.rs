use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{error::DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "message": "Property with id 4f1c0f7e-2f43-4a4e-8d1b-3f0e9a6b2c11 was not found!"
}))]
pub struct ErrorResponse {
    /// Human-readable error description
    pub message: String,
    /// Debug rendering of the failure, only outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { fields: Vec<String>, message: String },

    #[error("{resource} with id {id} was not found!")]
    NotFound { resource: &'static str, id: String },

    #[error("{message}")]
    Conflict { fields: Vec<String>, message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Validation failure on a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            fields: vec![field.into()],
            message: message.into(),
        }
    }

    /// Validation failure that is not tied to a particular field.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Validation {
            fields: Vec::new(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// "Missing required fields: a, b" for every absent field name.
    pub fn missing_fields(fields: Vec<String>) -> Self {
        let message = format!("Missing required fields: {}", fields.join(", "));
        Self::Validation { fields, message }
    }

    pub fn conflict(fields: Vec<String>) -> Self {
        let message = if fields.is_empty() {
            "A record with the same unique value already exists.".to_string()
        } else {
            format!("A record with this {} already exists.", fields.join(", "))
        };
        Self::Conflict { fields, message }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return a generic message unless details are exposed.
    pub fn response_message(&self, expose_details: bool) -> String {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) if !expose_details => {
                "An unexpected error occurred.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Names of the offending fields for validation and conflict errors.
    pub fn fields(&self) -> &[String] {
        match self {
            Self::Validation { fields, .. } | Self::Conflict { fields, .. } => fields,
            _ => &[],
        }
    }
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(what) => ServiceError::NotFound {
                resource: "Record",
                id: what.clone(),
            },
            _ => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(detail)) => {
                    ServiceError::conflict(unique_violation_fields(&detail))
                }
                Some(SqlErr::ForeignKeyConstraintViolation(detail)) => ServiceError::Validation {
                    fields: Vec::new(),
                    message: format!("Referenced record does not exist ({})", detail),
                },
                _ => ServiceError::DatabaseError(err),
            },
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut failures: Vec<(String, String)> = err
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let reason = errors
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (snake_to_camel(field), reason)
            })
            .collect();
        failures.sort();

        let message = failures
            .iter()
            .map(|(_, reason)| reason.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        ServiceError::Validation {
            fields: failures.into_iter().map(|(field, _)| field).collect(),
            message,
        }
    }
}

/// Pulls column names out of a driver's unique-violation message.
///
/// SQLite reports `UNIQUE constraint failed: users.email, users.username`;
/// Postgres reports the constraint name, e.g. `"users_email_key"`.
fn unique_violation_fields(detail: &str) -> Vec<String> {
    if let Some((_, columns)) = detail.split_once("UNIQUE constraint failed:") {
        return columns
            .split(',')
            .filter_map(|qualified| qualified.trim().rsplit('.').next())
            .filter(|column| !column.is_empty())
            .map(snake_to_camel)
            .collect();
    }

    const KNOWN: [&str; 3] = ["username", "email", "phone_number"];
    KNOWN
        .iter()
        .filter(|column| detail.contains(*column))
        .map(|column| snake_to_camel(column))
        .collect()
}

fn snake_to_camel(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut upper = false;
    for ch in column.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let expose_details = crate::tracing::error_details_exposed();
        let request_id = crate::tracing::current_request_id();
        let request_id = request_id.as_ref().map_or("-", |id| id.as_str());

        if status.is_server_error() {
            tracing::error!(error = ?self, request_id, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), request_id, "request rejected");
        }

        let body = ErrorResponse {
            message: self.response_message(expose_details),
            stack: expose_details.then(|| format!("{:?}", self)),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::body::to_bytes;

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::not_found("Property", "p1").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::conflict(vec!["email".into()]).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::InternalError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_names_resource_and_id() {
        let err = ServiceError::not_found("Property", "abc");
        assert_eq!(err.to_string(), "Property with id abc was not found!");
    }

    #[test]
    fn missing_fields_lists_every_field() {
        let err = ServiceError::missing_fields(vec!["userId".into(), "totalPrice".into()]);
        assert_eq!(err.to_string(), "Missing required fields: userId, totalPrice");
        assert_eq!(err.fields(), ["userId".to_string(), "totalPrice".to_string()]);
    }

    #[test]
    fn internal_details_hidden_unless_exposed() {
        let err = ServiceError::InternalError("connection reset".into());
        assert_eq!(err.response_message(false), "An unexpected error occurred.");
        assert_eq!(
            err.response_message(true),
            "Internal error: connection reset"
        );

        let err = ServiceError::bad_request("Check-out date must be after check-in date.");
        assert_eq!(
            err.response_message(false),
            "Check-out date must be after check-in date."
        );
    }

    #[test]
    fn record_not_found_maps_to_not_found() {
        let err: ServiceError = DbErr::RecordNotFound("users".into()).into();
        assert_matches!(err, ServiceError::NotFound { .. });
    }

    #[test]
    fn unclassified_db_errors_stay_internal() {
        let err: ServiceError = DbErr::Custom("boom".into()).into();
        assert_matches!(err, ServiceError::DatabaseError(_));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn sqlite_unique_message_yields_camel_case_fields() {
        assert_eq!(
            unique_violation_fields("UNIQUE constraint failed: users.phone_number"),
            vec!["phoneNumber".to_string()]
        );
        assert_eq!(
            unique_violation_fields("UNIQUE constraint failed: hosts.email, hosts.username"),
            vec!["email".to_string(), "username".to_string()]
        );
    }

    #[test]
    fn postgres_unique_message_matches_known_columns() {
        assert_eq!(
            unique_violation_fields(
                "duplicate key value violates unique constraint \"users_email_key\""
            ),
            vec!["email".to_string()]
        );
    }

    #[tokio::test]
    async fn response_body_omits_stack_by_default() {
        let response = ServiceError::not_found("Booking", "b9").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["message"], "Booking with id b9 was not found!");
        assert!(payload.get("stack").is_none());
    }

    #[tokio::test]
    async fn response_body_carries_stack_when_exposed() {
        let ctx = crate::tracing::RequestContext::new("req-1", true);
        let response = crate::tracing::scope_request_context(ctx, async {
            ServiceError::InternalError("pool timed out".into()).into_response()
        })
        .await;

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["message"], "Internal error: pool timed out");
        assert!(payload["stack"].as_str().unwrap().contains("InternalError"));
    }
}
