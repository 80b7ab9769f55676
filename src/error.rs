use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    InternalServerError(String),
    ValidationError(String),
    DatabaseError(sqlx::Error),
    AuthError(String),
    /// Fatal failure while fetching, aggregating or rendering a report.
    /// The detail is logged, never sent to the client.
    ReportGeneration(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::DatabaseError(err) => write!(f, "Database Error: {}", err),
            ApiError::AuthError(msg) => write!(f, "Auth Error: {}", msg),
            ApiError::ReportGeneration(msg) => write!(f, "Report generation failed: {}", msg),
        }
    }
}

impl ApiError {
    /// Message shown to the client. Report failures collapse to a generic text.
    fn public_message(&self) -> String {
        match self {
            ApiError::ReportGeneration(_) => "Report generation failed".to_string(),
            ApiError::DatabaseError(_) => "Database Error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            success: false,
            message: self.public_message(),
        };

        match self {
            ApiError::BadRequest(_) => HttpResponse::BadRequest().json(error_response),
            ApiError::NotFound(_) => HttpResponse::NotFound().json(error_response),
            ApiError::Unauthorized(_) => HttpResponse::Unauthorized().json(error_response),
            ApiError::Forbidden(_) => HttpResponse::Forbidden().json(error_response),
            ApiError::ValidationError(_) => HttpResponse::UnprocessableEntity().json(error_response),
            ApiError::DatabaseError(_) => HttpResponse::InternalServerError().json(error_response),
            ApiError::AuthError(_) => HttpResponse::Unauthorized().json(error_response),
            ApiError::InternalServerError(_) => HttpResponse::InternalServerError().json(error_response),
            ApiError::ReportGeneration(_) => HttpResponse::InternalServerError().json(error_response),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<lopdf::Error> for ApiError {
    fn from(err: lopdf::Error) -> Self {
        ApiError::ReportGeneration(format!("pdf: {}", err))
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::ReportGeneration(format!("csv: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::ReportGeneration(format!("io: {}", err))
    }
}

// Ошибки, специфичные для отчётов
impl ApiError {
    pub fn unknown_report_kind(kind: &str) -> Self {
        ApiError::NotFound(format!("Report '{}' does not exist", kind))
    }

    pub fn invalid_date_range(from: &str, to: &str) -> Self {
        ApiError::ValidationError(format!("date_from ({}) must not be after date_to ({})", from, to))
    }

    pub fn invalid_date(field: &str, value: &str) -> Self {
        ApiError::BadRequest(format!("Invalid {} '{}', expected YYYY-MM-DD", field, value))
    }

    /// Wraps any failure of the fetch/aggregate/render pipeline.
    pub fn report_failed(err: impl fmt::Display) -> Self {
        ApiError::ReportGeneration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;
    use actix_web::http::StatusCode;

    #[test]
    fn test_report_generation_hides_detail() {
        let err = ApiError::report_failed("connection reset by peer");
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().try_into_bytes().unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Report generation failed"));
        assert!(!text.contains("connection reset"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::unknown_report_kind("x").error_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::invalid_date_range("2024-02-01", "2024-01-01").error_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::invalid_date("date_from", "x").error_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::AuthError("t".into()).error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
