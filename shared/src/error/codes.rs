//! Unified error codes for the catalog sync service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Source store errors
//! - 3xxx: Ad catalog errors
//! - 4xxx: Webhook errors
//! - 5xxx: Database errors
//! - 6xxx: Feed errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the operator dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required configuration missing
    ConfigMissing = 6,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Session has expired
    SessionExpired = 1003,
    /// Session token is invalid
    SessionInvalid = 1004,

    // ==================== 2xxx: Source store ====================
    /// Source store request failed at the transport level
    SourceRequestFailed = 2001,
    /// Source store returned a non-success status
    SourceApiError = 2002,
    /// Source store response could not be decoded
    SourceDecodeFailed = 2003,
    /// Product not found in the source store
    ProductNotFound = 2004,

    // ==================== 3xxx: Ad catalog ====================
    /// Catalog id or access token not configured
    CatalogConfigMissing = 3001,
    /// Catalog request failed at the transport level
    CatalogRequestFailed = 3002,
    /// Catalog API returned an error object
    CatalogApiError = 3003,
    /// Catalog response could not be decoded
    CatalogDecodeFailed = 3004,
    /// Batch exceeds the maximum request count
    BatchTooLarge = 3005,

    // ==================== 4xxx: Webhook ====================
    /// Webhook topic header missing
    WebhookTopicMissing = 4001,
    /// Webhook source host does not match the configured store
    WebhookSourceMismatch = 4002,
    /// Webhook signature verification failed
    WebhookSignatureInvalid = 4003,
    /// Webhook payload is not valid JSON
    WebhookPayloadInvalid = 4004,
    /// Event record not found
    EventNotFound = 4005,

    // ==================== 5xxx: Database ====================
    /// Database operation failed
    DatabaseError = 5001,
    /// Schema migration failed
    MigrationFailed = 5002,

    // ==================== 6xxx: Feed ====================
    /// CSV feed could not be written
    FeedWriteFailed = 6001,
    /// CSV serialization failed
    CsvError = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Network error
    NetworkError = 9002,
    /// Operation timed out
    TimeoutError = 9003,
    /// Filesystem I/O error
    IoError = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::ConfigMissing => "Required configuration missing",

            Self::NotAuthenticated => "Not authenticated",
            Self::InvalidCredentials => "Invalid username or password",
            Self::SessionExpired => "Session has expired",
            Self::SessionInvalid => "Session token is invalid",

            Self::SourceRequestFailed => "Source store request failed",
            Self::SourceApiError => "Source store returned an error",
            Self::SourceDecodeFailed => "Source store response could not be decoded",
            Self::ProductNotFound => "Product not found",

            Self::CatalogConfigMissing => "Catalog id or access token not configured",
            Self::CatalogRequestFailed => "Catalog request failed",
            Self::CatalogApiError => "Catalog API returned an error",
            Self::CatalogDecodeFailed => "Catalog response could not be decoded",
            Self::BatchTooLarge => "Batch exceeds the maximum request count",

            Self::WebhookTopicMissing => "Webhook topic header missing",
            Self::WebhookSourceMismatch => "Webhook source host mismatch",
            Self::WebhookSignatureInvalid => "Webhook signature verification failed",
            Self::WebhookPayloadInvalid => "Webhook payload is not valid JSON",
            Self::EventNotFound => "Event record not found",

            Self::DatabaseError => "Database error",
            Self::MigrationFailed => "Schema migration failed",

            Self::FeedWriteFailed => "Feed could not be written",
            Self::CsvError => "CSV serialization failed",

            Self::InternalError => "Internal server error",
            Self::NetworkError => "Network error",
            Self::TimeoutError => "Operation timed out",
            Self::IoError => "I/O error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.message())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            6 => Self::ConfigMissing,

            1001 => Self::NotAuthenticated,
            1002 => Self::InvalidCredentials,
            1003 => Self::SessionExpired,
            1004 => Self::SessionInvalid,

            2001 => Self::SourceRequestFailed,
            2002 => Self::SourceApiError,
            2003 => Self::SourceDecodeFailed,
            2004 => Self::ProductNotFound,

            3001 => Self::CatalogConfigMissing,
            3002 => Self::CatalogRequestFailed,
            3003 => Self::CatalogApiError,
            3004 => Self::CatalogDecodeFailed,
            3005 => Self::BatchTooLarge,

            4001 => Self::WebhookTopicMissing,
            4002 => Self::WebhookSourceMismatch,
            4003 => Self::WebhookSignatureInvalid,
            4004 => Self::WebhookPayloadInvalid,
            4005 => Self::EventNotFound,

            5001 => Self::DatabaseError,
            5002 => Self::MigrationFailed,

            6001 => Self::FeedWriteFailed,
            6002 => Self::CsvError,

            9001 => Self::InternalError,
            9002 => Self::NetworkError,
            9003 => Self::TimeoutError,
            9004 => Self::IoError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::NotAuthenticated,
            ErrorCode::SourceApiError,
            ErrorCode::CatalogApiError,
            ErrorCode::WebhookSignatureInvalid,
            ErrorCode::DatabaseError,
            ErrorCode::FeedWriteFailed,
            ErrorCode::InternalError,
        ] {
            let value: u16 = code.into();
            assert_eq!(ErrorCode::try_from(value), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code() {
        assert_eq!(ErrorCode::try_from(777), Err(InvalidErrorCode(777)));
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(
            ErrorCode::WebhookSourceMismatch.message(),
            "Webhook source host mismatch"
        );
    }
}
