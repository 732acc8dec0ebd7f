//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Source store errors
/// - 3xxx: Ad catalog errors
/// - 4xxx: Webhook errors
/// - 5xxx: Database errors
/// - 6xxx: Feed errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Source store errors (2xxx)
    Source,
    /// Ad catalog errors (3xxx)
    Catalog,
    /// Webhook errors (4xxx)
    Webhook,
    /// Database errors (5xxx)
    Database,
    /// Feed errors (6xxx)
    Feed,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Source,
            3000..4000 => Self::Catalog,
            4000..5000 => Self::Webhook,
            5000..6000 => Self::Database,
            6000..7000 => Self::Feed,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Source => "source",
            Self::Catalog => "catalog",
            Self::Webhook => "webhook",
            Self::Database => "database",
            Self::Feed => "feed",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ranges() {
        assert_eq!(ErrorCode::NotFound.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::SessionExpired.category(), ErrorCategory::Auth);
        assert_eq!(ErrorCode::SourceApiError.category(), ErrorCategory::Source);
        assert_eq!(ErrorCode::CatalogApiError.category(), ErrorCategory::Catalog);
        assert_eq!(
            ErrorCode::WebhookSignatureInvalid.category(),
            ErrorCategory::Webhook
        );
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::Database);
        assert_eq!(ErrorCode::CsvError.category(), ErrorCategory::Feed);
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::System);
    }
}
