use sea_orm::error::DbErr;
use serde::Serialize;

/// Unified error type for the service layer.
///
/// Every operation surfaces one of these variants with enough context for
/// the caller to decide whether to retry or escalate. Errors raised inside
/// a transaction abort the whole transaction; nothing is retried here.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Already assigned: {0}")]
    AlreadyAssigned(String),

    #[error("Duplicate process: {0}")]
    DuplicateProcess(String),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Insufficient personal stock: {0}")]
    InsufficientPersonalStock(String),

    #[error("No failure redirect configured: {0}")]
    RedirectNotConfigured(String),

    #[error("No stage flow configured: {0}")]
    StageFlowNotConfigured(String),

    #[error("Unknown intake role: {0}")]
    UnknownRole(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// True for errors the caller caused and may correct (bad input, wrong
    /// state, quantity checks); false for operator/configuration and
    /// infrastructure errors.
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            Self::DatabaseError(_)
                | Self::RedirectNotConfigured(_)
                | Self::StageFlowNotConfigured(_)
                | Self::ConfigError(_)
                | Self::EventError(_)
                | Self::InternalError(_)
                | Self::Other(_)
        )
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_error_wraps_strings_and_dberr() {
        let from_str = ServiceError::db_error("boom");
        assert!(matches!(from_str, ServiceError::DatabaseError(_)));

        let from_db = ServiceError::db_error(DbErr::Custom("boom".into()));
        assert!(matches!(from_db, ServiceError::DatabaseError(_)));
    }

    #[test]
    fn caller_error_classification() {
        assert!(ServiceError::AlreadyAssigned("a".into()).is_caller_error());
        assert!(ServiceError::InsufficientStock("s".into()).is_caller_error());
        assert!(ServiceError::InvalidSession("t".into()).is_caller_error());

        assert!(!ServiceError::RedirectNotConfigured("r".into()).is_caller_error());
        assert!(!ServiceError::StageFlowNotConfigured("f".into()).is_caller_error());
        assert!(!ServiceError::db_error("db").is_caller_error());
    }

    #[test]
    fn messages_carry_context() {
        let err = ServiceError::DuplicateProcess(
            "unit PUMP/SN001 already registered today".to_string(),
        );
        assert_eq!(
            err.to_string(),
            "Duplicate process: unit PUMP/SN001 already registered today"
        );
    }
}
