//! Error types for the GameWorld service.
//!
//! Every handler failure ends up as a [`tonic::Status`]. Store errors keep
//! their classification from `gameworld-db` so constraint violations reach
//! the client with a meaningful code instead of a blanket INTERNAL.

use gameworld_core::ValidationError;
use gameworld_db::DbError;
use tonic::{Code, Status};

/// Request handling errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    /// The request is well-formed but the current state forbids it
    /// (stale version, hard delete with children).
    #[error("{0}")]
    FailedPrecondition(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }

    pub fn not_found(id: &str) -> Self {
        ServiceError::NotFound(format!("Object with ID {} not found", id))
    }

    /// The status code this error maps to.
    pub fn code(&self) -> Code {
        match self {
            ServiceError::InvalidArgument(_) => Code::InvalidArgument,
            ServiceError::NotFound(_) => Code::NotFound,
            ServiceError::FailedPrecondition(_) => Code::FailedPrecondition,
            ServiceError::Db(err) => match err {
                DbError::Validation(_) => Code::InvalidArgument,
                DbError::UniqueViolation { .. } => Code::AlreadyExists,
                DbError::ForeignKeyViolation { .. } => Code::FailedPrecondition,
                DbError::NotNullViolation { .. } => Code::InvalidArgument,
                DbError::PoolExhausted | DbError::PoolClosed => Code::Unavailable,
                _ => Code::Internal,
            },
        }
    }

    /// True for failures the caller cannot fix by changing the request.
    pub fn is_server_fault(&self) -> bool {
        matches!(self.code(), Code::Internal | Code::Unavailable)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(error: ValidationError) -> Self {
        ServiceError::InvalidArgument(error.to_string())
    }
}

impl From<ServiceError> for Status {
    fn from(error: ServiceError) -> Self {
        let code = error.code();
        let message = match &error {
            // Driver detail stays in the logs.
            ServiceError::Db(err) if code == Code::Internal => match err {
                DbError::ConnectionFailed(_) => "Database connection failed".to_string(),
                _ => "Internal database error".to_string(),
            },
            _ => error.to_string(),
        };
        Status::new(code, message)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: impl Into<ServiceError>) -> Status {
        Status::from(err.into())
    }

    #[test]
    fn test_handler_errors_map_to_codes() {
        assert_eq!(status(ServiceError::invalid("bad")).code(), Code::InvalidArgument);
        assert_eq!(status(ServiceError::not_found("abc")).code(), Code::NotFound);
        assert_eq!(
            status(ServiceError::FailedPrecondition("stale".into())).code(),
            Code::FailedPrecondition
        );
        assert_eq!(
            status(ServiceError::not_found("abc")).message(),
            "Object with ID abc not found"
        );
    }

    #[test]
    fn test_validation_is_invalid_argument() {
        let s = status(ValidationError::required("name"));
        assert_eq!(s.code(), Code::InvalidArgument);
        assert_eq!(s.message(), "name is required");

        let s = status(DbError::Validation(ValidationError::required("type")));
        assert_eq!(s.code(), Code::InvalidArgument);
    }

    #[test]
    fn test_constraint_violations_keep_their_class() {
        let unique = DbError::from_sqlstate("23505", Some("celestial_objects_pkey"), "dup");
        assert_eq!(status(unique).code(), Code::AlreadyExists);

        let fk = DbError::from_sqlstate("23503", Some("fk_parent"), "missing parent");
        assert_eq!(status(fk).code(), Code::FailedPrecondition);

        let not_null = DbError::from_sqlstate("23502", None, "null name");
        assert_eq!(status(not_null).code(), Code::InvalidArgument);
    }

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert_eq!(status(DbError::PoolExhausted).code(), Code::Unavailable);
        assert_eq!(status(DbError::PoolClosed).code(), Code::Unavailable);
        assert!(ServiceError::from(DbError::PoolExhausted).is_server_fault());
    }

    #[test]
    fn test_internal_errors_hide_driver_detail() {
        let s = status(DbError::ConnectionFailed("tcp reset by 10.0.0.5".into()));
        assert_eq!(s.code(), Code::Internal);
        assert!(!s.message().contains("10.0.0.5"));

        let s = status(DbError::Internal("secret".into()));
        assert_eq!(s.code(), Code::Internal);
        assert_eq!(s.message(), "Internal database error");
        assert!(!ServiceError::invalid("x").is_server_fault());
    }
}
