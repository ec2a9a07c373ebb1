use thiserror::Error;

/// Failures surfaced by the alert store. `Connection` is kept separate from
/// the rest so callers can print setup guidance instead of a generic
/// failure; per-record decode problems never reach this type.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cannot reach the alert store: {source}. Check that Postgres is running and DATABASE_URL points at it")]
    Connection {
        #[source]
        source: sqlx::Error,
    },

    #[error("alert not found: {id}")]
    NotFound { id: String },

    #[error("alert store returned a malformed record payload: {detail}")]
    Malformed { detail: String },

    #[error("alert store query failed: {source}")]
    Backend {
        #[from]
        source: sqlx::Error,
    },
}

impl StoreError {
    /// Classify a sqlx failure, splitting unreachable-service conditions out
    /// of generic backend errors.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Connection { source: err }
            }
            other => StoreError::Backend { source: other },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_classify_as_connection() {
        let err = StoreError::from_sqlx(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        )));
        assert!(matches!(err, StoreError::Connection { .. }));
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn row_not_found_classifies_as_backend() {
        let err = StoreError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend { .. }));
    }

    #[test]
    fn not_found_names_the_id() {
        let err = StoreError::NotFound {
            id: "a-42".to_string(),
        };
        assert_eq!(err.to_string(), "alert not found: a-42");
    }
}
