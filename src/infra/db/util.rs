use crate::application::repos::RepoError;

/// Maps driver errors onto repository errors, keeping the violated constraint
/// name so callers can tell which uniqueness rule fired.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        },
        sqlx::Error::Database(db)
            if db.is_foreign_key_violation() || db.message().contains("invalid input syntax") =>
        {
            RepoError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db) if db.is_check_violation() || db.message().contains("violates") => {
            RepoError::Integrity {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to user request") =>
        {
            RepoError::Timeout
        }
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        other => RepoError::from_persistence(other),
    }
}
