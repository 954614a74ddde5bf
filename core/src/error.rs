// order_uow/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UowError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("invalid identifier for '{field}': '{value}'. Source: {source}")]
    InvalidIdentifier {
        field: &'static str,
        value: String,
        #[source]
        source: uuid::Error,
    },

    #[error("foreign key violation on {table}.{column}: no row with id {value}")]
    ForeignKeyViolation {
        table: &'static str,
        column: &'static str,
        value: Uuid,
    },

    #[error("null value in column {table}.{column} violates not-null constraint")]
    NotNullViolation {
        table: &'static str,
        column: &'static str,
    },

    #[error("duplicate id {id} in table {table}")]
    UniqueViolation { table: &'static str, id: Uuid },

    #[error("cannot delete {table} row {id}: {dependents} dependent row(s) still reference it")]
    RestrictedDelete {
        table: &'static str,
        id: Uuid,
        dependents: usize,
    },

    #[error("storage engine failure. Source: {source}")]
    Storage {
        #[source]
        source: AnyhowError,
    },
}

impl UowError {
    /// True for errors raised by a constraint check rather than by the engine itself.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            UowError::ForeignKeyViolation { .. }
                | UowError::NotNullViolation { .. }
                | UowError::UniqueViolation { .. }
                | UowError::RestrictedDelete { .. }
        )
    }
}

impl From<AnyhowError> for UowError {
    fn from(err: AnyhowError) -> Self {
        // Unwrap a UowError that was boxed into anyhow on the way up.
        match err.downcast::<UowError>() {
            Ok(uow_err) => uow_err,
            Err(err) => UowError::Storage { source: err },
        }
    }
}

pub type UowResult<T, E = UowError> = std::result::Result<T, E>;
