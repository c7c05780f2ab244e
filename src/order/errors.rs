//! Ordering error types

use thiserror::Error;

/// Result type for ordering operations
pub type OrderResult<T> = Result<T, OrderError>;

/// No insert order satisfies the foreign keys
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Two or more distinct tables reference each other
    #[error("circular dependency between tables: {}", .0.join(", "))]
    CircularDependency(Vec<String>),
}

impl OrderError {
    /// Tables involved in the cycle, sorted by name
    pub fn tables(&self) -> &[String] {
        match self {
            OrderError::CircularDependency(tables) => tables,
        }
    }
}
