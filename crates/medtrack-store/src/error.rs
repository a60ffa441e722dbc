use medtrack_shared::ValidationError;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An insert or patch payload was rejected before any state changed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The referenced record was never created.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: u64 },

    /// A thread panicked while holding the state lock.
    #[error("Store state lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Medication,
    MedicationLog,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Entity::Medication => "Medication",
            Entity::MedicationLog => "Medication log",
        })
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
