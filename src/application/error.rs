use thiserror::Error;

use crate::domain::{AllocationError, Cents};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Person not found: {0}")]
    PersonNotFound(String),

    #[error("Person already exists: {0}")]
    PersonAlreadyExists(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Item already exists: {0}")]
    ItemAlreadyExists(String),

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid rate {0}: must be between 0 and 1")]
    InvalidRate(f64),

    #[error("Item '{item}' is not assigned to anyone")]
    ItemNotAssigned { item: String },

    #[error("Person '{person}' is listed more than once for item '{item}'")]
    DuplicateAssignee { item: String, person: String },

    #[error("Person '{person}' is not assigned to item '{item}'")]
    SplitPersonNotAssigned { item: String, person: String },

    #[error("Custom split for '{item}' sums to {actual} cents, expected {expected}")]
    SplitSumMismatch {
        item: String,
        expected: Cents,
        actual: Cents,
    },

    #[error("Saved bill not found: {0}")]
    SavedBillNotFound(String),

    #[error("Invalid bill snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
