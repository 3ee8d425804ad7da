//! Error types returned by table construction and insertion.

use std::collections::TryReserveError;
use std::fmt;

/// Why a `HashTable` could not be constructed. No partial table is ever
/// returned alongside one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionError {
    /// The builder was finished without a hash function.
    MissingHashFn,
    /// The builder was finished without an equality predicate.
    MissingEqFn,
    /// The initial bucket array could not be allocated.
    AllocationFailure,
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionError::MissingHashFn => f.write_str("hash table requires a hash function"),
            ConstructionError::MissingEqFn => {
                f.write_str("hash table requires a key equality predicate")
            }
            ConstructionError::AllocationFailure => {
                f.write_str("failed to allocate the initial bucket array")
            }
        }
    }
}

impl std::error::Error for ConstructionError {}

impl From<TryReserveError> for ConstructionError {
    fn from(_: TryReserveError) -> Self {
        ConstructionError::AllocationFailure
    }
}

/// Failure of `HashTable::put`. The table is left exactly as it was before
/// the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutError {
    /// Growing the bucket array failed, or its doubled size overflowed.
    AllocationFailure,
}

impl fmt::Display for PutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PutError::AllocationFailure => f.write_str("failed to allocate hash table storage"),
        }
    }
}

impl std::error::Error for PutError {}

impl From<TryReserveError> for PutError {
    fn from(_: TryReserveError) -> Self {
        PutError::AllocationFailure
    }
}
