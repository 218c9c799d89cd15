//! # Kemist - molecule catalogue management
//!
//! Keeps a SQLite catalogue of chemical compounds and the storage units
//! holding them, and folds newly imported records into it.
//!
//! Kemist provides:
//! - A record model for molecules and storage units
//! - An equivalence classifier (strict / relaxed / none) between records
//! - Non-destructive merging of equivalent records
//! - A reconciliation pass with pluggable confirmation of doubtful matches
//! - SQLite-backed persistence with cascading cleanup
//! - CSV import/export and a registry of named databases

pub mod molecule;
pub mod equivalence;
pub mod reconcile;
pub mod complete;
pub mod storage;
pub mod catalogue;
pub mod import;
pub mod export;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use molecule::{Molecule, StorageUnit};
pub use equivalence::{Equivalence, classify};
pub use reconcile::{MatchingMode, ReconcileOptions, Reconciler};
pub use storage::SqliteStore;
pub use catalogue::{ImportBatch, SyncReport, synchronize};

/// Result type alias for Kemist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Kemist operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0} is not a known database")]
    DatabaseNotFound(String),

    #[error("{0} is already a registered database")]
    DuplicateDatabase(String),

    #[error("No database name given and no default database is set")]
    NoDefaultDatabase,

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("Molecule #{0} does not exist in the database")]
    MoleculeNotFound(i64),
}
