//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - molecules(uid, iupac, formula, in_libview, mode)
//! - molecule_names(name, molecule_uid)
//! - molecule_retention_times(molecule_uid, column, retention_time)
//! - storage_units(name)
//! - molecule_storage(molecule_uid, storage_name)

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, DbStats, MoleculeSyncStats, StorageSyncStats};
