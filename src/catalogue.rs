//! One synchronization run against a catalogue database
//!
//! Phase 1 folds the imported molecules into the stored ones and persists
//! them, phase 2 attaches storage units once every member has a uid.

use serde::Serialize;
use crate::Result;
use crate::molecule::{Molecule, StorageUnit};
use crate::reconcile::{ReconcileOptions, ReconcileReport, Reconciler, StorageReport};
use crate::storage::{MoleculeSyncStats, SqliteStore, StorageSyncStats};

/// Imported records waiting to be folded into a database
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub molecules: Vec<Molecule>,
    pub storage_units: Vec<StorageUnit>,
}

impl ImportBatch {
    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty() && self.storage_units.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub molecules: ReconcileReport,
    /// Storage members registered as new molecules
    pub adopted: usize,
    pub molecule_writes: MoleculeSyncStats,
    pub storage: StorageReport,
    pub storage_writes: StorageSyncStats,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.molecules)?;
        writeln!(f, "  Adopted from storage: {}", self.adopted)?;
        writeln!(f, "  Alias collisions: {}", self.molecule_writes.alias_collisions.len())?;
        writeln!(f, "Storage:")?;
        writeln!(f, "  Members matched: {}", self.storage.members_matched)?;
        writeln!(f, "  Members unmatched: {}", self.storage.members_unmatched.len())?;
        writeln!(f, "  Units added: {}", self.storage_writes.units_added)?;
        writeln!(f, "  Links added: {}", self.storage_writes.links_added)
    }
}

/// Reconcile `batch` against the content of `store` and write the result.
///
/// Molecules and storage links are committed in two separate transactions;
/// a failure in the second leaves the molecules of the first in place.
pub fn synchronize(
    store: &mut SqliteStore,
    reconciler: &Reconciler,
    batch: ImportBatch,
    options: ReconcileOptions,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    let mut molecules = store.molecules()?;
    tracing::info!(
        "Reconciling {} incoming molecules against {} known ones",
        batch.molecules.len(),
        molecules.len()
    );
    report.molecules = reconciler.reconcile_molecules(batch.molecules, &mut molecules, options);
    report.adopted = reconciler.adopt_storage_members(&batch.storage_units, &mut molecules, options);
    report.molecule_writes = store.upsert_molecules(&mut molecules)?;

    if batch.storage_units.is_empty() {
        return Ok(report);
    }

    let mut units = store.storage_units()?;
    tracing::info!("Reconciling {} incoming storage units", batch.storage_units.len());
    report.storage = reconciler.reconcile_storage_units(batch.storage_units, &molecules, &mut units);
    report.storage_writes = store.upsert_storage_units(&units)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::MatchingMode;

    #[test]
    fn test_synchronize_links_storage_to_new_molecules() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let reconciler = Reconciler::for_mode(MatchingMode::Strict);
        let batch = ImportBatch {
            molecules: vec![Molecule::named("water").with_formula("H2O")],
            storage_units: vec![
                StorageUnit::new("fridge")
                    .with_molecule(Molecule::named("water"))
                    .with_molecule(Molecule::named("acetone")),
            ],
        };

        let report = synchronize(&mut store, &reconciler, batch, ReconcileOptions::default()).unwrap();

        assert_eq!(report.molecules.added, 1);
        assert_eq!(report.adopted, 1);
        assert_eq!(report.molecule_writes.inserted, 2);
        assert_eq!(report.storage.members_matched, 2);
        assert_eq!(report.storage_writes.links_added, 2);
        assert!(report.storage_writes.dangling.is_empty());
        assert!(report.molecule_writes.alias_collisions.is_empty());

        let units = store.storage_units().unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].molecules.len(), 2);
    }

    #[test]
    fn test_shared_alias_is_reported() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let reconciler = Reconciler::for_mode(MatchingMode::Strict);
        let batch = ImportBatch {
            molecules: vec![
                Molecule::named("water").with_formula("H2O"),
                Molecule::named("water").with_formula("D2O"),
            ],
            storage_units: vec![],
        };

        let report = synchronize(&mut store, &reconciler, batch, ReconcileOptions::default()).unwrap();

        assert_eq!(report.molecules.added, 2);
        assert_eq!(report.molecule_writes.alias_collisions.len(), 1);
        assert!(report.to_string().contains("Alias collisions: 1"));
        assert_eq!(store.stats().unwrap().molecules, 2);
    }

    #[test]
    fn test_existing_only_leaves_unknown_members_dangling() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let reconciler = Reconciler::for_mode(MatchingMode::Strict);
        let options = ReconcileOptions { add_unmatched: false, ..Default::default() };
        let batch = ImportBatch {
            molecules: vec![],
            storage_units: vec![StorageUnit::new("shelf").with_molecule(Molecule::named("benzene"))],
        };

        let report = synchronize(&mut store, &reconciler, batch, options).unwrap();

        assert_eq!(report.adopted, 0);
        assert_eq!(report.storage.members_unmatched, vec!["benzene"]);
        assert_eq!(report.storage_writes.dangling, vec!["benzene"]);
        assert_eq!(store.stats().unwrap().storage_links, 0);
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let reconciler = Reconciler::for_mode(MatchingMode::Strict);
        let batch = || ImportBatch {
            molecules: vec![Molecule::named("water").with_retention_time("RT 1", 1.0)],
            storage_units: vec![StorageUnit::new("fridge").with_molecule(Molecule::named("water"))],
        };

        synchronize(&mut store, &reconciler, batch(), ReconcileOptions::default()).unwrap();
        let before = store.stats().unwrap();
        let report = synchronize(&mut store, &reconciler, batch(), ReconcileOptions::default()).unwrap();
        let after = store.stats().unwrap();

        assert_eq!(report.molecules.strict_merges, 1);
        assert_eq!(report.storage_writes.links_added, 0);
        assert_eq!(before.molecules, after.molecules);
        assert_eq!(before.retention_times, after.retention_times);
        assert_eq!(before.storage_links, after.storage_links);
    }
}
