//! Create then update a registered database from CSV files, the way
//! `kemist-db create` and `kemist-db update` do.

use kemist::config::ConfigManager;
use kemist::export::export_store;
use kemist::import::{load_molecules, load_molecules_file, load_storage_units_file};
use kemist::{ImportBatch, MatchingMode, ReconcileOptions, Reconciler, SqliteStore, synchronize};
use std::path::Path;

const FIRST_MOLECULES: &str = "\
Name;IUPAC name;Formula;MSMS library view;Mode;RT C18
Water;Oxidane;H2O;yes;pos;1.5
Ethanol;;C2H6O;no;;3.2
";

const FIRST_STORAGE: &str = "\
Name;Storage
water;Fridge
ethanol;Fridge
acetone;Shelf
";

const SECOND_MOLECULES: &str = "\
Name;IUPAC name;Formula;MSMS library view;Mode;RT C18;RT HILIC
waer;;;;;;0.8
Ethanol;ethanol;;;neg;3.4;
";

fn write(dir: &Path, file: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, contents).unwrap();
    path
}

fn batch(molecules: &Path, storage: Option<&Path>) -> ImportBatch {
    ImportBatch {
        molecules: load_molecules_file(molecules).unwrap(),
        storage_units: storage.map(|path| load_storage_units_file(path).unwrap()).unwrap_or_default(),
    }
}

#[test]
fn test_create_then_update() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ConfigManager::load_from(dir.path().join("config.toml"), dir.path().join("databases")).unwrap();

    // create
    let db_path = config.register("lab", false).unwrap();
    config.save().unwrap();
    let mut store = SqliteStore::open(&db_path).unwrap();
    store.reset_schema().unwrap();

    let molecules = write(dir.path(), "first.csv", FIRST_MOLECULES);
    let storage = write(dir.path(), "storage.csv", FIRST_STORAGE);
    let report = synchronize(
        &mut store,
        &Reconciler::for_mode(MatchingMode::Strict),
        batch(&molecules, Some(&storage)),
        ReconcileOptions::default(),
    )
    .unwrap();

    assert_eq!(report.molecules.added, 2);
    assert_eq!(report.adopted, 1);
    assert_eq!(report.storage_writes.links_added, 3);
    assert_eq!(store.stats().unwrap().molecules, 3);
    drop(store);

    // update, relaxed: "waer" folds into water, ethanol gains its iupac name
    let config = ConfigManager::load_from(dir.path().join("config.toml"), dir.path().join("databases")).unwrap();
    let (name, path) = config.resolve(None).unwrap();
    assert_eq!(name, "lab");
    let mut store = SqliteStore::open(&path).unwrap();

    let molecules = write(dir.path(), "second.csv", SECOND_MOLECULES);
    let report = synchronize(
        &mut store,
        &Reconciler::for_mode(MatchingMode::Relaxed),
        batch(&molecules, None),
        ReconcileOptions::default(),
    )
    .unwrap();

    assert_eq!(report.molecules.relaxed_merges, 1);
    assert_eq!(report.molecules.strict_merges, 1);
    assert_eq!(report.molecules.added, 0);

    let stored = store.molecules().unwrap();
    assert_eq!(stored.len(), 3);

    let water = stored.iter().find(|m| m.has_name("water")).unwrap();
    assert!(water.has_name("waer"));
    assert_eq!(water.formula.as_deref(), Some("H2O"));
    assert_eq!(water.retention_times["RT C18"], 1.5);
    assert_eq!(water.retention_times["RT HILIC"], 0.8);

    let ethanol = stored.iter().find(|m| m.has_name("ethanol")).unwrap();
    assert_eq!(ethanol.iupac.as_deref(), Some("ethanol"));
    assert_eq!(ethanol.mode.as_deref(), Some("neg"));
    assert_eq!(ethanol.retention_times["RT C18"], 3.4);

    let units = store.storage_units().unwrap();
    let fridge = units.iter().find(|u| u.name == "fridge").unwrap();
    assert_eq!(fridge.molecules.len(), 2);

    // export reflects the merged catalogue
    let export = dir.path().join("export.csv");
    assert_eq!(export_store(&store, &export).unwrap(), 3);
    let exported = load_molecules(std::fs::File::open(&export).unwrap()).unwrap();
    assert_eq!(exported.len(), 3);
    assert!(exported.iter().any(|m| m.retention_times.get("RT HILIC") == Some(&0.8)));
}

#[test]
fn test_update_existing_only_keeps_catalogue_closed() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let reconciler = Reconciler::for_mode(MatchingMode::Strict);
    let seed = ImportBatch {
        molecules: load_molecules(FIRST_MOLECULES.as_bytes()).unwrap(),
        ..Default::default()
    };
    synchronize(&mut store, &reconciler, seed, ReconcileOptions::default()).unwrap();

    let options = ReconcileOptions { add_unmatched: false, ..Default::default() };
    let update = ImportBatch {
        molecules: load_molecules(SECOND_MOLECULES.as_bytes()).unwrap(),
        ..Default::default()
    };
    let report = synchronize(&mut store, &reconciler, update, options).unwrap();

    assert_eq!(report.molecules.skipped, vec!["waer"]);
    assert_eq!(report.molecules.strict_merges, 1);
    assert_eq!(store.stats().unwrap().molecules, 2);
}
