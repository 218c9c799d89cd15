//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OptionalExtension, Params, Transaction, ToSql, params};
use serde::Serialize;
use crate::{Error, Result};
use crate::molecule::{Molecule, StorageUnit};
use super::schema;

const SELECT_MOLECULES: &str = "SELECT uid, iupac, formula, in_libview, mode FROM molecules";

/// SQLite-backed storage for the molecule catalogue
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        tracing::debug!("Connecting to {}", path.display());
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(schema::ENABLE_FOREIGN_KEYS)?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Drop every table and recreate an empty schema
    pub fn reset_schema(&self) -> Result<()> {
        tracing::debug!("Removing existing tables");
        for stmt in schema::DROP_TABLES {
            self.conn.execute(stmt, [])?;
        }
        tracing::debug!("Creating tables");
        self.initialize_schema()
    }

    // ========== Molecule Reads ==========

    /// Load every molecule with its aliases and retention times
    pub fn molecules(&self) -> Result<Vec<Molecule>> {
        self.query_molecules(&format!("{} ORDER BY uid", SELECT_MOLECULES), [])
    }

    /// Get a molecule by uid
    pub fn molecule(&self, uid: i64) -> Result<Option<Molecule>> {
        let molecule = self.conn
            .query_row(
                &format!("{} WHERE uid = ?1", SELECT_MOLECULES),
                [uid],
                Self::row_to_molecule,
            )
            .optional()?;

        match molecule {
            Some(mut molecule) => {
                self.load_details(&mut molecule, uid)?;
                Ok(Some(molecule))
            }
            None => Ok(None),
        }
    }

    /// Distinct retention-time columns measured anywhere in the store
    pub fn retention_time_columns(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT DISTINCT "column" FROM molecule_retention_times ORDER BY "column""#
        )?;

        let columns = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(columns)
    }

    fn query_molecules<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Molecule>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut molecules = stmt
            .query_map(params, Self::row_to_molecule)?
            .collect::<rusqlite::Result<Vec<Molecule>>>()?;

        for molecule in &mut molecules {
            if let Some(uid) = molecule.uid {
                self.load_details(molecule, uid)?;
            }
        }
        Ok(molecules)
    }

    /// Fill aliases (in insertion order) and retention times
    fn load_details(&self, molecule: &mut Molecule, uid: i64) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM molecule_names WHERE molecule_uid = ?1 ORDER BY rowid"
        )?;
        molecule.known_names = stmt
            .query_map([uid], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        let mut stmt = self.conn.prepare(
            r#"SELECT "column", retention_time FROM molecule_retention_times WHERE molecule_uid = ?1"#
        )?;
        molecule.retention_times = stmt
            .query_map([uid], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

        Ok(())
    }

    /// Helper to convert a row to a Molecule (without aliases or measurements)
    fn row_to_molecule(row: &rusqlite::Row) -> rusqlite::Result<Molecule> {
        Ok(Molecule {
            uid: row.get(0)?,
            iupac: row.get(1)?,
            formula: row.get(2)?,
            is_on_libview: row.get(3)?,
            mode: row.get(4)?,
            ..Molecule::default()
        })
    }

    // ========== Molecule Writes ==========

    /// Insert new molecules and update known ones, all in one transaction.
    ///
    /// Uids generated for new molecules are written back only once the
    /// transaction committed, so a failed call leaves both the store and
    /// the slice untouched.
    pub fn upsert_molecules(&mut self, molecules: &mut [Molecule]) -> Result<MoleculeSyncStats> {
        let mut stats = MoleculeSyncStats::default();
        let mut assigned = Vec::new();

        let tx = self.conn.transaction()?;
        for (index, molecule) in molecules.iter().enumerate() {
            let uid = match molecule.uid {
                None => {
                    let uid = insert_molecule(&tx, molecule)?;
                    tracing::debug!("Inserted {} as #{}", molecule.display_name(), uid);
                    assigned.push((index, uid));
                    stats.inserted += 1;
                    uid
                }
                Some(uid) => {
                    if update_molecule(&tx, molecule, uid)? {
                        stats.updated += 1;
                    }
                    uid
                }
            };
            stats.names_added += insert_names(&tx, uid, &molecule.known_names, &mut stats.alias_collisions)?;
            stats.retention_times_written += write_retention_times(&tx, uid, molecule)?;
        }
        tx.commit()?;

        for (index, uid) in assigned {
            molecules[index].uid = Some(uid);
        }
        Ok(stats)
    }

    /// Delete a molecule; aliases, measurements and storage links follow
    pub fn delete_molecule(&self, uid: i64) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM molecules WHERE uid = ?1", [uid])?;
        Ok(deleted > 0)
    }

    // ========== Storage Units ==========

    /// Load every storage unit with its molecules
    pub fn storage_units(&self) -> Result<Vec<StorageUnit>> {
        let mut stmt = self.conn.prepare("SELECT name FROM storage_units ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        let mut units = Vec::with_capacity(names.len());
        for name in names {
            tracing::debug!("Fetching storage content for {}", name);
            let molecules = self.query_molecules(
                "SELECT m.uid, m.iupac, m.formula, m.in_libview, m.mode
                 FROM molecules m
                 JOIN molecule_storage s ON s.molecule_uid = m.uid
                 WHERE s.storage_name = ?1
                 ORDER BY m.uid",
                [&name],
            )?;
            units.push(StorageUnit { name, molecules });
        }
        Ok(units)
    }

    /// Record storage units and their content, all in one transaction.
    ///
    /// Molecules without a uid cannot be linked; they are logged, counted
    /// as dangling and skipped.
    pub fn upsert_storage_units(&mut self, units: &[StorageUnit]) -> Result<StorageSyncStats> {
        let mut stats = StorageSyncStats::default();

        let tx = self.conn.transaction()?;
        for unit in units {
            stats.units_added += tx.execute(
                "INSERT OR IGNORE INTO storage_units (name) VALUES (?1)",
                [&unit.name],
            )?;

            for molecule in &unit.molecules {
                let Some(uid) = molecule.uid else {
                    tracing::error!(
                        "Can't add an unknown molecule to storage {}. Skipping {}...",
                        unit.name,
                        molecule.display_name()
                    );
                    stats.dangling.push(format!("{} ({})", molecule.display_name(), unit.name));
                    continue;
                };

                stats.links_added += tx.execute(
                    "INSERT OR IGNORE INTO molecule_storage (molecule_uid, storage_name) VALUES (?1, ?2)",
                    params![uid, unit.name],
                )?;
            }
        }
        tx.commit()?;

        Ok(stats)
    }

    /// Delete a storage unit and its links (the molecules stay)
    pub fn delete_storage_unit(&self, name: &str) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM storage_units WHERE name = ?1", [name])?;
        Ok(deleted > 0)
    }

    // ========== Statistics ==========

    fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            molecules: self.count("molecules")?,
            names: self.count("molecule_names")?,
            retention_times: self.count("molecule_retention_times")?,
            storage_units: self.count("storage_units")?,
            storage_links: self.count("molecule_storage")?,
        })
    }
}

fn insert_molecule(tx: &Transaction, molecule: &Molecule) -> Result<i64> {
    tx.execute(
        "INSERT INTO molecules (iupac, formula, in_libview, mode) VALUES (?1, ?2, ?3, ?4)",
        params![molecule.iupac, molecule.formula, molecule.is_on_libview, molecule.mode],
    )?;
    Ok(tx.last_insert_rowid())
}

/// Write the non-null scalar fields of an already persisted molecule.
/// A null field never overwrites a stored value.
fn update_molecule(tx: &Transaction, molecule: &Molecule, uid: i64) -> Result<bool> {
    let exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM molecules WHERE uid = ?1)",
        [uid],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(Error::MoleculeNotFound(uid));
    }

    let mut assignments: Vec<&str> = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();

    if let Some(iupac) = &molecule.iupac {
        assignments.push("iupac = ?");
        values.push(iupac);
    }
    if let Some(formula) = &molecule.formula {
        assignments.push("formula = ?");
        values.push(formula);
    }
    if let Some(is_on_libview) = &molecule.is_on_libview {
        assignments.push("in_libview = ?");
        values.push(is_on_libview);
    }
    if let Some(mode) = &molecule.mode {
        assignments.push("mode = ?");
        values.push(mode);
    }

    if assignments.is_empty() {
        return Ok(false);
    }

    let sql = format!("UPDATE molecules SET {} WHERE uid = ?", assignments.join(", "));
    values.push(&uid);
    tx.execute(&sql, &values[..])?;
    Ok(true)
}

/// Aliases already owned by another molecule are left with their owner
/// and pushed onto `collisions`.
fn insert_names(tx: &Transaction, uid: i64, names: &[String], collisions: &mut Vec<String>) -> Result<usize> {
    let mut added = 0;
    for name in names {
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO molecule_names (name, molecule_uid) VALUES (?1, ?2)",
            params![name, uid],
        )?;
        if inserted == 0 {
            let owner: i64 = tx.query_row(
                "SELECT molecule_uid FROM molecule_names WHERE name = ?1",
                [name],
                |row| row.get(0),
            )?;
            if owner != uid {
                tracing::warn!("Alias {} already belongs to molecule #{}, not adding it to #{}", name, owner, uid);
                collisions.push(format!("{} (owned by #{}, refused for #{})", name, owner, uid));
            }
        }
        added += inserted;
    }
    Ok(added)
}

/// Insert measurements; a re-measured column takes the new value.
/// Writing the same values twice changes nothing.
fn write_retention_times(tx: &Transaction, uid: i64, molecule: &Molecule) -> Result<usize> {
    let mut written = 0;
    for (column, value) in &molecule.retention_times {
        written += tx.execute(
            r#"
            INSERT INTO molecule_retention_times (molecule_uid, "column", retention_time)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (molecule_uid, "column") DO UPDATE
            SET retention_time = excluded.retention_time
            WHERE molecule_retention_times.retention_time <> excluded.retention_time
            "#,
            params![uid, column, value],
        )?;
    }
    Ok(written)
}

/// Outcome of `upsert_molecules`
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoleculeSyncStats {
    pub inserted: usize,
    pub updated: usize,
    pub names_added: usize,
    pub retention_times_written: usize,
    /// Aliases refused because another molecule already owns them
    pub alias_collisions: Vec<String>,
}

/// Outcome of `upsert_storage_units`
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageSyncStats {
    pub units_added: usize,
    pub links_added: usize,
    /// Molecules skipped because they have no uid
    pub dangling: Vec<String>,
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub molecules: usize,
    pub names: usize,
    pub retention_times: usize,
    pub storage_units: usize,
    pub storage_links: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Molecules: {}", self.molecules)?;
        writeln!(f, "  Names: {}", self.names)?;
        writeln!(f, "  Retention times: {}", self.retention_times)?;
        writeln!(f, "  Storage units: {}", self.storage_units)?;
        writeln!(f, "  Stored molecules: {}", self.storage_links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> Molecule {
        Molecule::named("water")
            .with_name("dihydrogen oxide")
            .with_iupac("oxidane")
            .with_formula("H2O")
            .with_libview(true)
            .with_mode("pos")
            .with_retention_time("RT 1", 1.25)
            .with_retention_time("RT 2", 3.5)
    }

    #[test]
    fn test_molecule_roundtrip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![water()];

        let stats = store.upsert_molecules(&mut molecules).unwrap();
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.names_added, 2);
        assert_eq!(stats.retention_times_written, 2);

        let uid = molecules[0].uid.unwrap();
        let reloaded = store.molecule(uid).unwrap().unwrap();
        assert_eq!(reloaded, molecules[0]);
        assert_eq!(reloaded.primary_name(), Some("water"));
    }

    #[test]
    fn test_shared_alias_stays_with_first_owner() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![
            Molecule::named("water").with_formula("H2O"),
            Molecule::named("water").with_formula("D2O"),
        ];

        let stats = store.upsert_molecules(&mut molecules).unwrap();
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.names_added, 1);
        assert_eq!(stats.alias_collisions.len(), 1);
        assert!(stats.alias_collisions[0].starts_with("water"));

        let heavy = store.molecule(molecules[1].uid.unwrap()).unwrap().unwrap();
        assert!(heavy.known_names.is_empty());
        assert_eq!(heavy.formula.as_deref(), Some("D2O"));

        // a rerun reports nothing new
        let mut reloaded = store.molecules().unwrap();
        let stats = store.upsert_molecules(&mut reloaded).unwrap();
        assert!(stats.alias_collisions.is_empty());
    }

    #[test]
    fn test_update_keeps_stored_values_for_null_fields() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![water()];
        store.upsert_molecules(&mut molecules).unwrap();
        let uid = molecules[0].uid.unwrap();

        let mut partial = vec![Molecule::named("aqua").with_uid(uid).with_mode("neg")];
        let stats = store.upsert_molecules(&mut partial).unwrap();
        assert_eq!(stats.inserted, 0);
        assert_eq!(stats.updated, 1);

        let reloaded = store.molecule(uid).unwrap().unwrap();
        assert_eq!(reloaded.iupac.as_deref(), Some("oxidane"));
        assert_eq!(reloaded.formula.as_deref(), Some("H2O"));
        assert_eq!(reloaded.is_on_libview, Some(true));
        assert_eq!(reloaded.mode.as_deref(), Some("neg"));
        assert_eq!(reloaded.known_names, vec!["water", "dihydrogen oxide", "aqua"]);
        assert_eq!(reloaded.retention_times.len(), 2);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![water()];
        store.upsert_molecules(&mut molecules).unwrap();

        let stats = store.upsert_molecules(&mut molecules).unwrap();
        assert_eq!(stats.inserted, 0);
        assert_eq!(stats.names_added, 0);
        assert_eq!(stats.retention_times_written, 0);

        let db = store.stats().unwrap();
        assert_eq!(db.molecules, 1);
        assert_eq!(db.names, 2);
        assert_eq!(db.retention_times, 2);
    }

    #[test]
    fn test_remeasured_retention_time_is_updated() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![water()];
        store.upsert_molecules(&mut molecules).unwrap();

        molecules[0].retention_times.insert("RT 1".to_string(), 1.5);
        let stats = store.upsert_molecules(&mut molecules).unwrap();
        assert_eq!(stats.retention_times_written, 1);

        let reloaded = store.molecule(molecules[0].uid.unwrap()).unwrap().unwrap();
        assert_eq!(reloaded.retention_times["RT 1"], 1.5);
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![water(), Molecule::named("ghost").with_uid(999)];

        let err = store.upsert_molecules(&mut molecules).unwrap_err();
        assert!(matches!(err, Error::MoleculeNotFound(999)));
        assert!(molecules[0].uid.is_none());
        assert_eq!(store.stats().unwrap().molecules, 0);
        assert_eq!(store.stats().unwrap().names, 0);
    }

    #[test]
    fn test_retention_time_columns_are_distinct() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![
            water(),
            Molecule::named("ethanol").with_retention_time("RT 2", 4.0).with_retention_time("RT 3", 5.0),
        ];
        store.upsert_molecules(&mut molecules).unwrap();

        assert_eq!(store.retention_time_columns().unwrap(), vec!["RT 1", "RT 2", "RT 3"]);
    }

    #[test]
    fn test_storage_upsert_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![water()];
        store.upsert_molecules(&mut molecules).unwrap();

        let units = vec![StorageUnit::new("fridge").with_molecule(molecules[0].clone())];
        let first = store.upsert_storage_units(&units).unwrap();
        assert_eq!(first.units_added, 1);
        assert_eq!(first.links_added, 1);

        let second = store.upsert_storage_units(&units).unwrap();
        assert_eq!(second.units_added, 0);
        assert_eq!(second.links_added, 0);
        assert_eq!(store.stats().unwrap().storage_links, 1);

        let loaded = store.storage_units().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "fridge");
        assert_eq!(loaded[0].molecules[0].known_names, vec!["water", "dihydrogen oxide"]);
    }

    #[test]
    fn test_storage_skips_unidentified_molecules() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![water()];
        store.upsert_molecules(&mut molecules).unwrap();

        let units = vec![
            StorageUnit::new("shelf")
                .with_molecule(Molecule::named("unknown"))
                .with_molecule(molecules[0].clone()),
        ];
        let stats = store.upsert_storage_units(&units).unwrap();

        assert_eq!(stats.dangling.len(), 1);
        assert_eq!(stats.links_added, 1);
    }

    #[test]
    fn test_delete_molecule_cascades() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![water(), Molecule::named("ethanol")];
        store.upsert_molecules(&mut molecules).unwrap();
        let units = vec![StorageUnit::new("fridge").with_molecule(molecules[0].clone())];
        store.upsert_storage_units(&units).unwrap();

        assert!(store.delete_molecule(molecules[0].uid.unwrap()).unwrap());

        let stats = store.stats().unwrap();
        assert_eq!(stats.molecules, 1);
        assert_eq!(stats.names, 1);
        assert_eq!(stats.retention_times, 0);
        assert_eq!(stats.storage_links, 0);
        assert_eq!(stats.storage_units, 1);
        assert!(!store.delete_molecule(12345).unwrap());
    }

    #[test]
    fn test_delete_storage_unit_cascades() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut molecules = vec![water()];
        store.upsert_molecules(&mut molecules).unwrap();
        let units = vec![StorageUnit::new("fridge").with_molecule(molecules[0].clone())];
        store.upsert_storage_units(&units).unwrap();

        assert!(store.delete_storage_unit("fridge").unwrap());

        let stats = store.stats().unwrap();
        assert_eq!(stats.storage_units, 0);
        assert_eq!(stats.storage_links, 0);
        assert_eq!(stats.molecules, 1);
    }

    #[test]
    fn test_reset_schema_empties_store() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_molecules(&mut [water()]).unwrap();
        store.reset_schema().unwrap();
        assert_eq!(store.stats().unwrap().molecules, 0);
    }
}
