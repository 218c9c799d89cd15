//! Database schema definitions
//!
//! Dependent rows are removed by foreign-key cascade, which SQLite only
//! enforces when `PRAGMA foreign_keys` is on for the connection.

/// Enable foreign-key enforcement (per connection)
pub const ENABLE_FOREIGN_KEYS: &str = "PRAGMA foreign_keys = ON";

/// SQL to create the molecules table
pub const CREATE_MOLECULES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS molecules (
    uid INTEGER PRIMARY KEY AUTOINCREMENT,
    iupac TEXT,
    formula TEXT,
    in_libview INTEGER,
    mode TEXT
)
"#;

/// SQL to create the molecule_names table (one row per alias)
pub const CREATE_MOLECULE_NAMES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS molecule_names (
    name TEXT PRIMARY KEY,
    molecule_uid INTEGER NOT NULL REFERENCES molecules(uid) ON DELETE CASCADE
)
"#;

/// SQL to create the molecule_retention_times table
pub const CREATE_RETENTION_TIMES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS molecule_retention_times (
    molecule_uid INTEGER NOT NULL REFERENCES molecules(uid) ON DELETE CASCADE,
    "column" TEXT NOT NULL,
    retention_time REAL NOT NULL,
    PRIMARY KEY (molecule_uid, "column")
)
"#;

/// SQL to create the storage_units table
pub const CREATE_STORAGE_UNITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS storage_units (
    name TEXT PRIMARY KEY
)
"#;

/// SQL to create the molecule_storage association table
pub const CREATE_MOLECULE_STORAGE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS molecule_storage (
    molecule_uid INTEGER NOT NULL REFERENCES molecules(uid) ON DELETE CASCADE,
    storage_name TEXT NOT NULL REFERENCES storage_units(name) ON DELETE CASCADE,
    UNIQUE(molecule_uid, storage_name)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_names_molecule ON molecule_names(molecule_uid)",
    "CREATE INDEX IF NOT EXISTS idx_storage_name ON molecule_storage(storage_name)",
];

/// Statements dropping every table, children first
pub const DROP_TABLES: &[&str] = &[
    "DROP TABLE IF EXISTS molecule_storage",
    "DROP TABLE IF EXISTS storage_units",
    "DROP TABLE IF EXISTS molecule_retention_times",
    "DROP TABLE IF EXISTS molecule_names",
    "DROP TABLE IF EXISTS molecules",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_MOLECULES_TABLE,
        CREATE_MOLECULE_NAMES_TABLE,
        CREATE_RETENTION_TIMES_TABLE,
        CREATE_STORAGE_UNITS_TABLE,
        CREATE_MOLECULE_STORAGE_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
