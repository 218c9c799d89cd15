//! CSV export of the catalogue
//!
//! Mirrors the import format so an export can be fed back to `create`.

use std::io::Write;
use std::path::Path;
use crate::Result;
use crate::molecule::Molecule;
use crate::storage::SqliteStore;

const FIXED_HEADERS: [&str; 5] = ["Name", "IUPAC name", "Formula", "MSMS library view", "Mode"];

/// Write `molecules` as semicolon-delimited rows, one retention-time
/// column per entry of `columns`. Missing values are left empty, an unknown
/// library view included. A molecule without alias is written under its
/// iupac name, or `#uid`, so every row can be imported again.
pub fn write_molecules<W: Write>(output: W, molecules: &[Molecule], columns: &[String]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(output);

    let mut header: Vec<&str> = FIXED_HEADERS.to_vec();
    header.extend(columns.iter().map(String::as_str));
    csv.write_record(&header)?;

    for molecule in molecules {
        let mut row = vec![
            // a molecule whose aliases all belong to others still needs a name
            molecule.display_name(),
            molecule.iupac.clone().unwrap_or_default(),
            molecule.formula.clone().unwrap_or_default(),
            match molecule.is_on_libview {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => String::new(),
            },
            molecule.mode.clone().unwrap_or_default(),
        ];
        for column in columns {
            row.push(
                molecule
                    .retention_times
                    .get(column)
                    .map(|time| time.to_string())
                    .unwrap_or_default(),
            );
        }
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Export every molecule of the store to `dest`. Returns the row count.
pub fn export_store(store: &SqliteStore, dest: &Path) -> Result<usize> {
    let columns = store.retention_time_columns()?;
    let molecules = store.molecules()?;
    tracing::debug!("Exporting {} molecules with {} retention time columns", molecules.len(), columns.len());

    let file = std::fs::File::create(dest)?;
    write_molecules(file, &molecules, &columns)?;
    Ok(molecules.len())
}
