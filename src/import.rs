//! CSV import of molecule lists and storage mappings
//!
//! Both formats are semicolon-delimited with a header row.
//!
//! Molecules: `Name;IUPAC name;Formula;MSMS library view;Mode;RT 1;...;RT N`.
//! Only the name is mandatory; every column after the fifth is a
//! retention-time measurement named by its header.
//!
//! Storage: `Name;Storage`, one molecule name and the unit holding it per row.

use std::io::Read;
use std::path::Path;
use crate::{Error, Result};
use crate::molecule::{Molecule, StorageUnit, normalize_name};

const FIXED_COLUMNS: usize = 5;

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Read molecules from a CSV file
pub fn load_molecules_file(path: &Path) -> Result<Vec<Molecule>> {
    let file = std::fs::File::open(path)?;
    tracing::debug!("Loading molecules from {}", path.display());
    load_molecules(file)
}

/// Read molecules from CSV content
pub fn load_molecules<R: Read>(input: R) -> Result<Vec<Molecule>> {
    let mut csv = reader(input);
    let headers: Vec<String> = csv.headers()?.iter().map(String::from).collect();
    let mut molecules = Vec::new();

    for (row, record) in csv.records().enumerate() {
        let record = record?;
        // header is line 1
        let line = row + 2;

        let Some(name) = non_empty(record.get(0)) else {
            tracing::warn!("Line {}: no molecule name, skipping it", line);
            continue;
        };
        let mut molecule = Molecule::named(name);

        molecule.iupac = non_empty(record.get(1)).map(normalize_name);
        molecule.formula = non_empty(record.get(2)).map(String::from);
        molecule.is_on_libview = match non_empty(record.get(3)).map(str::to_lowercase).as_deref() {
            Some("yes") => Some(true),
            Some("no") => Some(false),
            Some(other) => {
                tracing::warn!("Line {}: unexpected library view value {:?}, leaving it unknown", line, other);
                None
            }
            None => None,
        };
        molecule.mode = non_empty(record.get(4)).map(normalize_name);

        for (index, column) in headers.iter().enumerate().skip(FIXED_COLUMNS) {
            let Some(value) = non_empty(record.get(index)) else {
                continue;
            };
            let invalid = || Error::Parse(format!("line {}: invalid retention time {:?} in column {}", line, value, column));
            let time: f64 = value.replace(',', ".").parse().map_err(|_| invalid())?;
            // nan and inf parse as f64 but can't be stored
            if !time.is_finite() {
                return Err(invalid());
            }
            molecule.retention_times.insert(column.clone(), time);
        }

        molecules.push(molecule);
    }

    tracing::debug!("Loaded {} molecules", molecules.len());
    Ok(molecules)
}

/// Read storage units from a CSV file
pub fn load_storage_units_file(path: &Path) -> Result<Vec<StorageUnit>> {
    let file = std::fs::File::open(path)?;
    tracing::debug!("Loading storage units from {}", path.display());
    load_storage_units(file)
}

/// Read storage units from CSV content, grouping rows by unit name in
/// first-seen order. Each member only carries the name it was listed under.
pub fn load_storage_units<R: Read>(input: R) -> Result<Vec<StorageUnit>> {
    let mut csv = reader(input);
    let mut units: Vec<StorageUnit> = Vec::new();

    for (row, record) in csv.records().enumerate() {
        let record = record?;
        let line = row + 2;

        let (Some(molecule_name), Some(storage_name)) = (non_empty(record.get(0)), non_empty(record.get(1))) else {
            tracing::warn!("Line {}: incomplete storage row, skipping it", line);
            continue;
        };
        let storage_name = normalize_name(storage_name);
        let molecule = Molecule::named(molecule_name);

        match units.iter_mut().find(|unit| unit.name == storage_name) {
            Some(unit) => unit.molecules.push(molecule),
            None => units.push(StorageUnit::new(storage_name).with_molecule(molecule)),
        }
    }

    Ok(units)
}
