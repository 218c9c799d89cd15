//! Record model - molecules and the storage units holding them
//!
//! A `Molecule` is a partial description of one chemical compound. Records
//! coming from an import carry no `uid`; records loaded from the store carry
//! the uid the store assigned plus every alias and measurement on file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalize an alias the way every alias is stored: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One chemical compound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    /// Store identifier, `None` until first persisted
    pub uid: Option<i64>,
    /// Canonical IUPAC name
    pub iupac: Option<String>,
    /// Molecular formula
    pub formula: Option<String>,
    /// Whether the compound is part of the MS/MS spectral library
    pub is_on_libview: Option<bool>,
    /// Instrument acquisition mode
    pub mode: Option<String>,
    /// Ordered set of aliases; the first one is the primary name
    pub known_names: Vec<String>,
    /// Retention time per measurement column
    pub retention_times: BTreeMap<String, f64>,
}

impl Molecule {
    /// Create an unpersisted molecule known by a single alias
    pub fn named(name: &str) -> Self {
        let mut molecule = Self::default();
        molecule.add_name(name);
        molecule
    }

    pub fn with_uid(mut self, uid: i64) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn with_iupac(mut self, iupac: impl Into<String>) -> Self {
        self.iupac = Some(iupac.into());
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn with_libview(mut self, is_on_libview: bool) -> Self {
        self.is_on_libview = Some(is_on_libview);
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.add_name(name);
        self
    }

    pub fn with_retention_time(mut self, column: impl Into<String>, value: f64) -> Self {
        self.retention_times.insert(column.into(), value);
        self
    }

    /// Add an alias, keeping set semantics. Returns false if it was already known.
    pub fn add_name(&mut self, name: &str) -> bool {
        let name = normalize_name(name);
        if name.is_empty() || self.has_name(&name) {
            return false;
        }
        self.known_names.push(name);
        true
    }

    /// Check whether an alias (case-insensitive) is known
    pub fn has_name(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.known_names.iter().any(|known| *known == name)
    }

    /// The first alias, used when talking about the molecule to a human
    pub fn primary_name(&self) -> Option<&str> {
        self.known_names.first().map(String::as_str)
    }

    /// Primary name, or a stand-in that still identifies the record
    pub fn display_name(&self) -> String {
        match (self.primary_name(), &self.iupac, self.uid) {
            (Some(name), _, _) => name.to_string(),
            (None, Some(iupac), _) => iupac.clone(),
            (None, None, Some(uid)) => format!("#{}", uid),
            (None, None, None) => "<unnamed>".to_string(),
        }
    }

    /// Merge `source` into `self` without losing anything `self` already holds.
    ///
    /// Scalar fields are only filled when absent here. Aliases are unioned,
    /// new ones appended after the existing ones. Retention times are unioned
    /// and `source` wins when both carry the same column.
    pub fn merge_with(&mut self, source: &Molecule) {
        if self.uid.is_none() {
            self.uid = source.uid;
        }
        if self.iupac.is_none() {
            self.iupac = source.iupac.clone();
        }
        if self.formula.is_none() {
            self.formula = source.formula.clone();
        }
        if self.is_on_libview.is_none() {
            self.is_on_libview = source.is_on_libview;
        }
        if self.mode.is_none() {
            self.mode = source.mode.clone();
        }

        for name in &source.known_names {
            self.add_name(name);
        }
        for (column, value) in &source.retention_times {
            self.retention_times.insert(column.clone(), *value);
        }
    }
}

/// A physical storage location and the molecules it holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageUnit {
    pub name: String,
    pub molecules: Vec<Molecule>,
}

impl StorageUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            molecules: Vec::new(),
        }
    }

    pub fn with_molecule(mut self, molecule: Molecule) -> Self {
        self.molecules.push(molecule);
        self
    }
}
