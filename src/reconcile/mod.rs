//! Reconciliation - folding imported records into an existing collection
//!
//! Each incoming molecule is merged into the first strictly equivalent
//! record. Failing that, relaxed candidates are offered one at a time to the
//! confirmation policy. A molecule nobody claims is appended as a new record.
//!
//! Storage units are reconciled afterwards, strict matches only: members
//! take the identity of the catalogue record they denote, and units with
//! the same name are combined.

pub mod confirm;
pub mod scan;

pub use confirm::{AlwaysAccept, AlwaysReject, ConfirmPolicy, InteractivePrompt, MatchingMode};
pub use scan::{CandidateScan, first_strict};

use serde::Serialize;
use crate::complete::{NameCompleter, complete_molecule};
use crate::molecule::{Molecule, StorageUnit};

/// Knobs for a reconciliation pass
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Ask the completion service for missing iupac names and formulas first
    pub complete: bool,
    /// Append records that match nothing
    pub add_unmatched: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            complete: false,
            add_unmatched: true,
        }
    }
}

/// What happened to a batch of incoming molecules
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub strict_merges: usize,
    pub relaxed_merges: usize,
    /// Relaxed candidates turned down by the confirmation policy
    pub rejected: usize,
    pub added: usize,
    /// Unmatched molecules dropped because `add_unmatched` was off
    pub skipped: Vec<String>,
    pub completed: usize,
}

impl std::fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Reconciliation:")?;
        writeln!(f, "  Strict merges: {}", self.strict_merges)?;
        writeln!(f, "  Confirmed merges: {}", self.relaxed_merges)?;
        writeln!(f, "  Rejected candidates: {}", self.rejected)?;
        writeln!(f, "  New molecules: {}", self.added)?;
        writeln!(f, "  Completed: {}", self.completed)?;
        writeln!(f, "  Skipped: {}", self.skipped.len())
    }
}

/// What happened to a batch of incoming storage units
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageReport {
    pub members_matched: usize,
    /// Members left without identity (they will not be stored)
    pub members_unmatched: Vec<String>,
    pub units_merged: usize,
    pub units_added: usize,
}

/// Drives classification, confirmation and merging for a batch.
pub struct Reconciler {
    confirm: Box<dyn ConfirmPolicy>,
    completer: Option<Box<dyn NameCompleter>>,
}

impl Reconciler {
    pub fn new(confirm: Box<dyn ConfirmPolicy>) -> Self {
        Self {
            confirm,
            completer: None,
        }
    }

    pub fn for_mode(mode: MatchingMode) -> Self {
        Self::new(mode.policy())
    }

    pub fn with_completer(mut self, completer: Box<dyn NameCompleter>) -> Self {
        self.completer = Some(completer);
        self
    }

    /// Fold `incoming` into `existing`, in input order
    pub fn reconcile_molecules(
        &self,
        incoming: Vec<Molecule>,
        existing: &mut Vec<Molecule>,
        options: ReconcileOptions,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        if options.complete && self.completer.is_none() {
            tracing::warn!("Completion requested but no completion service is configured");
        }

        for mut molecule in incoming {
            if options.complete {
                if let Some(completer) = &self.completer {
                    if complete_molecule(&mut molecule, completer.as_ref()) {
                        report.completed += 1;
                    }
                }
            }
            self.reconcile_molecule(molecule, existing, options, &mut report);
        }

        report
    }

    fn reconcile_molecule(
        &self,
        molecule: Molecule,
        existing: &mut Vec<Molecule>,
        options: ReconcileOptions,
        report: &mut ReconcileReport,
    ) {
        if let Some(index) = first_strict(&molecule, existing) {
            tracing::debug!("{} matches {}", molecule.display_name(), existing[index].display_name());
            existing[index].merge_with(&molecule);
            report.strict_merges += 1;
            return;
        }

        let mut confirmed = None;
        for index in CandidateScan::new(&molecule, existing) {
            let question = format!(
                "Is {} the same molecule as {}?",
                molecule.display_name(),
                existing[index].display_name()
            );
            if self.confirm.confirm(&question) {
                confirmed = Some(index);
                break;
            }
            report.rejected += 1;
        }

        if let Some(index) = confirmed {
            tracing::debug!("{} confirmed as {}", molecule.display_name(), existing[index].display_name());
            existing[index].merge_with(&molecule);
            report.relaxed_merges += 1;
        } else if options.add_unmatched {
            tracing::debug!("Adding new molecule {}", molecule.display_name());
            existing.push(molecule);
            report.added += 1;
        } else {
            tracing::info!("No match for {}, skipping it", molecule.display_name());
            report.skipped.push(molecule.display_name());
        }
    }

    /// Register storage members unknown to the catalogue as new molecules.
    ///
    /// Run before the catalogue is persisted so every member has a uid by
    /// the time storage is reconciled. Does nothing unless `add_unmatched`.
    pub fn adopt_storage_members(
        &self,
        units: &[StorageUnit],
        molecules: &mut Vec<Molecule>,
        options: ReconcileOptions,
    ) -> usize {
        if !options.add_unmatched {
            return 0;
        }

        let mut adopted = 0;
        for unit in units {
            for member in &unit.molecules {
                if first_strict(member, molecules).is_none() {
                    tracing::debug!("{} (stored in {}) is a new molecule", member.display_name(), unit.name);
                    molecules.push(member.clone());
                    adopted += 1;
                }
            }
        }
        adopted
    }

    /// Fold `incoming` storage units into `existing`.
    ///
    /// Members are matched strictly against `molecules` and take over the
    /// matched record's identity; there is no prompting here.
    pub fn reconcile_storage_units(
        &self,
        incoming: Vec<StorageUnit>,
        molecules: &[Molecule],
        existing: &mut Vec<StorageUnit>,
    ) -> StorageReport {
        let mut report = StorageReport::default();

        for mut unit in incoming {
            for member in &mut unit.molecules {
                match first_strict(member, molecules) {
                    Some(index) => {
                        member.merge_with(&molecules[index]);
                        report.members_matched += 1;
                    }
                    None => {
                        tracing::warn!("{} (stored in {}) matches no known molecule", member.display_name(), unit.name);
                        report.members_unmatched.push(member.display_name());
                    }
                }
            }

            match existing.iter_mut().find(|known| known.name == unit.name) {
                Some(known) => {
                    for member in unit.molecules {
                        let duplicate = member.uid.is_some()
                            && known.molecules.iter().any(|m| m.uid == member.uid);
                        if !duplicate {
                            known.molecules.push(member);
                        }
                    }
                    report.units_merged += 1;
                }
                None => {
                    tracing::debug!("New storage unit {}", unit.name);
                    existing.push(unit);
                    report.units_added += 1;
                }
            }
        }

        report
    }
}
