//! Order-preserving candidate search over an existing collection

use crate::equivalence::{Equivalence, classify};
use crate::molecule::Molecule;

/// Index of the first record strictly equivalent to `molecule`
pub fn first_strict(molecule: &Molecule, existing: &[Molecule]) -> Option<usize> {
    existing
        .iter()
        .position(|candidate| classify(molecule, candidate) == Equivalence::Strict)
}

/// Stateful scan over relaxed candidates.
///
/// The cursor only moves forward, so a candidate handed out once (and
/// rejected by the caller) is never offered again for the same molecule.
pub struct CandidateScan<'a> {
    molecule: &'a Molecule,
    existing: &'a [Molecule],
    cursor: usize,
}

impl<'a> CandidateScan<'a> {
    pub fn new(molecule: &'a Molecule, existing: &'a [Molecule]) -> Self {
        Self {
            molecule,
            existing,
            cursor: 0,
        }
    }
}

impl Iterator for CandidateScan<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.cursor < self.existing.len() {
            let index = self.cursor;
            self.cursor += 1;
            if classify(self.molecule, &self.existing[index]) == Equivalence::Relaxed {
                return Some(index);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Vec<Molecule> {
        vec![
            Molecule::named("ethanol"),
            Molecule::named("waer"),
            Molecule::named("acetone"),
            Molecule::named("wter"),
        ]
    }

    #[test]
    fn test_first_strict() {
        let existing = existing();
        assert_eq!(first_strict(&Molecule::named("Acetone"), &existing), Some(2));
        assert_eq!(first_strict(&Molecule::named("water"), &existing), None);
    }

    #[test]
    fn test_relaxed_candidates_in_order_once() {
        let existing = existing();
        let incoming = Molecule::named("wate");

        let candidates: Vec<usize> = CandidateScan::new(&incoming, &existing).collect();
        assert_eq!(candidates, vec![1, 3]);
    }

    #[test]
    fn test_scan_resumes_after_rejection() {
        let existing = existing();
        let incoming = Molecule::named("wate");
        let mut scan = CandidateScan::new(&incoming, &existing);

        assert_eq!(scan.next(), Some(1));
        assert_eq!(scan.next(), Some(3));
        assert_eq!(scan.next(), None);
        assert_eq!(scan.next(), None);
    }
}
