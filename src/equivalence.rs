//! Equivalence classification between two molecule records
//!
//! Identity fields are consulted first, in the order uid, iupac, formula.
//! The first field that both records carry decides the outcome on its own.
//! Only when none of them is shared do aliases come into play: an exact
//! alias gives a certain match, a near-miss spelling only a possible one.

use crate::molecule::{Molecule, normalize_name};
use serde::{Deserialize, Serialize};

/// Maximum Levenshtein distance for two aliases to be considered close
pub const MAX_NAME_DISTANCE: usize = 1;

/// How confident we are that two records denote the same compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equivalence {
    /// Certainly the same compound
    Strict,
    /// Possibly the same compound, needs confirmation
    Relaxed,
    /// Different compounds
    None,
}

impl Equivalence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Equivalence::Strict => "strict",
            Equivalence::Relaxed => "relaxed",
            Equivalence::None => "none",
        }
    }
}

impl std::fmt::Display for Equivalence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify two records. Symmetric and side-effect free.
pub fn classify(a: &Molecule, b: &Molecule) -> Equivalence {
    if let (Some(ua), Some(ub)) = (a.uid, b.uid) {
        return exact(ua == ub);
    }
    if let (Some(ia), Some(ib)) = (&a.iupac, &b.iupac) {
        return exact(ia == ib);
    }
    if let (Some(fa), Some(fb)) = (&a.formula, &b.formula) {
        return exact(fa == fb);
    }

    let names_a: Vec<String> = a.known_names.iter().map(|n| normalize_name(n)).collect();
    let names_b: Vec<String> = b.known_names.iter().map(|n| normalize_name(n)).collect();

    if names_a.iter().any(|name| names_b.contains(name)) {
        return Equivalence::Strict;
    }

    for name1 in &names_a {
        for name2 in &names_b {
            if are_names_close(name1, name2) {
                return Equivalence::Relaxed;
            }
        }
    }

    Equivalence::None
}

fn exact(equal: bool) -> Equivalence {
    if equal { Equivalence::Strict } else { Equivalence::None }
}

/// Two aliases are close when either one occurs inside the other with at
/// most `MAX_NAME_DISTANCE` edits.
pub fn are_names_close(a: &str, b: &str) -> bool {
    find_near_match(a, b, MAX_NAME_DISTANCE) || find_near_match(b, a, MAX_NAME_DISTANCE)
}

/// Approximate substring search (Sellers' algorithm).
///
/// Returns true if some substring of `text` is within `max_distance`
/// Levenshtein edits of `pattern`. Patterns no longer than `max_distance`
/// are rejected since they would match anywhere.
pub fn find_near_match(pattern: &str, text: &str, max_distance: usize) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    if pattern.len() <= max_distance {
        return false;
    }

    // column[i] = best distance of pattern[..i] against a substring of text ending here
    let mut column: Vec<usize> = (0..=pattern.len()).collect();
    if column[pattern.len()] <= max_distance {
        return true;
    }

    for &t in &text {
        let mut diagonal = column[0];
        // A match may start anywhere in the text
        column[0] = 0;
        for i in 1..=pattern.len() {
            let cost = if pattern[i - 1] == t { 0 } else { 1 };
            let value = (diagonal + cost)
                .min(column[i] + 1)
                .min(column[i - 1] + 1);
            diagonal = column[i];
            column[i] = value;
        }
        if column[pattern.len()] <= max_distance {
            return true;
        }
    }

    false
}
