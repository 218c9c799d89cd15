//! Name completion through an external chemical identifier service
//!
//! Completion is best effort: a lookup that fails or finds nothing leaves
//! the molecule as it was.

use std::time::Duration;
use crate::{Error, Result};
use crate::molecule::Molecule;

/// Default Chemical Identifier Resolver endpoint
pub const CIR_BASE_URL: &str = "https://cactus.nci.nih.gov/chemical/structure";

/// Resolves names to structure information.
pub trait NameCompleter {
    /// IUPAC name candidates for a common name. `None` when unknown.
    fn iupac_candidates(&self, name: &str) -> Option<Vec<String>>;

    /// Molecular formula for an IUPAC name
    fn formula(&self, iupac: &str) -> Option<String>;
}

/// Client for the NCI Chemical Identifier Resolver (CIR).
pub struct CirCompleter {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl CirCompleter {
    pub fn new() -> Result<Self> {
        Self::with_base_url(CIR_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("kemist/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Completion(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET <base>/<identifier>/<representation>`, one answer per line
    fn lookup(&self, identifier: &str, representation: &str) -> Option<Vec<String>> {
        let mut url = match reqwest::Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid completion service url {}: {}", self.base_url, e);
                return None;
            }
        };
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().push(identifier).push(representation);
            }
            Err(()) => {
                tracing::warn!("Completion service url {} can't take a path", self.base_url);
                return None;
            }
        }

        tracing::debug!("Querying {}", url);
        let response = match self.http.get(url).send() {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Completion request for {} failed: {}", identifier, e);
                return None;
            }
        };

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("{} not known to the completion service", identifier);
            return None;
        }
        if !response.status().is_success() {
            tracing::warn!("Completion service answered {} for {}", response.status(), identifier);
            return None;
        }

        let body = match response.text() {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Could not read completion answer for {}: {}", identifier, e);
                return None;
            }
        };

        let answers: Vec<String> = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        if answers.is_empty() { None } else { Some(answers) }
    }
}

impl NameCompleter for CirCompleter {
    fn iupac_candidates(&self, name: &str) -> Option<Vec<String>> {
        self.lookup(name, "iupac_name")
    }

    fn formula(&self, iupac: &str) -> Option<String> {
        self.lookup(iupac, "formula").and_then(|answers| answers.into_iter().next())
    }
}

/// Fill the missing iupac name and formula of a molecule.
///
/// Aliases are tried in order until one resolves. When several IUPAC names
/// come back the first is kept. Returns true if anything was filled.
pub fn complete_molecule(molecule: &mut Molecule, completer: &dyn NameCompleter) -> bool {
    let mut changed = false;

    if molecule.iupac.is_none() {
        for name in &molecule.known_names {
            let Some(candidates) = completer.iupac_candidates(name) else {
                continue;
            };
            let mut candidates = candidates.into_iter();
            let Some(first) = candidates.next() else {
                continue;
            };

            let discarded: Vec<String> = candidates.collect();
            if !discarded.is_empty() {
                tracing::debug!("Ambiguous iupac name for {}: keeping {}, discarding {:?}", name, first, discarded);
            }

            tracing::debug!("Completed iupac name of {}: {}", name, first);
            molecule.iupac = Some(first.to_lowercase());
            changed = true;
            break;
        }
    }

    if molecule.formula.is_none() {
        if let Some(iupac) = &molecule.iupac {
            if let Some(formula) = completer.formula(iupac) {
                tracing::debug!("Completed formula of {}: {}", molecule.display_name(), formula);
                molecule.formula = Some(formula);
                changed = true;
            }
        }
    }

    changed
}
