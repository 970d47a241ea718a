//! Coverage audit: which expected Articles did segmentation actually find?

use crate::segment::DocumentNode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Present, missing and unexpected Article numerals for one built tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Numerals found, in document order
    pub present_numerals: Vec<String>,
    /// Expected numerals not found, in expected order
    pub missing_numerals: Vec<String>,
    /// Numerals found that were not expected, in document order
    pub extra_numerals: Vec<String>,
    /// `|present ∩ expected| / |expected|`, 1.0 when nothing is expected
    pub coverage_ratio: f64,
}

impl CoverageReport {
    pub fn is_complete(&self) -> bool {
        self.missing_numerals.is_empty()
    }
}

/// Compare the Articles under `root` with the expected enumeration.
pub fn audit<S: AsRef<str>>(root: &DocumentNode, expected: &[S]) -> CoverageReport {
    let mut present_numerals: Vec<String> = Vec::new();
    for numeral in root.articles().filter_map(|a| a.numeral.as_deref()) {
        if !present_numerals.iter().any(|p| p == numeral) {
            present_numerals.push(numeral.to_string());
        }
    }

    let present: HashSet<&str> = present_numerals.iter().map(String::as_str).collect();
    let mut seen_expected: HashSet<&str> = HashSet::new();
    let mut missing_numerals = Vec::new();
    let mut found = 0usize;

    for numeral in expected.iter().map(AsRef::as_ref) {
        if !seen_expected.insert(numeral) {
            continue;
        }
        if present.contains(numeral) {
            found += 1;
        } else {
            missing_numerals.push(numeral.to_string());
        }
    }

    let extra_numerals = present_numerals
        .iter()
        .filter(|p| !seen_expected.contains(p.as_str()))
        .cloned()
        .collect();

    let coverage_ratio = if seen_expected.is_empty() {
        1.0
    } else {
        found as f64 / seen_expected.len() as f64
    };

    CoverageReport {
        present_numerals,
        missing_numerals,
        extra_numerals,
        coverage_ratio,
    }
}
