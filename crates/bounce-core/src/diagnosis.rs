//! Primary diagnosis → category resolution.

use std::collections::{BTreeMap, BTreeSet};

/// Category for visits without any diagnosis code.
pub const UNKNOWN_CATEGORY: &str = "Unknown";
/// Category for codes the lookup cannot place when prefix fallback is off.
pub const UNMAPPED_CATEGORY: &str = "Unmapped";

const PREFIX_LEN: usize = 3;

/// Code → category table, keyed by trimmed upper-case code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosisLookup {
    categories: BTreeMap<String, String>,
}

impl DiagnosisLookup {
    pub fn new(categories: BTreeMap<String, String>) -> Self {
        let categories = categories
            .into_iter()
            .map(|(code, category)| (normalize(&code), category))
            .collect();
        Self { categories }
    }

    /// Distinct categories named by the table.
    pub fn categories(&self) -> BTreeSet<String> {
        self.categories.values().cloned().collect()
    }

    /// Exact match, then three-character prefix match, then fallback.
    pub fn category_for(&self, code: Option<&str>, prefix_fallback: bool) -> String {
        let Some(code) = code.map(normalize).filter(|code| !code.is_empty()) else {
            return UNKNOWN_CATEGORY.to_string();
        };
        if let Some(category) = self.categories.get(&code) {
            return category.clone();
        }
        let prefix: String = code.chars().take(PREFIX_LEN).collect();
        if let Some(category) = self.categories.get(&prefix) {
            return category.clone();
        }
        if prefix_fallback {
            prefix
        } else {
            UNMAPPED_CATEGORY.to_string()
        }
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}
