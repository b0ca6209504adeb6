//! Econt courier office directory.
//!
//! The directory is static reference data compiled into the binary from
//! `data/econt_offices.json`. Lookups are case-insensitive.

use serde::{Deserialize, Serialize};

const OFFICES_JSON: &str = include_str!("../data/econt_offices.json");

/// Default cap on search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// An Econt office customers can collect parcels from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcontOffice {
    pub code: String,
    pub name: String,
    pub city: String,
    pub postal_code: String,
    pub address: String,
    pub phone: Option<String>,
    pub working_hours: Option<String>,
}

/// Parsed office directory.
#[derive(Debug, Clone)]
pub struct EcontDirectory {
    offices: Vec<EcontOffice>,
}

impl EcontDirectory {
    /// Load the embedded directory.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the embedded data is malformed.
    pub fn load() -> Result<Self, serde_json::Error> {
        Self::from_json(OFFICES_JSON)
    }

    /// Parse a directory from JSON.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if `json` is not a list of offices.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut offices: Vec<EcontOffice> = serde_json::from_str(json)?;
        offices.sort_by(|a, b| a.city.cmp(&b.city).then_with(|| a.name.cmp(&b.name)));
        Ok(Self { offices })
    }

    /// Number of offices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offices.is_empty()
    }

    /// Office by its code.
    #[must_use]
    pub fn find(&self, code: &str) -> Option<&EcontOffice> {
        let code = code.trim();
        self.offices
            .iter()
            .find(|o| o.code.eq_ignore_ascii_case(code))
    }

    /// Offices in `city` (exact, case-insensitive) whose name or address
    /// contains `query`. Either filter may be omitted.
    #[must_use]
    pub fn search(&self, city: Option<&str>, query: Option<&str>, limit: usize) -> Vec<&EcontOffice> {
        let city = city.map(str::trim).filter(|c| !c.is_empty()).map(str::to_lowercase);
        let query = query.map(str::trim).filter(|q| !q.is_empty()).map(str::to_lowercase);

        self.offices
            .iter()
            .filter(|o| city.as_ref().is_none_or(|c| o.city.to_lowercase() == *c))
            .filter(|o| {
                query.as_ref().is_none_or(|q| {
                    o.name.to_lowercase().contains(q)
                        || o.address.to_lowercase().contains(q)
                        || o.code.contains(q.as_str())
                })
            })
            .take(limit)
            .collect()
    }

    /// Distinct city names, sorted.
    #[must_use]
    pub fn cities(&self) -> Vec<&str> {
        let mut cities: Vec<&str> = self.offices.iter().map(|o| o.city.as_str()).collect();
        cities.dedup();
        cities
    }
}
