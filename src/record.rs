//! The structured record produced from a signal report.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::extraction::{FieldGroup, FieldPath, NAME_FIELD};

/// Placeholder stored for every optional field missing from the report.
pub const NOT_FOUND: &str = "Not found";

/// A signal report turned into typed groups of string values.
///
/// Only constructed by the extractor, and only when an address was found.
/// Every other field holds either the captured text or [`NOT_FOUND`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    address: String,
    name: String,
    #[serde(default)]
    ratings: IndexMap<String, String>,
    #[serde(default)]
    financials: IndexMap<String, String>,
    #[serde(default)]
    security: IndexMap<String, String>,
}

impl ExtractedRecord {
    pub(crate) fn new(address: String) -> Self {
        Self {
            address,
            name: NOT_FOUND.to_string(),
            ratings: IndexMap::new(),
            financials: IndexMap::new(),
            security: IndexMap::new(),
        }
    }

    /// Store a value at `path`. The address is fixed at construction.
    pub(crate) fn set(&mut self, path: &FieldPath, value: String) {
        match path.group {
            Some(group) => {
                self.group_mut(group).insert(path.field.clone(), value);
            }
            None if path.field == NAME_FIELD => self.name = value,
            None => {}
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ratings(&self) -> &IndexMap<String, String> {
        &self.ratings
    }

    pub fn financials(&self) -> &IndexMap<String, String> {
        &self.financials
    }

    pub fn security(&self) -> &IndexMap<String, String> {
        &self.security
    }

    pub fn group(&self, group: FieldGroup) -> &IndexMap<String, String> {
        match group {
            FieldGroup::Ratings => &self.ratings,
            FieldGroup::Financials => &self.financials,
            FieldGroup::Security => &self.security,
        }
    }

    fn group_mut(&mut self, group: FieldGroup) -> &mut IndexMap<String, String> {
        match group {
            FieldGroup::Ratings => &mut self.ratings,
            FieldGroup::Financials => &mut self.financials,
            FieldGroup::Security => &mut self.security,
        }
    }

    /// Dotted paths of every field that fell back to the sentinel.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.name == NOT_FOUND {
            missing.push(NAME_FIELD.to_string());
        }
        for group in FieldGroup::ALL {
            missing.extend(
                self.group(group)
                    .iter()
                    .filter(|(_, value)| value.as_str() == NOT_FOUND)
                    .map(|(field, _)| format!("{}.{}", group, field)),
            );
        }
        missing
    }

    /// True when every field was captured.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> FieldPath {
        FieldPath::from_dotted(raw).unwrap()
    }

    fn sample() -> ExtractedRecord {
        let mut record = ExtractedRecord::new("So11111111111111111111111111111111111111112".to_string());
        record.set(&path("financials.transactions"), "68".to_string());
        record.set(&path("financials.price"), NOT_FOUND.to_string());
        record.set(&path("security.total_holders"), "340".to_string());
        record
    }

    #[test]
    fn test_new_record_defaults_name_to_sentinel() {
        let record = ExtractedRecord::new("abc".to_string());

        assert_eq!(record.address(), "abc");
        assert_eq!(record.name(), NOT_FOUND);
        assert!(record.ratings().is_empty());
    }

    #[test]
    fn test_set_by_path() {
        let mut record = sample();
        record.set(&path("name"), "hillury clinton".to_string());

        assert_eq!(record.name(), "hillury clinton");
        assert_eq!(record.financials().get("transactions").map(String::as_str), Some("68"));
        assert_eq!(record.group(FieldGroup::Ratings).get("memeability"), None);
    }

    #[test]
    fn test_set_never_overwrites_address() {
        let mut record = sample();
        record.set(&path("address"), "other".to_string());

        assert_eq!(record.address(), "So11111111111111111111111111111111111111112");
    }

    #[test]
    fn test_missing_fields_lists_sentinels() {
        let record = sample();

        assert_eq!(record.missing_fields(), vec!["name", "financials.price"]);
        assert!(!record.is_complete());
    }
}
