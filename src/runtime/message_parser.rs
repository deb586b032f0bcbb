//! Signal extraction engine.
//!
//! Compiles a [`RuleTable`] once and applies every rule independently to each
//! raw message. A rule that does not match fills its field with the
//! [`NOT_FOUND`] sentinel; a missing required field (always the address)
//! means the message is not a signal at all.

use regex::Regex;

use crate::extraction::FieldPath;
use crate::record::{ExtractedRecord, NOT_FOUND};
use crate::runtime::config_loader::{RuleError, RuleTable};

/// Result of running the extractor over one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// An address was found; other fields may hold the sentinel
    Valid(ExtractedRecord),
    /// Not a signal
    Invalid,
}

impl Extraction {
    pub fn is_valid(&self) -> bool {
        matches!(self, Extraction::Valid(_))
    }

    pub fn record(&self) -> Option<&ExtractedRecord> {
        match self {
            Extraction::Valid(record) => Some(record),
            Extraction::Invalid => None,
        }
    }

    pub fn into_record(self) -> Option<ExtractedRecord> {
        match self {
            Extraction::Valid(record) => Some(record),
            Extraction::Invalid => None,
        }
    }
}

#[derive(Debug)]
struct CompiledRule {
    path: FieldPath,
    pattern: Regex,
    required: bool,
}

impl CompiledRule {
    fn capture<'a>(&self, raw: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|value| !value.is_empty())
    }
}

/// Table-driven extractor for signal reports.
///
/// Immutable after construction, so one instance can be shared by every
/// message handler.
#[derive(Debug)]
pub struct SignalExtractor {
    address: CompiledRule,
    rules: Vec<CompiledRule>,
}

impl SignalExtractor {
    /// Validate and compile a rule table.
    ///
    /// # Example
    /// ```
    /// use signal_relay::runtime::{RuleTable, SignalExtractor};
    ///
    /// let extractor = SignalExtractor::new(&RuleTable::builtin()).unwrap();
    /// assert!(!extractor.extract("gm frens").is_valid());
    /// ```
    pub fn new(table: &RuleTable) -> Result<Self, RuleError> {
        let paths = table.validate()?;

        let mut address = None;
        let mut rules = Vec::with_capacity(table.rules.len());

        for (rule, path) in table.rules.iter().zip(paths) {
            let pattern = Regex::new(&rule.pattern_source()).map_err(|e| RuleError::InvalidPattern {
                path: rule.path.clone(),
                reason: e.to_string(),
            })?;

            if path.is_address() {
                address = Some(CompiledRule {
                    path,
                    pattern,
                    required: true,
                });
            } else {
                rules.push(CompiledRule {
                    path,
                    pattern,
                    required: rule.required,
                });
            }
        }

        let address = address.ok_or(RuleError::MissingAddress)?;
        Ok(Self { address, rules })
    }

    /// Extractor for the built-in report layout.
    pub fn with_builtin_rules() -> Result<Self, RuleError> {
        Self::new(&RuleTable::builtin())
    }

    /// Number of rules, address included.
    pub fn rule_count(&self) -> usize {
        self.rules.len() + 1
    }

    /// Turn one raw message into a record, or reject it as not a signal.
    pub fn extract(&self, raw: &str) -> Extraction {
        let Some(address) = self.address.capture(raw) else {
            return Extraction::Invalid;
        };

        let mut record = ExtractedRecord::new(address.to_string());

        for rule in &self.rules {
            match rule.capture(raw) {
                Some(value) => record.set(&rule.path, value.to_string()),
                None if rule.required => {
                    tracing::debug!(
                        "Rejecting message with address {}: required field '{}' missing",
                        address,
                        rule.path
                    );
                    return Extraction::Invalid;
                }
                None => record.set(&rule.path, NOT_FOUND.to_string()),
            }
        }

        Extraction::Valid(record)
    }
}
