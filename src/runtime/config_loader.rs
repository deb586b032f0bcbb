//! Field rule table and its YAML loader.
//!
//! The extraction engine is driven entirely by an ordered table of field
//! rules. The built-in table matches the report layout the relay was written
//! for; a YAML file with the same shape can replace it when the upstream
//! report generator adds, drops or renames fields.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::extraction::{FieldPath, FieldPathError};

/// Shape of the value that follows a rule's label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// One whitespace-delimited token
    Token,
    /// Word sequence followed by a parenthesized ticker; only the words are kept
    DisplayName,
    /// Decimal followed by `/10`
    Rating,
    /// Decimal followed by `%`
    Percent,
    /// Token following a literal `$`
    Dollar,
    /// Unsigned integer
    Integer,
}

impl ValueShape {
    /// Regex fragment appended to the escaped label. Group 1 is the value.
    pub fn pattern(&self) -> &'static str {
        match self {
            ValueShape::Token => r"(\S+)",
            ValueShape::DisplayName => r"([\w\s]+) \((\w+)\)",
            ValueShape::Rating => r"([\d.]+)/10",
            ValueShape::Percent => r"([\d.]+)%",
            ValueShape::Dollar => r"\$(\S+)",
            ValueShape::Integer => r"(\d+)",
        }
    }
}

/// One row of the extraction table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Dotted output path (`address`, `name`, `ratings.memeability`, ...)
    pub path: String,

    /// Literal text that precedes the value, decorative glyphs included
    pub label: String,

    pub shape: ValueShape,

    /// A missing required field rejects the whole message
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl FieldRule {
    pub fn new(path: &str, label: &str, shape: ValueShape) -> Self {
        Self {
            path: path.to_string(),
            label: label.to_string(),
            shape,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Full regex source for this rule.
    pub fn pattern_source(&self) -> String {
        format!("{}{}", regex::escape(&self.label), self.shape.pattern())
    }
}

/// Error raised while loading or validating a rule table
#[derive(Debug, Clone, PartialEq)]
pub enum RuleError {
    ReadFailed { path: String, reason: String },
    InvalidYaml(String),
    InvalidPath { path: String, reason: FieldPathError },
    EmptyLabel(String),
    DuplicatePath(String),
    MissingAddress,
    InvalidPattern { path: String, reason: String },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::ReadFailed { path, reason } => {
                write!(f, "Failed to read rule file {}: {}", path, reason)
            }
            RuleError::InvalidYaml(msg) => write!(f, "Failed to parse rule YAML: {}", msg),
            RuleError::InvalidPath { path, reason } => {
                write!(f, "Invalid rule path '{}': {}", path, reason)
            }
            RuleError::EmptyLabel(path) => write!(f, "Rule '{}' has an empty label", path),
            RuleError::DuplicatePath(path) => write!(f, "Rule path '{}' is defined twice", path),
            RuleError::MissingAddress => write!(f, "Rule table has no 'address' rule"),
            RuleError::InvalidPattern { path, reason } => {
                write!(f, "Rule '{}' does not compile: {}", path, reason)
            }
        }
    }
}

impl std::error::Error for RuleError {}

const DEATH_MARKER: &str = "\u{9a55}\u{ba46}\u{c7ba}";
const RED_MARKER: &str = "\u{6e38}\u{b32e}";
const YELLOW_MARKER: &str = "\u{6e38}\u{b9ac}";
const GREEN_MARKER: &str = "\u{6e38}\u{b9ad}";

/// Ordered extraction table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub rules: Vec<FieldRule>,
}

impl RuleTable {
    /// The table for the analytics report layout.
    ///
    /// The colour markers in front of the AI degen ratings are kept exactly as
    /// the report generator emits them; they are matched literally.
    pub fn builtin() -> Self {
        use ValueShape::*;

        let rules = vec![
            FieldRule::new("address", "Address: ", Token).required(),
            FieldRule::new("name", "Name: ", DisplayName),
            FieldRule::new("ratings.memeability", "Memeability: ", Rating),
            FieldRule::new("ratings.death", &format!("{}- Death ", DEATH_MARKER), Percent),
            FieldRule::new("ratings.red", &format!("{} - Red ", RED_MARKER), Percent),
            FieldRule::new("ratings.yellow", &format!("{} - Yellow ", YELLOW_MARKER), Percent),
            FieldRule::new("ratings.green", &format!("{} - Green ", GREEN_MARKER), Percent),
            FieldRule::new("ratings.name_originality", "Name Originality: ", Rating),
            FieldRule::new("ratings.description_originality", "Description Originality: ", Rating),
            FieldRule::new("financials.price", "Price: ", Dollar),
            FieldRule::new("financials.liquidity", "Liquidity: ", Dollar),
            FieldRule::new("financials.latest_marketcap", "Latest Marketcap: ", Dollar),
            FieldRule::new("financials.transactions", "Transactions: ", Integer),
            FieldRule::new("financials.price_change_5m", "5m Price Change: ", Percent),
            FieldRule::new("financials.volume", "Volume: ", Dollar),
            FieldRule::new("security.top_20_holders", "Top 20 Holders: ", Percent),
            FieldRule::new("security.total_holders", "Total Holders: ", Integer),
            FieldRule::new("security.token_supply", "Token Supply: ", Token),
        ];

        Self { rules }
    }

    /// Load a rule table from a YAML file.
    ///
    /// # Example
    /// ```ignore
    /// use signal_relay::runtime::RuleTable;
    ///
    /// let table = RuleTable::load_from_file("config/signal_rules.yaml")?;
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RuleError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|e| RuleError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse and validate a rule table from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, RuleError> {
        let table: RuleTable = serde_yaml::from_str(contents)
            .map_err(|e| RuleError::InvalidYaml(e.to_string()))?;

        table.validate()?;
        Ok(table)
    }

    pub fn to_yaml(&self) -> Result<String, RuleError> {
        serde_yaml::to_string(self).map_err(|e| RuleError::InvalidYaml(e.to_string()))
    }

    /// Check the table and return the parsed output path of every rule, in order.
    pub fn validate(&self) -> Result<Vec<FieldPath>, RuleError> {
        let mut seen = HashSet::new();
        let mut paths = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let path = FieldPath::from_dotted(&rule.path).map_err(|reason| RuleError::InvalidPath {
                path: rule.path.clone(),
                reason,
            })?;

            if rule.label.is_empty() {
                return Err(RuleError::EmptyLabel(rule.path.clone()));
            }

            let key = (path.group, path.field.clone());
            if !seen.insert(key) {
                return Err(RuleError::DuplicatePath(rule.path.clone()));
            }

            paths.push(path);
        }

        if !paths.iter().any(FieldPath::is_address) {
            return Err(RuleError::MissingAddress);
        }

        Ok(paths)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_table_is_valid() {
        let table = RuleTable::builtin();
        let paths = table.validate().unwrap();

        assert_eq!(paths.len(), 18);
        assert!(paths[0].is_address());
        assert!(table.rules[0].required);
        assert!(table.rules[1..].iter().all(|r| !r.required));
    }

    #[test]
    fn test_shipped_rule_file_matches_builtin() {
        let shipped = RuleTable::from_yaml_str(include_str!("../../config/signal_rules.yaml")).unwrap();

        assert_eq!(shipped, RuleTable::builtin());
    }

    #[test]
    fn test_pattern_source_escapes_label() {
        let rule = FieldRule::new("financials.price", "Price: ", ValueShape::Dollar);
        assert_eq!(rule.pattern_source(), r"Price: \$(\S+)");

        let rule = FieldRule::new("ratings.memeability", "Meme.ability: ", ValueShape::Rating);
        assert_eq!(rule.pattern_source(), r"Meme\.ability: ([\d.]+)/10");
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = RuleTable::builtin().to_yaml().unwrap();
        let table = RuleTable::from_yaml_str(&yaml).unwrap();

        assert_eq!(table, RuleTable::builtin());
    }

    #[test]
    fn test_missing_address_rule() {
        let yaml = r#"
rules:
  - path: name
    label: "Name: "
    shape: display_name
"#;
        assert_eq!(RuleTable::from_yaml_str(yaml), Err(RuleError::MissingAddress));
    }

    #[test]
    fn test_duplicate_path() {
        let yaml = r#"
rules:
  - path: address
    label: "Address: "
    shape: token
  - path: financials.price
    label: "Price: "
    shape: dollar
  - path: financials.price
    label: "Cost: "
    shape: dollar
"#;
        assert_eq!(
            RuleTable::from_yaml_str(yaml),
            Err(RuleError::DuplicatePath("financials.price".to_string()))
        );
    }

    #[test]
    fn test_unknown_group_and_empty_label() {
        let yaml = r#"
rules:
  - path: address
    label: "Address: "
    shape: token
  - path: socials.twitter
    label: "Twitter: "
    shape: token
"#;
        assert!(matches!(
            RuleTable::from_yaml_str(yaml),
            Err(RuleError::InvalidPath { .. })
        ));

        let yaml = r#"
rules:
  - path: address
    label: ""
    shape: token
"#;
        assert_eq!(
            RuleTable::from_yaml_str(yaml),
            Err(RuleError::EmptyLabel("address".to_string()))
        );
    }

    #[test]
    fn test_unknown_shape_is_yaml_error() {
        let yaml = r#"
rules:
  - path: address
    label: "Address: "
    shape: base58
"#;
        assert!(matches!(RuleTable::from_yaml_str(yaml), Err(RuleError::InvalidYaml(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "rules:\n  - path: address\n    label: \"CA: \"\n    shape: token\n    required: true\n"
        )
        .unwrap();

        let table = RuleTable::load_from_file(file.path()).unwrap();

        assert_eq!(table.rules.len(), 1);
        assert_eq!(table.rules[0].label, "CA: ");
        assert!(table.rules[0].required);
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = RuleTable::load_from_file("/nonexistent/signal_rules.yaml");

        assert!(matches!(result, Err(RuleError::ReadFailed { .. })));
    }
}
