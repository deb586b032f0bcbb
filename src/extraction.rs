//! Field addressing for extracted signal records.
//!
//! Every rule in the extraction table writes to a [`FieldPath`]: either a
//! top-level identity field (`address`, `name`) or a field inside one of the
//! metric groups (`ratings.memeability`, `financials.price`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level identity field carrying the signal's address.
pub const ADDRESS_FIELD: &str = "address";

/// Top-level identity field carrying the display name.
pub const NAME_FIELD: &str = "name";

/// Metric groups of an extracted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldGroup {
    Ratings,
    Financials,
    Security,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 3] = [FieldGroup::Ratings, FieldGroup::Financials, FieldGroup::Security];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::Ratings => "ratings",
            FieldGroup::Financials => "financials",
            FieldGroup::Security => "security",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == name)
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a path does not address a record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPathError {
    Empty,
    UnknownGroup(String),
    UnknownTopLevel(String),
    TooDeep(String),
}

impl fmt::Display for FieldPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPathError::Empty => write!(f, "Field path is empty"),
            FieldPathError::UnknownGroup(group) => write!(
                f,
                "Unknown field group '{}' (expected ratings, financials or security)",
                group
            ),
            FieldPathError::UnknownTopLevel(field) => write!(
                f,
                "Unknown top-level field '{}' (expected address or name)",
                field
            ),
            FieldPathError::TooDeep(path) => {
                write!(f, "Field path '{}' has more than two segments", path)
            }
        }
    }
}

impl std::error::Error for FieldPathError {}

/// Represents the location of a field inside an extracted record
///
/// # Examples
///
/// - `address` - the mandatory identity field
/// - `ratings.memeability` - a field inside the ratings group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    /// The raw path string
    pub raw: String,
    /// Metric group, `None` for the top-level identity fields
    pub group: Option<FieldGroup>,
    /// Field key inside the group (or the top-level field name)
    pub field: String,
}

impl FieldPath {
    /// Parse a dotted field path (the rule file format)
    ///
    /// # Example
    ///
    /// ```
    /// use signal_relay::{FieldGroup, FieldPath};
    ///
    /// let path = FieldPath::from_dotted("financials.price").unwrap();
    /// assert_eq!(path.group, Some(FieldGroup::Financials));
    /// assert_eq!(path.field, "price");
    /// ```
    pub fn from_dotted(path: &str) -> Result<Self, FieldPathError> {
        let segments: Vec<&str> = path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Err(FieldPathError::Empty),
            [field] => {
                if *field != ADDRESS_FIELD && *field != NAME_FIELD {
                    return Err(FieldPathError::UnknownTopLevel(field.to_string()));
                }
                Ok(Self {
                    raw: path.to_string(),
                    group: None,
                    field: field.to_string(),
                })
            }
            [group, field] => {
                let group = FieldGroup::from_name(group)
                    .ok_or_else(|| FieldPathError::UnknownGroup(group.to_string()))?;
                Ok(Self {
                    raw: path.to_string(),
                    group: Some(group),
                    field: field.to_string(),
                })
            }
            _ => Err(FieldPathError::TooDeep(path.to_string())),
        }
    }

    pub fn is_address(&self) -> bool {
        self.group.is_none() && self.field == ADDRESS_FIELD
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
