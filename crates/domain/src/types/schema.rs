//! Content-module schema snapshots
//!
//! These types mirror the platform's JSON payload, hence camelCase wire
//! names. A [`SchemaDefinition`] is immutable once it becomes current; the
//! next successful update replaces it wholesale.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A versioned description of the module structure the platform accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    /// Semantic version string, `x.y.z`
    pub version: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub field_types: Vec<FieldTypeDefinition>,
    #[serde(default)]
    pub content_types: Vec<String>,
    /// Optional on the wire so an incomplete payload parses and is then
    /// rejected by structural validation
    #[serde(default)]
    pub module_requirements: Option<ModuleRequirements>,
    #[serde(default)]
    pub validation_rules: Vec<ValidationRuleDefinition>,
    #[serde(default)]
    pub deprecated_features: Vec<DeprecatedFeature>,
}

impl SchemaDefinition {
    /// Look up a field type by identifier
    pub fn field_type(&self, type_name: &str) -> Option<&FieldTypeDefinition> {
        self.field_types.iter().find(|f| f.type_name == type_name)
    }

    /// Look up a validation rule by id
    pub fn validation_rule(&self, id: &str) -> Option<&ValidationRuleDefinition> {
        self.validation_rules.iter().find(|r| r.id == id)
    }

    /// Parse the version string
    pub fn parsed_version(&self) -> Result<SchemaVersion, String> {
        self.version.parse()
    }
}

/// A field type modules may declare
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTypeDefinition {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required_properties: Vec<String>,
    #[serde(default)]
    pub optional_properties: Vec<String>,
    /// Ids of validation rules applied to fields of this type
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl FieldTypeDefinition {
    /// Minimal, non-deprecated field type with the given required properties
    pub fn new(type_name: impl Into<String>, required: &[&str]) -> Self {
        Self {
            type_name: type_name.into(),
            required_properties: required.iter().map(|p| (*p).to_string()).collect(),
            optional_properties: Vec::new(),
            validation_rules: Vec::new(),
            deprecated: false,
            replacement: None,
        }
    }
}

/// Structural limits every module must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRequirements {
    pub min_fields: u64,
    pub max_fields: u64,
    #[serde(default)]
    pub required_files: Vec<String>,
    #[serde(default)]
    pub optional_files: Vec<String>,
    /// Convention name to pattern, e.g. `"moduleName" => "^[a-z][a-z0-9-]*$"`
    #[serde(default)]
    pub naming_conventions: BTreeMap<String, String>,
    pub max_file_size_bytes: u64,
    pub max_module_size_bytes: u64,
}

/// Severity of a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Error,
    Warning,
    Info,
}

crate::impl_domain_status_conversions!(RuleSeverity {
    Error => "error",
    Warning => "warning",
    Info => "info"
});

/// A validation rule executed by the external module validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRuleDefinition {
    pub id: String,
    pub severity: RuleSeverity,
    #[serde(default)]
    pub description: String,
    /// Opaque rule body; never interpreted here
    #[serde(default)]
    pub logic: String,
}

/// A feature scheduled for removal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecatedFeature {
    pub feature: String,
    pub deprecated_since: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removal_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

/// Parsed `major.minor.patch` version with total ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SchemaVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(format!("Invalid SchemaVersion: {s}"));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("Invalid SchemaVersion: {s}"));
            }
            *slot = part.parse().map_err(|_| format!("Invalid SchemaVersion: {s}"))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
