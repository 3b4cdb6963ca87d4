//! Structural validation of fetched schemas
//!
//! Validation collects every violation rather than stopping at the first,
//! so a rejected update reports everything wrong with the payload at once.

use std::collections::HashSet;
use std::fmt;

use modsync_domain::{SchemaDefinition, SchemaVersion};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+$").expect("VERSION_PATTERN should compile - this is a bug")
});

/// One structural problem with a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaValidationIssue {
    /// Location in the payload, e.g. `fieldTypes[2].type`
    pub path: String,
    pub message: String,
}

impl SchemaValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

impl fmt::Display for SchemaValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Check a schema's structural invariants
pub fn validate_schema(schema: &SchemaDefinition) -> Result<(), Vec<SchemaValidationIssue>> {
    let mut issues = Vec::new();

    if !VERSION_PATTERN.is_match(&schema.version) || schema.parsed_version().is_err() {
        issues.push(SchemaValidationIssue::new(
            "version",
            format!("'{}' is not a semantic version (x.y.z)", schema.version),
        ));
    }

    if schema.field_types.is_empty() {
        issues.push(SchemaValidationIssue::new("fieldTypes", "at least one field type is required"));
    }
    let mut seen = HashSet::new();
    for (index, field) in schema.field_types.iter().enumerate() {
        let name = field.type_name.trim();
        if name.is_empty() {
            issues.push(SchemaValidationIssue::new(
                format!("fieldTypes[{index}].type"),
                "field type identifier is empty",
            ));
        } else if !seen.insert(name) {
            issues.push(SchemaValidationIssue::new(
                format!("fieldTypes[{index}].type"),
                format!("duplicate field type '{name}'"),
            ));
        }
    }

    if schema.content_types.is_empty() {
        issues.push(SchemaValidationIssue::new(
            "contentTypes",
            "at least one content type is required",
        ));
    }

    match &schema.module_requirements {
        None => issues.push(SchemaValidationIssue::new(
            "moduleRequirements",
            "module requirements are missing",
        )),
        Some(requirements) => {
            if requirements.max_fields == 0 {
                issues.push(SchemaValidationIssue::new(
                    "moduleRequirements.maxFields",
                    "must be greater than 0",
                ));
            }
            if requirements.min_fields > requirements.max_fields {
                issues.push(SchemaValidationIssue::new(
                    "moduleRequirements.minFields",
                    format!(
                        "minFields ({}) exceeds maxFields ({})",
                        requirements.min_fields, requirements.max_fields
                    ),
                ));
            }
            for (name, pattern) in &requirements.naming_conventions {
                if let Err(e) = Regex::new(pattern) {
                    issues.push(SchemaValidationIssue::new(
                        format!("moduleRequirements.namingConventions.{name}"),
                        format!("invalid pattern: {e}"),
                    ));
                }
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Check that `candidate` may replace `current`
///
/// Adds version monotonicity to the structural checks: the candidate's
/// version must be strictly greater than the current one.
pub fn validate_upgrade(
    current: Option<&SchemaDefinition>,
    candidate: &SchemaDefinition,
) -> Result<(), Vec<SchemaValidationIssue>> {
    let mut issues = validate_schema(candidate).err().unwrap_or_default();

    if let Some(current) = current {
        let versions: Option<(SchemaVersion, SchemaVersion)> =
            current.parsed_version().ok().zip(candidate.parsed_version().ok());
        if let Some((current_version, candidate_version)) = versions {
            if candidate_version <= current_version {
                issues.push(SchemaValidationIssue::new(
                    "version",
                    format!(
                        "version {candidate_version} is not newer than current version \
                         {current_version}"
                    ),
                ));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
