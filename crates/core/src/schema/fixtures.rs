//! Schema builders shared by unit tests

use chrono::{TimeZone, Utc};
use modsync_domain::{
    FieldTypeDefinition, ModuleRequirements, RuleSeverity, SchemaDefinition,
    ValidationRuleDefinition,
};

pub(crate) fn requirements() -> ModuleRequirements {
    ModuleRequirements {
        min_fields: 1,
        max_fields: 50,
        required_files: vec!["module.html".to_string(), "fields.json".to_string()],
        optional_files: vec!["module.css".to_string()],
        naming_conventions: Default::default(),
        max_file_size_bytes: 1_048_576,
        max_module_size_bytes: 10_485_760,
    }
}

/// A valid schema with `text` and `richtext` field types
pub(crate) fn schema(version: &str) -> SchemaDefinition {
    SchemaDefinition {
        version: version.to_string(),
        last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        field_types: vec![
            FieldTypeDefinition::new("text", &["name", "label"]),
            FieldTypeDefinition::new("richtext", &["name", "label"]),
        ],
        content_types: vec!["SITE_PAGE".to_string(), "BLOG_POST".to_string()],
        module_requirements: Some(requirements()),
        validation_rules: vec![rule("label-length", RuleSeverity::Warning)],
        deprecated_features: Vec::new(),
    }
}

pub(crate) fn rule(id: &str, severity: RuleSeverity) -> ValidationRuleDefinition {
    ValidationRuleDefinition {
        id: id.to_string(),
        severity,
        description: format!("{id} rule"),
        logic: "true".to_string(),
    }
}
