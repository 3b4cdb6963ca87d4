//! Schema builders for integration tests

use chrono::{TimeZone, Utc};
use modsync_domain::{
    FieldTypeDefinition, ModuleRequirements, RuleSeverity, SchemaDefinition,
    ValidationRuleDefinition,
};

/// A valid schema with `text` and `richtext` field types and a
/// `max_fields` limit of 50
pub fn base_schema(version: &str) -> SchemaDefinition {
    SchemaDefinition {
        version: version.to_string(),
        last_updated: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        field_types: vec![
            FieldTypeDefinition::new("text", &["name", "label"]),
            FieldTypeDefinition::new("richtext", &["name", "label"]),
        ],
        content_types: vec!["SITE_PAGE".to_string(), "LANDING_PAGE".to_string()],
        module_requirements: Some(ModuleRequirements {
            min_fields: 1,
            max_fields: 50,
            required_files: vec!["module.html".to_string(), "fields.json".to_string()],
            optional_files: vec!["module.css".to_string(), "module.js".to_string()],
            naming_conventions: Default::default(),
            max_file_size_bytes: 1_048_576,
            max_module_size_bytes: 10_485_760,
        }),
        validation_rules: vec![rule("label-length", RuleSeverity::Warning)],
        deprecated_features: Vec::new(),
    }
}

/// `base_schema` with `richtext` swapped for `image`
pub fn image_schema(version: &str) -> SchemaDefinition {
    let mut schema = base_schema(version);
    schema.field_types.retain(|f| f.type_name != "richtext");
    schema.field_types.push(FieldTypeDefinition::new("image", &["src", "alt"]));
    schema
}

pub fn rule(id: &str, severity: RuleSeverity) -> ValidationRuleDefinition {
    ValidationRuleDefinition {
        id: id.to_string(),
        severity,
        description: format!("{id} rule"),
        logic: "true".to_string(),
    }
}
