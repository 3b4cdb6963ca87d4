//! Structured change detection between two schema snapshots
//!
//! Each schema section is compared independently:
//! - **Field types**: additions, removals, required-property changes,
//!   deprecations
//! - **Content types**: additions and removals
//! - **Validation rules**: additions and removals, keyed by rule id
//! - **Module requirements**: numeric limits and required files
//!
//! Every change is classified on the spot (impact, complexity, effort,
//! whether migration is needed). The resulting list is sorted by category
//! and then path so the same pair of schemas always yields the same output.

use std::collections::{BTreeMap, BTreeSet};

use modsync_domain::{
    ChangeCategory, ChangeImpact, ChangeType, Complexity, DetailedChange, DiffAnalysis,
    DiffOptions, DiffSummary, FieldTypeDefinition, ModuleRequirements, RiskLevel, RuleSeverity,
    SchemaDefinition,
};
use serde_json::{json, Value};
use tracing::debug;

use super::{compatibility, impact, migration};

/// Diff two schemas with default options
pub fn diff(old: &SchemaDefinition, new: &SchemaDefinition) -> DiffAnalysis {
    diff_with_options(old, new, &DiffOptions::default())
}

/// Diff two schemas, passing caller-known facts through to the impact
/// assessment
pub fn diff_with_options(
    old: &SchemaDefinition,
    new: &SchemaDefinition,
    options: &DiffOptions,
) -> DiffAnalysis {
    let changes = detect_changes(old, new);
    let summary = summarize(&changes);
    let impact = impact::assess(&changes, options);
    let migration_plan = migration::build_plan(&old.version, &new.version, &changes);
    let compatibility = compatibility::build_matrix(&old.version, &new.version, &changes);

    debug!(
        from = %old.version,
        to = %new.version,
        total = summary.total_changes,
        breaking = summary.breaking_changes,
        "Schema diff computed"
    );

    DiffAnalysis {
        from_version: old.version.clone(),
        to_version: new.version.clone(),
        changes,
        summary,
        impact,
        migration_plan,
        compatibility,
    }
}

/// Diff engine carrying the options applied to every diff it computes
#[derive(Debug, Clone, Default)]
pub struct SchemaDiffEngine {
    options: DiffOptions,
}

impl SchemaDiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DiffOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    pub fn diff(&self, old: &SchemaDefinition, new: &SchemaDefinition) -> DiffAnalysis {
        diff_with_options(old, new, &self.options)
    }
}

/// Detect and classify every change, sorted by category then path
pub fn detect_changes(old: &SchemaDefinition, new: &SchemaDefinition) -> Vec<DetailedChange> {
    let mut changes = Vec::new();

    diff_field_types(old, new, &mut changes);
    diff_content_types(old, new, &mut changes);
    diff_validation_rules(old, new, &mut changes);
    if let (Some(old_req), Some(new_req)) = (&old.module_requirements, &new.module_requirements) {
        diff_requirements(old_req, new_req, &mut changes);
    }

    changes.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.change_type.cmp(&b.change_type))
    });
    changes
}

/// Tally a change list
pub fn summarize(changes: &[DetailedChange]) -> DiffSummary {
    let count_impact = |impact: ChangeImpact| changes.iter().filter(|c| c.impact == impact).count();
    let count_type = |kind: ChangeType| changes.iter().filter(|c| c.change_type == kind).count();

    let breaking_changes = count_impact(ChangeImpact::Breaking);

    DiffSummary {
        total_changes: changes.len(),
        breaking_changes,
        non_breaking_changes: count_impact(ChangeImpact::NonBreaking),
        enhancements: count_impact(ChangeImpact::Enhancement),
        additions: count_type(ChangeType::Added),
        removals: count_type(ChangeType::Removed),
        modifications: count_type(ChangeType::Modified),
        deprecations: count_type(ChangeType::Deprecated),
        severity_level: RiskLevel::from_breaking_count(breaking_changes),
    }
}

/// Builder for one classified change
struct Change {
    inner: DetailedChange,
}

impl Change {
    fn new(change_type: ChangeType, category: ChangeCategory, path: String) -> Self {
        Self {
            inner: DetailedChange {
                id: format!("{category}:{change_type}:{path}"),
                change_type,
                category,
                path,
                old_value: None,
                new_value: None,
                description: String::new(),
                impact: ChangeImpact::NonBreaking,
                migration_required: false,
                complexity: Complexity::Simple,
                estimated_effort_hours: 0.0,
            },
        }
    }

    fn values(mut self, old: Option<Value>, new: Option<Value>) -> Self {
        self.inner.old_value = old;
        self.inner.new_value = new;
        self
    }

    fn describe(mut self, description: String) -> Self {
        self.inner.description = description;
        self
    }

    fn breaking(self, complexity: Complexity, hours: f64) -> DetailedChange {
        self.classify(ChangeImpact::Breaking, complexity, hours, true)
    }

    fn non_breaking(self, hours: f64) -> DetailedChange {
        self.classify(ChangeImpact::NonBreaking, Complexity::Simple, hours, false)
    }

    fn enhancement(self) -> DetailedChange {
        self.classify(ChangeImpact::Enhancement, Complexity::Simple, 0.0, false)
    }

    fn classify(
        mut self,
        impact: ChangeImpact,
        complexity: Complexity,
        hours: f64,
        migration_required: bool,
    ) -> DetailedChange {
        self.inner.impact = impact;
        self.inner.complexity = complexity;
        self.inner.estimated_effort_hours = hours;
        self.inner.migration_required = migration_required;
        self.inner
    }
}

fn field_type_value(field: &FieldTypeDefinition) -> Option<Value> {
    serde_json::to_value(field).ok()
}

fn diff_field_types(old: &SchemaDefinition, new: &SchemaDefinition, out: &mut Vec<DetailedChange>) {
    let old_types: BTreeMap<&str, &FieldTypeDefinition> =
        old.field_types.iter().map(|f| (f.type_name.as_str(), f)).collect();
    let new_types: BTreeMap<&str, &FieldTypeDefinition> =
        new.field_types.iter().map(|f| (f.type_name.as_str(), f)).collect();

    for (name, field) in &new_types {
        if !old_types.contains_key(name) {
            out.push(
                Change::new(ChangeType::Added, ChangeCategory::FieldType, format!("fieldTypes.{name}"))
                    .values(None, field_type_value(field))
                    .describe(format!("Field type '{name}' added"))
                    .enhancement(),
            );
        }
    }

    for (name, field) in &old_types {
        let Some(new_field) = new_types.get(name) else {
            out.push(
                Change::new(
                    ChangeType::Removed,
                    ChangeCategory::FieldType,
                    format!("fieldTypes.{name}"),
                )
                .values(field_type_value(field), None)
                .describe(format!(
                    "Field type '{name}' removed; modules using it will fail validation"
                ))
                .breaking(Complexity::Complex, 4.0),
            );
            continue;
        };

        diff_required_properties(name, field, new_field, out);

        if !field.deprecated && new_field.deprecated {
            let description = match &new_field.replacement {
                Some(replacement) => {
                    format!("Field type '{name}' deprecated; use '{replacement}' instead")
                }
                None => format!("Field type '{name}' deprecated"),
            };
            out.push(
                Change::new(
                    ChangeType::Deprecated,
                    ChangeCategory::FieldType,
                    format!("fieldTypes.{name}.deprecated"),
                )
                .values(Some(json!(false)), Some(json!(true)))
                .describe(description)
                .classify(ChangeImpact::NonBreaking, Complexity::Moderate, 3.0, true),
            );
        }
    }
}

fn diff_required_properties(
    name: &str,
    old: &FieldTypeDefinition,
    new: &FieldTypeDefinition,
    out: &mut Vec<DetailedChange>,
) {
    let old_required: BTreeSet<&str> = old.required_properties.iter().map(String::as_str).collect();
    let new_required: BTreeSet<&str> = new.required_properties.iter().map(String::as_str).collect();

    for property in new_required.difference(&old_required) {
        out.push(
            Change::new(
                ChangeType::Added,
                ChangeCategory::Property,
                format!("fieldTypes.{name}.requiredProperties.{property}"),
            )
            .values(None, Some(json!(property)))
            .describe(format!("Property '{property}' is now required on field type '{name}'"))
            .breaking(Complexity::Moderate, 2.0),
        );
    }

    for property in old_required.difference(&new_required) {
        out.push(
            Change::new(
                ChangeType::Removed,
                ChangeCategory::Property,
                format!("fieldTypes.{name}.requiredProperties.{property}"),
            )
            .values(Some(json!(property)), None)
            .describe(format!("Property '{property}' is no longer required on field type '{name}'"))
            .non_breaking(0.5),
        );
    }
}

fn diff_content_types(
    old: &SchemaDefinition,
    new: &SchemaDefinition,
    out: &mut Vec<DetailedChange>,
) {
    let old_types: BTreeSet<&str> = old.content_types.iter().map(String::as_str).collect();
    let new_types: BTreeSet<&str> = new.content_types.iter().map(String::as_str).collect();

    for name in new_types.difference(&old_types) {
        out.push(
            Change::new(ChangeType::Added, ChangeCategory::ContentType, format!("contentTypes.{name}"))
                .values(None, Some(json!(name)))
                .describe(format!("Content type '{name}' added"))
                .enhancement(),
        );
    }

    for name in old_types.difference(&new_types) {
        out.push(
            Change::new(
                ChangeType::Removed,
                ChangeCategory::ContentType,
                format!("contentTypes.{name}"),
            )
            .values(Some(json!(name)), None)
            .describe(format!("Content type '{name}' removed; existing content must be migrated"))
            .breaking(Complexity::Complex, 6.0),
        );
    }
}

fn diff_validation_rules(
    old: &SchemaDefinition,
    new: &SchemaDefinition,
    out: &mut Vec<DetailedChange>,
) {
    let old_ids: BTreeSet<&str> = old.validation_rules.iter().map(|r| r.id.as_str()).collect();
    let new_ids: BTreeSet<&str> = new.validation_rules.iter().map(|r| r.id.as_str()).collect();

    for rule in new.validation_rules.iter().filter(|r| !old_ids.contains(r.id.as_str())) {
        let change = Change::new(
            ChangeType::Added,
            ChangeCategory::ValidationRule,
            format!("validationRules.{}", rule.id),
        )
        .values(None, serde_json::to_value(rule).ok())
        .describe(format!("Validation rule '{}' added with severity {}", rule.id, rule.severity));

        out.push(if rule.severity == RuleSeverity::Error {
            change.breaking(Complexity::Moderate, 3.0)
        } else {
            change.non_breaking(1.0)
        });
    }

    for rule in old.validation_rules.iter().filter(|r| !new_ids.contains(r.id.as_str())) {
        out.push(
            Change::new(
                ChangeType::Removed,
                ChangeCategory::ValidationRule,
                format!("validationRules.{}", rule.id),
            )
            .values(serde_json::to_value(rule).ok(), None)
            .describe(format!("Validation rule '{}' removed", rule.id))
            .non_breaking(0.5),
        );
    }
}

/// Direction in which a numeric limit becomes stricter
#[derive(Clone, Copy)]
enum Restrictive {
    Increase,
    Decrease,
}

fn diff_requirements(
    old: &ModuleRequirements,
    new: &ModuleRequirements,
    out: &mut Vec<DetailedChange>,
) {
    let limits = [
        ("minFields", old.min_fields, new.min_fields, Restrictive::Increase),
        ("maxFields", old.max_fields, new.max_fields, Restrictive::Decrease),
        ("maxFileSizeBytes", old.max_file_size_bytes, new.max_file_size_bytes, Restrictive::Decrease),
        (
            "maxModuleSizeBytes",
            old.max_module_size_bytes,
            new.max_module_size_bytes,
            Restrictive::Decrease,
        ),
    ];

    for (name, before, after, direction) in limits {
        if before == after {
            continue;
        }
        let restrictive = match direction {
            Restrictive::Increase => after > before,
            Restrictive::Decrease => after < before,
        };
        let change = Change::new(
            ChangeType::Modified,
            ChangeCategory::Requirement,
            format!("moduleRequirements.{name}"),
        )
        .values(Some(json!(before)), Some(json!(after)));

        out.push(if restrictive {
            change
                .describe(format!("Requirement '{name}' tightened from {before} to {after}"))
                .breaking(Complexity::Complex, 4.0)
        } else {
            change
                .describe(format!("Requirement '{name}' relaxed from {before} to {after}"))
                .non_breaking(1.0)
        });
    }

    let old_files: BTreeSet<&str> = old.required_files.iter().map(String::as_str).collect();
    let new_files: BTreeSet<&str> = new.required_files.iter().map(String::as_str).collect();

    for file in new_files.difference(&old_files) {
        out.push(
            Change::new(
                ChangeType::Added,
                ChangeCategory::Requirement,
                format!("moduleRequirements.requiredFiles.{file}"),
            )
            .values(None, Some(json!(file)))
            .describe(format!("File '{file}' is now required in every module"))
            .breaking(Complexity::Moderate, 2.0),
        );
    }

    for file in old_files.difference(&new_files) {
        out.push(
            Change::new(
                ChangeType::Removed,
                ChangeCategory::Requirement,
                format!("moduleRequirements.requiredFiles.{file}"),
            )
            .values(Some(json!(file)), None)
            .describe(format!("File '{file}' is no longer required"))
            .non_breaking(0.5),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{rule, schema};
    use super::*;

    #[test]
    fn test_identical_schemas_have_no_changes() {
        let a = schema("1.0.0");
        let analysis = diff(&a, &a);

        assert!(analysis.changes.is_empty());
        assert_eq!(analysis.summary.severity_level, RiskLevel::Low);
        assert!(analysis.impact.backward_compatible);
    }

    #[test]
    fn test_field_type_swap() {
        let old = schema("1.0.0");
        let mut new = schema("1.1.0");
        new.field_types.retain(|f| f.type_name != "richtext");
        new.field_types.push(FieldTypeDefinition::new("image", &["src"]));

        let changes = detect_changes(&old, &new);
        assert_eq!(changes.len(), 2);

        let added = &changes[0];
        assert_eq!(added.path, "fieldTypes.image");
        assert_eq!(added.change_type, ChangeType::Added);
        assert_eq!(added.impact, ChangeImpact::Enhancement);
        assert!(!added.migration_required);
        assert_eq!(added.estimated_effort_hours, 0.0);

        let removed = &changes[1];
        assert_eq!(removed.path, "fieldTypes.richtext");
        assert_eq!(removed.change_type, ChangeType::Removed);
        assert!(removed.is_breaking());
        assert!(removed.migration_required);
        assert_eq!(removed.complexity, Complexity::Complex);
        assert_eq!(removed.estimated_effort_hours, 4.0);

        let summary = summarize(&changes);
        assert_eq!(summary.breaking_changes, 1);
        assert_eq!(summary.enhancements, 1);
        assert_eq!(summary.severity_level, RiskLevel::Medium);
    }

    #[test]
    fn test_required_property_changes() {
        let old = schema("1.0.0");
        let mut new = schema("1.0.1");
        new.field_types[0].required_properties = vec!["name".to_string(), "help_text".to_string()];

        let changes = detect_changes(&old, &new);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.category == ChangeCategory::Property));

        let newly_required = changes
            .iter()
            .find(|c| c.path == "fieldTypes.text.requiredProperties.help_text")
            .unwrap();
        assert!(newly_required.is_breaking());
        assert_eq!(newly_required.complexity, Complexity::Moderate);
        assert_eq!(newly_required.estimated_effort_hours, 2.0);

        let relaxed =
            changes.iter().find(|c| c.path == "fieldTypes.text.requiredProperties.label").unwrap();
        assert_eq!(relaxed.impact, ChangeImpact::NonBreaking);
        assert!(!relaxed.migration_required);
        assert_eq!(relaxed.estimated_effort_hours, 0.5);
    }

    #[test]
    fn test_deprecation_names_replacement() {
        let old = schema("1.0.0");
        let mut new = schema("1.1.0");
        new.field_types[1].deprecated = true;
        new.field_types[1].replacement = Some("text".to_string());

        let changes = detect_changes(&old, &new);
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.change_type, ChangeType::Deprecated);
        assert_eq!(change.impact, ChangeImpact::NonBreaking);
        assert!(change.migration_required);
        assert_eq!(change.estimated_effort_hours, 3.0);
        assert!(change.description.contains("'text'"));
    }

    #[test]
    fn test_already_deprecated_type_is_not_reported_again() {
        let mut old = schema("1.0.0");
        old.field_types[1].deprecated = true;
        let new = old.clone();

        assert!(detect_changes(&old, &new).is_empty());
    }

    #[test]
    fn test_deprecated_feature_notices_are_not_changes() {
        let old = schema("1.0.0");
        let mut new = schema("1.0.1");
        new.deprecated_features.push(modsync_domain::DeprecatedFeature {
            feature: "legacy_gallery".to_string(),
            deprecated_since: "1.0.1".to_string(),
            removal_version: Some("2.0.0".to_string()),
            replacement: Some("image".to_string()),
        });

        assert!(detect_changes(&old, &new).is_empty());
    }

    #[test]
    fn test_content_type_changes() {
        let old = schema("1.0.0");
        let mut new = schema("2.0.0");
        new.content_types = vec!["SITE_PAGE".to_string(), "LANDING_PAGE".to_string()];

        let changes = detect_changes(&old, &new);
        let removed = changes.iter().find(|c| c.change_type == ChangeType::Removed).unwrap();
        assert_eq!(removed.path, "contentTypes.BLOG_POST");
        assert!(removed.is_breaking());
        assert_eq!(removed.estimated_effort_hours, 6.0);

        let added = changes.iter().find(|c| c.change_type == ChangeType::Added).unwrap();
        assert_eq!(added.impact, ChangeImpact::Enhancement);
    }

    #[test]
    fn test_validation_rule_severity_decides_impact() {
        let old = schema("1.0.0");
        let mut new = schema("1.1.0");
        new.validation_rules = vec![
            rule("alt-text", RuleSeverity::Error),
            rule("max-depth", RuleSeverity::Info),
        ];

        let changes = detect_changes(&old, &new);
        assert_eq!(changes.len(), 3);

        let error_rule = changes.iter().find(|c| c.path == "validationRules.alt-text").unwrap();
        assert!(error_rule.is_breaking());
        assert_eq!(error_rule.estimated_effort_hours, 3.0);

        let info_rule = changes.iter().find(|c| c.path == "validationRules.max-depth").unwrap();
        assert_eq!(info_rule.impact, ChangeImpact::NonBreaking);
        assert_eq!(info_rule.estimated_effort_hours, 1.0);

        let removed = changes.iter().find(|c| c.path == "validationRules.label-length").unwrap();
        assert_eq!(removed.change_type, ChangeType::Removed);
        assert_eq!(removed.impact, ChangeImpact::NonBreaking);
    }

    #[test]
    fn test_requirement_directions() {
        let old = schema("1.0.0");
        let mut new = schema("1.1.0");
        if let Some(req) = new.module_requirements.as_mut() {
            req.max_fields = 30;
            req.min_fields = 2;
            req.max_file_size_bytes *= 2;
        }

        let changes = detect_changes(&old, &new);
        assert_eq!(changes.len(), 3);

        let max_fields = changes.iter().find(|c| c.path == "moduleRequirements.maxFields").unwrap();
        assert_eq!(max_fields.change_type, ChangeType::Modified);
        assert!(max_fields.is_breaking());
        assert!(max_fields.migration_required);
        assert_eq!(max_fields.estimated_effort_hours, 4.0);
        assert_eq!(max_fields.old_value, Some(json!(50)));
        assert_eq!(max_fields.new_value, Some(json!(30)));

        let min_fields = changes.iter().find(|c| c.path == "moduleRequirements.minFields").unwrap();
        assert!(min_fields.is_breaking());

        let file_size =
            changes.iter().find(|c| c.path == "moduleRequirements.maxFileSizeBytes").unwrap();
        assert_eq!(file_size.impact, ChangeImpact::NonBreaking);
        assert_eq!(file_size.estimated_effort_hours, 1.0);
    }

    #[test]
    fn test_required_file_changes() {
        let old = schema("1.0.0");
        let mut new = schema("1.1.0");
        if let Some(req) = new.module_requirements.as_mut() {
            req.required_files = vec!["module.html".to_string(), "meta.json".to_string()];
        }

        let changes = detect_changes(&old, &new);
        let added = changes
            .iter()
            .find(|c| c.path == "moduleRequirements.requiredFiles.meta.json")
            .unwrap();
        assert!(added.is_breaking());
        assert_eq!(added.estimated_effort_hours, 2.0);

        let removed = changes
            .iter()
            .find(|c| c.path == "moduleRequirements.requiredFiles.fields.json")
            .unwrap();
        assert_eq!(removed.impact, ChangeImpact::NonBreaking);
        assert_eq!(removed.estimated_effort_hours, 0.5);
    }

    #[test]
    fn test_output_is_sorted_and_order_insensitive() {
        let old = schema("1.0.0");
        let mut new = schema("2.0.0");
        new.field_types.reverse();
        new.field_types.push(FieldTypeDefinition::new("image", &["src"]));
        new.content_types = vec!["LANDING_PAGE".to_string()];
        if let Some(req) = new.module_requirements.as_mut() {
            req.max_fields = 40;
        }

        let changes = detect_changes(&old, &new);
        let categories: Vec<ChangeCategory> = changes.iter().map(|c| c.category).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);

        // Reordering list sections in the input changes nothing
        let mut shuffled = new.clone();
        shuffled.field_types.reverse();
        shuffled.content_types.reverse();
        assert_eq!(detect_changes(&old, &shuffled), changes);
    }

    #[test]
    fn test_engine_passes_options_through() {
        let engine =
            SchemaDiffEngine::with_options(DiffOptions { forward_compatibility: Some(false) });
        let analysis = engine.diff(&schema("1.0.0"), &schema("1.0.1"));

        assert_eq!(analysis.impact.forward_compatibility, Some(false));
        assert_eq!(diff(&schema("1.0.0"), &schema("1.0.1")).impact.forward_compatibility, None);
    }
}
