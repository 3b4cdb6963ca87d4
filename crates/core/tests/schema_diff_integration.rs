//! Integration tests for the schema diff engine
//!
//! Scenario-level checks across change detection, impact assessment,
//! migration planning, and the compatibility matrix.

mod support;

use modsync_core::schema::migration::{MIGRATION_PHASE, PREPARATION_PHASE, VALIDATION_PHASE};
use modsync_core::{diff, diff_with_options};
use modsync_domain::{
    ChangeCategory, ChangeImpact, ChangeType, Complexity, DiffOptions, FieldTypeDefinition,
    RecommendedAction, RiskLevel, TaskKind,
};
use support::schemas::{base_schema, image_schema};

/// Diffing a schema against itself yields nothing to do.
#[test]
fn test_self_diff_is_empty() {
    let schema = base_schema("1.0.0");
    let analysis = diff(&schema, &schema);

    assert_eq!(analysis.summary.total_changes, 0);
    assert_eq!(analysis.summary.severity_level, RiskLevel::Low);
    assert_eq!(analysis.impact.recommended_action, RecommendedAction::ImmediateUpdate);
    assert_eq!(analysis.migration_plan.total_estimated_hours, 0.0);
    assert_eq!(analysis.migration_plan.phases.len(), 3);
    assert!(!analysis.compatibility.entries[0].migration_required);
}

/// Field types {text, richtext} -> {text, image}.
///
/// # Test Steps
/// 1. Diff the base schema against one that swaps richtext for image
/// 2. Verify one breaking removal and one enhancement addition
/// 3. Verify summary, impact, plan, and matrix agree
#[test]
fn test_field_type_swap_scenario() {
    let analysis = diff(&base_schema("1.0.0"), &image_schema("1.1.0"));

    assert_eq!(analysis.changes.len(), 2);

    let removed = analysis
        .changes
        .iter()
        .find(|c| c.change_type == ChangeType::Removed)
        .expect("removal detected");
    assert_eq!(removed.path, "fieldTypes.richtext");
    assert_eq!(removed.impact, ChangeImpact::Breaking);
    assert!(removed.migration_required);

    let added = analysis
        .changes
        .iter()
        .find(|c| c.change_type == ChangeType::Added)
        .expect("addition detected");
    assert_eq!(added.path, "fieldTypes.image");
    assert_eq!(added.impact, ChangeImpact::Enhancement);

    assert_eq!(analysis.summary.breaking_changes, 1);
    assert_eq!(analysis.summary.enhancements, 1);
    assert_eq!(analysis.summary.severity_level, RiskLevel::Medium);

    assert_eq!(analysis.impact.overall_risk, RiskLevel::Medium);
    assert_eq!(analysis.impact.recommended_action, RecommendedAction::ScheduledUpdate);
    assert!(!analysis.impact.backward_compatible);

    let migration = analysis.migration_plan.phase(MIGRATION_PHASE).expect("migration phase");
    assert_eq!(migration.tasks.len(), 1);
    assert_eq!(migration.tasks[0].kind, TaskKind::CodeChange);
    assert_eq!(migration.tasks[0].source_change_ids, vec![removed.id.clone()]);

    assert!(analysis.compatibility.downgrade_restrictions[0].reason.contains("image"));
}

/// `max_fields` 50 -> 30 is a single breaking modification worth 4 hours.
#[test]
fn test_max_fields_tightened_scenario() {
    let old = base_schema("1.0.0");
    let mut new = base_schema("1.0.1");
    if let Some(requirements) = new.module_requirements.as_mut() {
        requirements.max_fields = 30;
    }

    let analysis = diff(&old, &new);

    assert_eq!(analysis.changes.len(), 1);
    let change = &analysis.changes[0];
    assert_eq!(change.change_type, ChangeType::Modified);
    assert_eq!(change.category, ChangeCategory::Requirement);
    assert_eq!(change.impact, ChangeImpact::Breaking);
    assert!(change.migration_required);
    assert_eq!(change.complexity, Complexity::Complex);
    assert_eq!(change.estimated_effort_hours, 4.0);

    // Requirement changes are prepared as configuration work
    let preparation = analysis.migration_plan.phase(PREPARATION_PHASE).expect("phase");
    assert_eq!(preparation.tasks.len(), 1);
    assert_eq!(preparation.tasks[0].kind, TaskKind::Configuration);
    let validation = analysis.migration_plan.phase(VALIDATION_PHASE).expect("phase");
    assert_eq!(validation.tasks.len(), 1);
    assert_eq!(analysis.migration_plan.total_estimated_hours, 6.0);
}

/// Relaxing a limit is non-breaking and needs no migration.
#[test]
fn test_max_fields_relaxed_scenario() {
    let old = base_schema("1.0.0");
    let mut new = base_schema("1.0.1");
    if let Some(requirements) = new.module_requirements.as_mut() {
        requirements.max_fields = 80;
    }

    let analysis = diff(&old, &new);

    assert_eq!(analysis.changes[0].impact, ChangeImpact::NonBreaking);
    assert!(!analysis.changes[0].migration_required);
    assert_eq!(analysis.migration_plan.task_count(), 0);
    assert!(analysis.impact.backward_compatible);
}

/// A large release escalates to critical risk and gradual migration.
#[test]
fn test_large_breaking_release() {
    let old = base_schema("1.0.0");
    let mut new = base_schema("2.0.0");
    new.field_types = vec![
        FieldTypeDefinition::new("text", &["name", "label", "id"]),
        FieldTypeDefinition::new("number", &["name", "label"]),
    ];
    new.content_types = vec!["BLOG_POST".to_string()];
    if let Some(requirements) = new.module_requirements.as_mut() {
        requirements.max_fields = 25;
        requirements.required_files.push("meta.json".to_string());
    }

    let analysis = diff(&old, &new);

    // richtext removed, id required, SITE_PAGE and LANDING_PAGE removed,
    // max_fields tightened, meta.json required
    assert_eq!(analysis.summary.breaking_changes, 6);
    assert_eq!(analysis.summary.severity_level, RiskLevel::Critical);
    assert_eq!(analysis.impact.recommended_action, RecommendedAction::GradualMigration);
    assert_eq!(analysis.compatibility.entries[0].risk_level, RiskLevel::Critical);

    let data_migrations = analysis
        .migration_plan
        .phases
        .iter()
        .flat_map(|p| &p.tasks)
        .filter(|t| t.kind == TaskKind::DataMigration)
        .count();
    assert_eq!(data_migrations, 2);
}

/// Forward compatibility is only ever what the caller says it is.
#[test]
fn test_forward_compatibility_passthrough() {
    let old = base_schema("1.0.0");
    let new = image_schema("1.1.0");

    assert_eq!(diff(&old, &new).impact.forward_compatibility, None);
    let analysis =
        diff_with_options(&old, &new, &DiffOptions { forward_compatibility: Some(true) });
    assert_eq!(analysis.impact.forward_compatibility, Some(true));
}
