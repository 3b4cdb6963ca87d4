//! Migration plan construction
//!
//! Every change that requires migration becomes a task in one of three
//! fixed phases, run in order:
//!
//! | Phase | Tasks | Duration |
//! |-------|-------|----------|
//! | preparation | one configuration task per requirement or rule change | 2h when it has tasks |
//! | migration | code changes (field types, properties) and data migrations (content types) | sum of source efforts |
//! | validation | one test per migration task plus a final schema check | 4h when there is anything to migrate |
//!
//! A diff with nothing to migrate yields the same three phases, empty and
//! with zero duration.

use modsync_domain::constants::{PREPARATION_PHASE_HOURS, VALIDATION_PHASE_HOURS};
use modsync_domain::{
    ChangeCategory, DetailedChange, MigrationPhase, MigrationPlan, MigrationTask, TaskKind,
};
use uuid::Uuid;

pub const PREPARATION_PHASE: &str = "preparation";
pub const MIGRATION_PHASE: &str = "migration";
pub const VALIDATION_PHASE: &str = "validation";

/// Build the phased plan for moving modules from `from_version` to
/// `to_version`
pub fn build_plan(from_version: &str, to_version: &str, changes: &[DetailedChange]) -> MigrationPlan {
    let mut ids = TaskIds::default();
    let required: Vec<&DetailedChange> = changes.iter().filter(|c| c.migration_required).collect();

    let mut preparation_tasks = Vec::new();
    let mut migration_tasks = Vec::new();

    for change in &required {
        match change.category {
            ChangeCategory::Requirement | ChangeCategory::ValidationRule => {
                preparation_tasks.push(MigrationTask {
                    id: ids.next(),
                    description: format!("Update module configuration: {}", change.description),
                    kind: TaskKind::Configuration,
                    source_change_ids: vec![change.id.clone()],
                    estimated_hours: change.estimated_effort_hours,
                });
            }
            ChangeCategory::FieldType | ChangeCategory::Property => {
                migration_tasks.push(MigrationTask {
                    id: ids.next(),
                    description: format!("Update module code: {}", change.description),
                    kind: TaskKind::CodeChange,
                    source_change_ids: vec![change.id.clone()],
                    estimated_hours: change.estimated_effort_hours,
                });
            }
            ChangeCategory::ContentType => {
                migration_tasks.push(MigrationTask {
                    id: ids.next(),
                    description: format!("Migrate existing content: {}", change.description),
                    kind: TaskKind::DataMigration,
                    source_change_ids: vec![change.id.clone()],
                    estimated_hours: change.estimated_effort_hours,
                });
            }
        }
    }

    let mut validation_tasks: Vec<MigrationTask> = migration_tasks
        .iter()
        .map(|task| MigrationTask {
            id: ids.next(),
            description: format!("Test modules after: {}", task.description),
            kind: TaskKind::Testing,
            source_change_ids: task.source_change_ids.clone(),
            estimated_hours: 0.0,
        })
        .collect();
    if !required.is_empty() {
        validation_tasks.push(MigrationTask {
            id: ids.next(),
            description: format!("Validate all modules against schema {to_version}"),
            kind: TaskKind::Validation,
            source_change_ids: required.iter().map(|c| c.id.clone()).collect(),
            estimated_hours: VALIDATION_PHASE_HOURS,
        });
    }

    let preparation_hours =
        if preparation_tasks.is_empty() { 0.0 } else { PREPARATION_PHASE_HOURS };
    let migration_hours = migration_tasks.iter().map(|t| t.estimated_hours).sum();
    let validation_hours = if required.is_empty() { 0.0 } else { VALIDATION_PHASE_HOURS };

    let phases = vec![
        MigrationPhase {
            name: PREPARATION_PHASE.to_string(),
            tasks: preparation_tasks,
            estimated_hours: preparation_hours,
            dependencies: Vec::new(),
            success_criteria: vec![
                "Module configuration reflects the new requirements".to_string(),
                "Rule changes reviewed with module owners".to_string(),
            ],
        },
        MigrationPhase {
            name: MIGRATION_PHASE.to_string(),
            tasks: migration_tasks,
            estimated_hours: migration_hours,
            dependencies: vec![PREPARATION_PHASE.to_string()],
            success_criteria: vec![
                "No module references a removed field or content type".to_string(),
                "Newly required properties are set on every field".to_string(),
            ],
        },
        MigrationPhase {
            name: VALIDATION_PHASE.to_string(),
            tasks: validation_tasks,
            estimated_hours: validation_hours,
            dependencies: vec![MIGRATION_PHASE.to_string()],
            success_criteria: vec![format!("All modules validate against schema {to_version}")],
        },
    ];

    MigrationPlan {
        id: Uuid::now_v7().to_string(),
        from_version: from_version.to_string(),
        to_version: to_version.to_string(),
        total_estimated_hours: phases.iter().map(|p| p.estimated_hours).sum(),
        phases,
        prerequisites: vec![
            "Back up all current modules".to_string(),
            "Provision a staging environment".to_string(),
            "Review every breaking change".to_string(),
        ],
        rollback_strategy: format!(
            "Restore schema version {from_version} from the change log and re-validate modules \
             against it"
        ),
    }
}

#[derive(Default)]
struct TaskIds(usize);

impl TaskIds {
    fn next(&mut self) -> String {
        self.0 += 1;
        format!("task-{:03}", self.0)
    }
}
