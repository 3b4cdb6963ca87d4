//! Schema diff results
//!
//! Everything here is derived from a pair of schema snapshots and recomputed
//! on every diff. Only `changes` and `summary` outlive the update that
//! produced them (via the change log).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{HIGH_RISK_MAX_BREAKING, MEDIUM_RISK_MAX_BREAKING};

/// What happened to a schema element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Deprecated,
}

crate::impl_domain_status_conversions!(ChangeType {
    Added => "added",
    Removed => "removed",
    Modified => "modified",
    Deprecated => "deprecated"
});

/// Which part of the schema a change touches
///
/// Declaration order is the sort order of a diff's change list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    FieldType,
    ContentType,
    ValidationRule,
    Requirement,
    Property,
}

crate::impl_domain_status_conversions!(ChangeCategory {
    FieldType => "field_type",
    ContentType => "content_type",
    ValidationRule => "validation_rule",
    Requirement => "requirement",
    Property => "property"
});

/// Effect of a change on existing modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeImpact {
    /// Previously valid modules may fail validation
    Breaking,
    NonBreaking,
    /// Adds capability without affecting existing modules
    Enhancement,
}

crate::impl_domain_status_conversions!(ChangeImpact {
    Breaking => "breaking",
    NonBreaking => "non-breaking",
    Enhancement => "enhancement"
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

crate::impl_domain_status_conversions!(Complexity {
    Simple => "simple",
    Moderate => "moderate",
    Complex => "complex"
});

/// Graded risk, used for both diff severity and overall impact risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

crate::impl_domain_status_conversions!(RiskLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical"
});

impl RiskLevel {
    /// Grade a breaking-change count: 0 low, up to 2 medium, up to 5 high,
    /// otherwise critical
    pub fn from_breaking_count(breaking: usize) -> Self {
        match breaking {
            0 => Self::Low,
            n if n <= MEDIUM_RISK_MAX_BREAKING => Self::Medium,
            n if n <= HIGH_RISK_MAX_BREAKING => Self::High,
            _ => Self::Critical,
        }
    }
}

/// Severity of a diff as a whole
pub type SeverityLevel = RiskLevel;

/// One detected difference between two schema versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedChange {
    /// Stable within a diff: derived from category, change type, and path
    pub id: String,
    pub change_type: ChangeType,
    pub category: ChangeCategory,
    /// Dotted location, e.g. `fieldTypes.richtext.requiredProperties.alt`
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    pub description: String,
    pub impact: ChangeImpact,
    pub migration_required: bool,
    pub complexity: Complexity,
    pub estimated_effort_hours: f64,
}

impl DetailedChange {
    pub fn is_breaking(&self) -> bool {
        self.impact == ChangeImpact::Breaking
    }
}

/// Counts over a diff's changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub total_changes: usize,
    pub breaking_changes: usize,
    pub non_breaking_changes: usize,
    pub enhancements: usize,
    pub additions: usize,
    pub removals: usize,
    pub modifications: usize,
    pub deprecations: usize,
    pub severity_level: SeverityLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    ImmediateUpdate,
    ScheduledUpdate,
    GradualMigration,
}

crate::impl_domain_status_conversions!(RecommendedAction {
    ImmediateUpdate => "immediate_update",
    ScheduledUpdate => "scheduled_update",
    GradualMigration => "gradual_migration"
});

/// Estimated effect of applying a diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub overall_risk: RiskLevel,
    /// Distinct field and content types touched by breaking changes
    pub affected_modules_estimate: usize,
    pub breaking_change_count: usize,
    pub migration_required_count: usize,
    pub total_effort_hours: f64,
    pub backward_compatible: bool,
    /// Caller-supplied; `None` means unknown
    pub forward_compatibility: Option<bool>,
    pub recommended_action: RecommendedAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Configuration,
    CodeChange,
    DataMigration,
    Testing,
    Validation,
}

crate::impl_domain_status_conversions!(TaskKind {
    Configuration => "configuration",
    CodeChange => "code_change",
    DataMigration => "data_migration",
    Testing => "testing",
    Validation => "validation"
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationTask {
    pub id: String,
    pub description: String,
    pub kind: TaskKind,
    /// Ids of the [`DetailedChange`]s this task addresses
    pub source_change_ids: Vec<String>,
    pub estimated_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPhase {
    pub name: String,
    pub tasks: Vec<MigrationTask>,
    pub estimated_hours: f64,
    /// Names of phases that must finish first
    pub dependencies: Vec<String>,
    pub success_criteria: Vec<String>,
}

/// Phased task list for adapting existing modules to a new schema version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub id: String,
    pub from_version: String,
    pub to_version: String,
    /// Always preparation, migration, validation, in that order
    pub phases: Vec<MigrationPhase>,
    pub total_estimated_hours: f64,
    pub prerequisites: Vec<String>,
    pub rollback_strategy: String,
}

impl MigrationPlan {
    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }

    pub fn phase(&self, name: &str) -> Option<&MigrationPhase> {
        self.phases.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityEntry {
    pub from: String,
    pub to: String,
    pub compatible: bool,
    pub migration_required: bool,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradePath {
    pub from: String,
    pub to: String,
    pub steps: Vec<String>,
    pub estimated_effort_hours: f64,
    pub recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowngradeRestriction {
    pub from: String,
    pub to: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityMatrix {
    pub versions: Vec<String>,
    pub entries: Vec<CompatibilityEntry>,
    pub upgrade_paths: Vec<UpgradePath>,
    pub downgrade_restrictions: Vec<DowngradeRestriction>,
}

/// Full output of diffing two schema snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffAnalysis {
    pub from_version: String,
    pub to_version: String,
    pub changes: Vec<DetailedChange>,
    pub summary: DiffSummary,
    pub impact: ImpactAssessment,
    pub migration_plan: MigrationPlan,
    pub compatibility: CompatibilityMatrix,
}

impl DiffAnalysis {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn breaking_changes(&self) -> impl Iterator<Item = &DetailedChange> {
        self.changes.iter().filter(|c| c.is_breaking())
    }
}

/// Caller-supplied inputs the diff cannot derive on its own
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Whether modules built for the newer version also validate against
    /// the older one; passed through to [`ImpactAssessment`]
    pub forward_compatibility: Option<bool>,
}
