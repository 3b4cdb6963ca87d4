//! Domain types and models

pub mod credentials;
pub mod diff;
pub mod schema;
pub mod sync;

pub use credentials::Credentials;
pub use diff::{
    ChangeCategory, ChangeImpact, ChangeType, CompatibilityEntry, CompatibilityMatrix, Complexity,
    DetailedChange, DiffAnalysis, DiffOptions, DiffSummary, DowngradeRestriction,
    ImpactAssessment, MigrationPhase, MigrationPlan, MigrationTask, RecommendedAction, RiskLevel,
    SeverityLevel, TaskKind, UpgradePath,
};
pub use schema::{
    DeprecatedFeature, FieldTypeDefinition, ModuleRequirements, RuleSeverity, SchemaDefinition,
    SchemaVersion, ValidationRuleDefinition,
};
pub use sync::{ChangeLogEntry, SchemaUpdateEvent, SchemaUpdateResult, SyncState, SyncStatus};
