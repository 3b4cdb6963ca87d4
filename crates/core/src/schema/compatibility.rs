//! Version compatibility matrix for a pair of schema versions

use modsync_domain::{
    ChangeCategory, ChangeType, CompatibilityEntry, CompatibilityMatrix, DetailedChange,
    DowngradeRestriction, RiskLevel, UpgradePath,
};

use super::impact::element_key;

/// Build the matrix describing the move from `from` to `to`
pub fn build_matrix(from: &str, to: &str, changes: &[DetailedChange]) -> CompatibilityMatrix {
    let breaking = changes.iter().filter(|c| c.is_breaking()).count();
    let effort: f64 = changes.iter().map(|c| c.estimated_effort_hours).sum();

    CompatibilityMatrix {
        versions: vec![from.to_string(), to.to_string()],
        entries: vec![CompatibilityEntry {
            from: from.to_string(),
            to: to.to_string(),
            compatible: true,
            migration_required: breaking > 0,
            risk_level: RiskLevel::from_breaking_count(breaking),
        }],
        upgrade_paths: vec![UpgradePath {
            from: from.to_string(),
            to: to.to_string(),
            steps: vec![format!("Apply schema {to} over {from}")],
            estimated_effort_hours: effort,
            recommended: true,
        }],
        downgrade_restrictions: vec![DowngradeRestriction {
            from: to.to_string(),
            to: from.to_string(),
            reason: downgrade_reason(to, changes),
        }],
    }
}

fn downgrade_reason(to: &str, changes: &[DetailedChange]) -> String {
    let added = |category: ChangeCategory| -> Vec<&str> {
        changes
            .iter()
            .filter(|c| c.change_type == ChangeType::Added && c.category == category)
            .filter_map(|c| element_key(&c.path).map(|(_, name)| name))
            .collect()
    };
    let field_types = added(ChangeCategory::FieldType);
    let content_types = added(ChangeCategory::ContentType);

    let mut reason = format!("Downgrading may lose features added in {to}");
    let mut lost = Vec::new();
    if !field_types.is_empty() {
        lost.push(format!("field types {}", field_types.join(", ")));
    }
    if !content_types.is_empty() {
        lost.push(format!("content types {}", content_types.join(", ")));
    }
    if !lost.is_empty() {
        reason.push_str(": ");
        reason.push_str(&lost.join("; "));
    }
    reason
}
