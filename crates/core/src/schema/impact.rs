//! Impact assessment over a classified change list

use std::collections::BTreeSet;

use modsync_domain::{
    ChangeCategory, DetailedChange, DiffOptions, ImpactAssessment, RecommendedAction, RiskLevel,
};

/// Grade the overall risk of applying `changes`
pub fn assess(changes: &[DetailedChange], options: &DiffOptions) -> ImpactAssessment {
    let breaking_change_count = changes.iter().filter(|c| c.is_breaking()).count();
    let migration_required_count = changes.iter().filter(|c| c.migration_required).count();
    let total_effort_hours = changes.iter().map(|c| c.estimated_effort_hours).sum();
    let overall_risk = RiskLevel::from_breaking_count(breaking_change_count);

    ImpactAssessment {
        overall_risk,
        affected_modules_estimate: affected_types(changes),
        breaking_change_count,
        migration_required_count,
        total_effort_hours,
        backward_compatible: breaking_change_count == 0,
        forward_compatibility: options.forward_compatibility,
        recommended_action: recommend(overall_risk, breaking_change_count),
    }
}

fn recommend(risk: RiskLevel, breaking: usize) -> RecommendedAction {
    match risk {
        RiskLevel::Critical => RecommendedAction::GradualMigration,
        RiskLevel::High => RecommendedAction::ScheduledUpdate,
        _ if breaking > 0 => RecommendedAction::ScheduledUpdate,
        _ => RecommendedAction::ImmediateUpdate,
    }
}

/// Distinct field and content types touched by breaking changes
fn affected_types(changes: &[DetailedChange]) -> usize {
    changes
        .iter()
        .filter(|c| c.is_breaking())
        .filter_map(|c| match c.category {
            ChangeCategory::FieldType | ChangeCategory::Property | ChangeCategory::ContentType => {
                element_key(&c.path)
            }
            ChangeCategory::ValidationRule | ChangeCategory::Requirement => None,
        })
        .collect::<BTreeSet<_>>()
        .len()
}

/// `fieldTypes.image.requiredProperties.alt` -> `fieldTypes.image`
pub(crate) fn element_key(path: &str) -> Option<(&str, &str)> {
    let mut segments = path.splitn(3, '.');
    Some((segments.next()?, segments.next()?))
}
