//! Validation rule sinks
//!
//! The rule bodies are opaque here. A real validator plugs in through the
//! `ValidationRuleSink` port; these adapters only record the hand-off.

use async_trait::async_trait;
use modsync_core::ValidationRuleSink;
use modsync_domain::{Result, ValidationRuleDefinition};
use tracing::info;

/// Logs every rule it receives
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRuleSink;

#[async_trait]
impl ValidationRuleSink for LoggingRuleSink {
    async fn register_rules(&self, rules: &[ValidationRuleDefinition]) -> Result<()> {
        for rule in rules {
            info!(
                rule_id = %rule.id,
                severity = %rule.severity,
                description = %rule.description,
                "Registered validation rule"
            );
        }
        Ok(())
    }
}

/// Accepts and discards rules
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRuleSink;

#[async_trait]
impl ValidationRuleSink for NoopRuleSink {
    async fn register_rules(&self, _rules: &[ValidationRuleDefinition]) -> Result<()> {
        Ok(())
    }
}
