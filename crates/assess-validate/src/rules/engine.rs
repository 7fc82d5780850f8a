use std::sync::Arc;

use serde::Serialize;

use assess_model::ValidationIssue;

use super::registration::{
    AssessmentCentreRule, AssessmentRule, DemographicRule, DuplicateRegistrationRule,
    FrenchImmersionRule, MaxAttemptsRule, PenRule, SchoolOfRecordRule, WithdrawalRule,
};
use super::{DependencyTable, RuleSettings, StudentRuleData, ValidationRule, ValidationRuleOutcome};

/// Outcome of one engine run over one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRunReport {
    /// One entry per registered rule, in execution order.
    pub outcomes: Vec<ValidationRuleOutcome>,
    /// Every issue, in emission order.
    pub issues: Vec<ValidationIssue>,
}

impl RuleRunReport {
    /// The candidate is accepted only when no rule emitted an issue.
    pub fn is_accepted(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Executes registration rules in priority order.
pub struct RuleEngine {
    rules: Vec<Arc<dyn ValidationRule>>,
    dependencies: DependencyTable,
}

impl RuleEngine {
    pub fn new(dependencies: DependencyTable) -> Self {
        Self {
            rules: Vec::new(),
            dependencies,
        }
    }

    /// The full registration rule set with its standard dependency table.
    pub fn standard(settings: &RuleSettings) -> Self {
        let mut engine = Self::new(DependencyTable::standard());
        engine.add_rule(Arc::new(PenRule));
        engine.add_rule(Arc::new(SchoolOfRecordRule));
        engine.add_rule(Arc::new(AssessmentCentreRule));
        engine.add_rule(Arc::new(AssessmentRule));
        engine.add_rule(Arc::new(DuplicateRegistrationRule));
        engine.add_rule(Arc::new(MaxAttemptsRule::new(settings.clone())));
        engine.add_rule(Arc::new(FrenchImmersionRule::new(settings.clone())));
        engine.add_rule(Arc::new(DemographicRule));
        engine.add_rule(Arc::new(WithdrawalRule));
        engine
    }

    /// Add a rule, keeping the list sorted by priority.
    pub fn add_rule(&mut self, rule: Arc<dyn ValidationRule>) {
        self.rules.push(rule);
        self.rules.sort_by_key(|rule| rule.priority());
    }

    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn ValidationRule>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule against one candidate.
    ///
    /// Gates see only this candidate's own accumulated issues.
    pub fn run(&self, data: &StudentRuleData) -> RuleRunReport {
        let mut report = RuleRunReport::default();
        for rule in &self.rules {
            let id = rule.id();
            let executed = self.dependencies.allows(id, &report.issues)
                && rule.should_execute(data, &report.issues);
            let issues = if executed {
                rule.execute_validation(data)
            } else {
                Vec::new()
            };
            if !issues.is_empty() {
                tracing::debug!(rule = %id, issues = issues.len(), "rule emitted issues");
            }
            report.issues.extend(issues.iter().cloned());
            report.outcomes.push(ValidationRuleOutcome {
                rule_id: id,
                executed,
                issues,
            });
        }
        report
    }
}
