use std::collections::HashMap;

use assess_model::{IssueCode, ValidationIssue};

use super::RuleId;

/// When a rule may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// No dependency; always runs.
    Always,
    /// Suppressed once any of these issue codes has been emitted.
    BlockedBy(Vec<IssueCode>),
}

/// Static rule ID to blocking issue-code table.
///
/// A rule without an entry never runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyTable {
    gates: HashMap<RuleId, Gate>,
}

impl DependencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (RuleId, Gate)>) -> Self {
        Self {
            gates: entries.into_iter().collect(),
        }
    }

    /// Gates for the standard registration rule set.
    pub fn standard() -> Self {
        use IssueCode::{AssessmentInvalid, DuplicateRegistration, PenInvalid, SchoolInvalid};

        Self::from_entries([
            (RuleId::PenValidity, Gate::Always),
            (RuleId::SchoolOfRecord, Gate::Always),
            (RuleId::AssessmentCentre, Gate::Always),
            (RuleId::AssessmentValidity, Gate::Always),
            (
                RuleId::DuplicateRegistration,
                Gate::BlockedBy(vec![PenInvalid, AssessmentInvalid]),
            ),
            (
                RuleId::MaxAttempts,
                Gate::BlockedBy(vec![PenInvalid, AssessmentInvalid, DuplicateRegistration]),
            ),
            (
                RuleId::FrenchImmersion,
                Gate::BlockedBy(vec![SchoolInvalid, AssessmentInvalid]),
            ),
            (RuleId::Demographics, Gate::BlockedBy(vec![PenInvalid])),
            (
                RuleId::WithdrawalGuard,
                Gate::BlockedBy(vec![PenInvalid, AssessmentInvalid]),
            ),
        ])
    }

    pub fn insert(&mut self, rule: RuleId, gate: Gate) {
        self.gates.insert(rule, gate);
    }

    pub fn gate(&self, rule: RuleId) -> Option<&Gate> {
        self.gates.get(&rule)
    }

    /// Whether `rule` may run given the issues emitted so far.
    pub fn allows(&self, rule: RuleId, issues: &[ValidationIssue]) -> bool {
        match self.gates.get(&rule) {
            None => false,
            Some(Gate::Always) => true,
            Some(Gate::BlockedBy(codes)) => !issues.iter().any(|i| codes.contains(&i.code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_model::FieldCode;

    #[test]
    fn test_missing_entry_fails_closed() {
        let table = DependencyTable::new();
        assert!(!table.allows(RuleId::PenValidity, &[]));
    }

    #[test]
    fn test_blocked_by_emitted_code() {
        let table = DependencyTable::standard();
        let pen = ValidationIssue::error(FieldCode::Pen, IssueCode::PenInvalid, "x");
        assert!(table.allows(RuleId::Demographics, &[]));
        assert!(!table.allows(RuleId::Demographics, &[pen.clone()]));
        assert!(table.allows(RuleId::SchoolOfRecord, &[pen]));
    }

    #[test]
    fn test_standard_table_covers_every_rule() {
        let table = DependencyTable::standard();
        for rule in RuleId::ALL {
            assert!(table.gate(*rule).is_some(), "{rule}");
        }
    }
}
