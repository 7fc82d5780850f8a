//! Business rules for student-registration candidates.
//!
//! # Architecture
//!
//! - [`ValidationRule`] - one rule: identity, priority, precondition, check
//! - [`DependencyTable`] - static rule ID to blocking issue codes
//! - [`RuleEngine`] - runs rules in priority order against one candidate
//! - [`StudentRuleData`] - the candidate plus the reference data it is
//!   checked against

mod data;
mod dependency;
mod engine;
mod registration;
mod settings;

use std::fmt;

use serde::{Deserialize, Serialize};

use assess_model::ValidationIssue;

pub use data::{RegistrationCandidate, StudentRuleData};
pub use dependency::{DependencyTable, Gate};
pub use engine::{RuleEngine, RuleRunReport};
pub use registration::{
    AssessmentCentreRule, AssessmentRule, DemographicRule, DuplicateRegistrationRule,
    FrenchImmersionRule, MaxAttemptsRule, PenRule, SchoolOfRecordRule, WithdrawalRule,
};
pub use settings::RuleSettings;

/// Identifier of a registration rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    PenValidity,
    SchoolOfRecord,
    AssessmentCentre,
    AssessmentValidity,
    DuplicateRegistration,
    MaxAttempts,
    FrenchImmersion,
    Demographics,
    WithdrawalGuard,
}

impl RuleId {
    pub const ALL: &'static [Self] = &[
        Self::PenValidity,
        Self::SchoolOfRecord,
        Self::AssessmentCentre,
        Self::AssessmentValidity,
        Self::DuplicateRegistration,
        Self::MaxAttempts,
        Self::FrenchImmersion,
        Self::Demographics,
        Self::WithdrawalGuard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PenValidity => "PEN_VALIDITY",
            Self::SchoolOfRecord => "SCHOOL_OF_RECORD",
            Self::AssessmentCentre => "ASSESSMENT_CENTRE",
            Self::AssessmentValidity => "ASSESSMENT_VALIDITY",
            Self::DuplicateRegistration => "DUPLICATE_REGISTRATION",
            Self::MaxAttempts => "MAX_ATTEMPTS",
            Self::FrenchImmersion => "FRENCH_IMMERSION",
            Self::Demographics => "DEMOGRAPHICS",
            Self::WithdrawalGuard => "WITHDRAWAL_GUARD",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for individual registration rules.
pub trait ValidationRule: Send + Sync {
    fn id(&self) -> RuleId;

    /// Lower runs earlier.
    fn priority(&self) -> u32;

    /// Rule-specific precondition, checked after the dependency table.
    ///
    /// Override when a rule only applies to some candidates.
    fn should_execute(&self, _data: &StudentRuleData, _issues: &[ValidationIssue]) -> bool {
        true
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue>;
}

/// What one rule contributed during one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRuleOutcome {
    pub rule_id: RuleId,
    pub executed: bool,
    pub issues: Vec<ValidationIssue>,
}
