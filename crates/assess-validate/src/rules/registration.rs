//! The standard registration rule set.

use assess_model::messages::{self, fill_template};
use assess_model::{CourseStatus, FieldCode, IssueCode, ValidationIssue};

use super::{RuleId, RuleSettings, StudentRuleData, ValidationRule};

fn is_active(data: &StudentRuleData) -> bool {
    data.candidate.record.course_status == CourseStatus::Active
}

/// The submitted PEN must belong to a student in the registry.
pub struct PenRule;

impl ValidationRule for PenRule {
    fn id(&self) -> RuleId {
        RuleId::PenValidity
    }

    fn priority(&self) -> u32 {
        10
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue> {
        if data.student.is_some() {
            return Vec::new();
        }
        let pen = &data.candidate.record.pen;
        vec![
            ValidationIssue::error(
                FieldCode::Pen,
                IssueCode::PenInvalid,
                fill_template(messages::PEN_INVALID, &[pen]),
            )
            .with_rejected_value(pen.as_str()),
        ]
    }
}

/// The school of record must exist and be open.
pub struct SchoolOfRecordRule;

impl ValidationRule for SchoolOfRecordRule {
    fn id(&self) -> RuleId {
        RuleId::SchoolOfRecord
    }

    fn priority(&self) -> u32 {
        20
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue> {
        if data
            .school_of_record
            .as_ref()
            .is_some_and(|school| school.is_open_on(data.today))
        {
            return Vec::new();
        }
        let submitted = data.candidate.record.school_of_record.as_str();
        vec![
            ValidationIssue::error(
                FieldCode::SchoolOfRecord,
                IssueCode::SchoolInvalid,
                fill_template(messages::SCHOOL_INVALID, &[&submitted]),
            )
            .with_rejected_value(submitted),
        ]
    }
}

/// A submitted assessment centre must exist and be open.
pub struct AssessmentCentreRule;

impl ValidationRule for AssessmentCentreRule {
    fn id(&self) -> RuleId {
        RuleId::AssessmentCentre
    }

    fn priority(&self) -> u32 {
        30
    }

    fn should_execute(&self, data: &StudentRuleData, _issues: &[ValidationIssue]) -> bool {
        data.candidate.record.assessment_centre.is_some()
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue> {
        if data
            .assessment_centre
            .as_ref()
            .is_some_and(|centre| centre.is_open_on(data.today))
        {
            return Vec::new();
        }
        let submitted = data
            .candidate
            .record
            .assessment_centre
            .as_deref()
            .unwrap_or_default();
        vec![
            ValidationIssue::error(
                FieldCode::AssessmentCentre,
                IssueCode::AssessmentCentreInvalid,
                fill_template(messages::ASSESSMENT_CENTRE_INVALID, &[&submitted]),
            )
            .with_rejected_value(submitted),
        ]
    }
}

/// The assessment must be offered and active in the session.
pub struct AssessmentRule;

impl ValidationRule for AssessmentRule {
    fn id(&self) -> RuleId {
        RuleId::AssessmentValidity
    }

    fn priority(&self) -> u32 {
        40
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue> {
        if data.assessment.as_ref().is_some_and(|a| a.active) {
            return Vec::new();
        }
        let assessment_type = data.candidate.assessment_type.as_str();
        vec![ValidationIssue::error(
            FieldCode::AssessmentType,
            IssueCode::AssessmentInvalid,
            fill_template(messages::ASSESSMENT_INVALID, &[&assessment_type]),
        )]
    }
}

/// One registration per student and assessment.
pub struct DuplicateRegistrationRule;

impl ValidationRule for DuplicateRegistrationRule {
    fn id(&self) -> RuleId {
        RuleId::DuplicateRegistration
    }

    fn priority(&self) -> u32 {
        50
    }

    fn should_execute(&self, data: &StudentRuleData, _issues: &[ValidationIssue]) -> bool {
        is_active(data)
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue> {
        let Some(assessment) = &data.assessment else {
            return Vec::new();
        };
        let duplicate = data.other_registrations().any(|reg| {
            reg.assessment_id == assessment.id && reg.session_id == data.candidate.session_id
        });
        if !duplicate {
            return Vec::new();
        }
        vec![ValidationIssue::error(
            FieldCode::AssessmentType,
            IssueCode::DuplicateRegistration,
            fill_template(
                messages::DUPLICATE_REGISTRATION,
                &[&data.candidate.assessment_type],
            ),
        )]
    }
}

/// Completed attempts per assessment family are capped.
pub struct MaxAttemptsRule {
    settings: RuleSettings,
}

impl MaxAttemptsRule {
    pub fn new(settings: RuleSettings) -> Self {
        Self { settings }
    }
}

impl ValidationRule for MaxAttemptsRule {
    fn id(&self) -> RuleId {
        RuleId::MaxAttempts
    }

    fn priority(&self) -> u32 {
        60
    }

    fn should_execute(&self, data: &StudentRuleData, _issues: &[ValidationIssue]) -> bool {
        is_active(data)
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue> {
        let assessment_type = data.candidate.assessment_type.as_str();
        let attempts = data
            .other_registrations()
            .filter(|reg| reg.has_written())
            .filter(|reg| self.settings.same_family(&reg.assessment_type, assessment_type))
            .count();
        if attempts < self.settings.max_attempts {
            return Vec::new();
        }
        vec![ValidationIssue::error(
            FieldCode::AssessmentType,
            IssueCode::NumberOfAttemptsExceeded,
            fill_template(
                messages::NUMBER_OF_ATTEMPTS_EXCEEDED,
                &[&assessment_type, &self.settings.max_attempts],
            ),
        )]
    }
}

/// Francophone (CSF) schools cannot register students for French immersion.
pub struct FrenchImmersionRule {
    settings: RuleSettings,
}

impl FrenchImmersionRule {
    pub fn new(settings: RuleSettings) -> Self {
        Self { settings }
    }
}

impl ValidationRule for FrenchImmersionRule {
    fn id(&self) -> RuleId {
        RuleId::FrenchImmersion
    }

    fn priority(&self) -> u32 {
        70
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue> {
        let immersion = data
            .candidate
            .assessment_type
            .eq_ignore_ascii_case(&self.settings.french_immersion_type);
        let csf = data
            .school_of_record
            .as_ref()
            .and_then(|school| school.reporting_requirement.as_deref())
            .is_some_and(|req| req.eq_ignore_ascii_case(&self.settings.csf_reporting_requirement));
        if !(immersion && csf) {
            return Vec::new();
        }
        vec![ValidationIssue::error(
            FieldCode::AssessmentType,
            IssueCode::CsfFrenchImmersion,
            fill_template(
                messages::CSF_FRENCH_IMMERSION,
                &[&data.candidate.assessment_type],
            ),
        )]
    }
}

/// Submitted legal names must match the registry.
pub struct DemographicRule;

fn normalized(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn name_mismatch(
    field: FieldCode,
    code: IssueCode,
    label: &str,
    submitted: Option<&str>,
    ministry: Option<&str>,
) -> Option<ValidationIssue> {
    let message = match (normalized(submitted), normalized(ministry)) {
        (None, None) => return None,
        (Some(s), Some(m)) if s.eq_ignore_ascii_case(m) => return None,
        (None, Some(m)) => fill_template(messages::DEMOGRAPHIC_SUBMITTED_BLANK, &[&label, &m]),
        (Some(s), None) => fill_template(messages::DEMOGRAPHIC_MINISTRY_BLANK, &[&label, &s]),
        (Some(s), Some(m)) => fill_template(messages::DEMOGRAPHIC_DIFFERENT, &[&label, &s, &m]),
    };
    let issue = ValidationIssue::error(field, code, message);
    Some(match normalized(submitted) {
        Some(s) => issue.with_rejected_value(s),
        None => issue,
    })
}

impl ValidationRule for DemographicRule {
    fn id(&self) -> RuleId {
        RuleId::Demographics
    }

    fn priority(&self) -> u32 {
        80
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue> {
        let Some(student) = &data.student else {
            return Vec::new();
        };
        let record = &data.candidate.record;
        [
            name_mismatch(
                FieldCode::Surname,
                IssueCode::SurnameMismatch,
                "Surname",
                record.surname.as_deref(),
                student.legal_surname.as_deref(),
            ),
            name_mismatch(
                FieldCode::GivenName,
                IssueCode::GivenNameMismatch,
                "Given name",
                record.given_name.as_deref(),
                student.legal_given_name.as_deref(),
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// A written assessment cannot be withdrawn.
pub struct WithdrawalRule;

impl ValidationRule for WithdrawalRule {
    fn id(&self) -> RuleId {
        RuleId::WithdrawalGuard
    }

    fn priority(&self) -> u32 {
        90
    }

    fn should_execute(&self, data: &StudentRuleData, _issues: &[ValidationIssue]) -> bool {
        data.candidate.record.course_status == CourseStatus::Withdrawn
    }

    fn execute_validation(&self, data: &StudentRuleData) -> Vec<ValidationIssue> {
        if !data
            .current_registration()
            .is_some_and(|reg| reg.has_written())
        {
            return Vec::new();
        }
        vec![
            ValidationIssue::error(
                FieldCode::CourseStatus,
                IssueCode::WrittenAssessmentWithdrawal,
                fill_template(
                    messages::WRITTEN_ASSESSMENT_WITHDRAWAL,
                    &[&data.candidate.assessment_type],
                ),
            )
            .with_rejected_value(CourseStatus::Withdrawn.as_str()),
        ]
    }
}
