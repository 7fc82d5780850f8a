use chrono::NaiveDate;

use assess_model::{
    Assessment, RegistrationId, RegistrationRecord, School, SessionId, Student,
    StudentRegistration,
};

/// A registration row about to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationCandidate {
    pub record: RegistrationRecord,
    pub session_id: SessionId,
    pub assessment_type: String,
    /// Set when the candidate updates or withdraws an existing registration.
    pub registration_id: Option<RegistrationId>,
}

/// Everything the rule set needs to judge one candidate.
///
/// Lookups that found nothing are `None`; rules decide what absence means.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRuleData {
    pub candidate: RegistrationCandidate,
    /// The resolved active student.
    pub student: Option<Student>,
    pub school_of_record: Option<School>,
    pub assessment_centre: Option<School>,
    pub assessment: Option<Assessment>,
    /// The student's registrations in every session, including changes
    /// pending from earlier rows of the same file.
    pub registrations: Vec<StudentRegistration>,
    pub today: NaiveDate,
}

impl StudentRuleData {
    /// Registrations other than the candidate's own.
    pub fn other_registrations(&self) -> impl Iterator<Item = &StudentRegistration> {
        let own = self.candidate.registration_id.as_ref();
        self.registrations
            .iter()
            .filter(move |reg| Some(&reg.id) != own)
    }

    /// Registration for the candidate's assessment in this session, if any.
    pub fn current_registration(&self) -> Option<&StudentRegistration> {
        let assessment = self.assessment.as_ref()?;
        self.registrations.iter().find(|reg| {
            reg.assessment_id == assessment.id && reg.session_id == self.candidate.session_id
        })
    }
}
