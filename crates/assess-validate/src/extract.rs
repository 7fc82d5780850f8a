//! Field specs and record extraction for each file category.

use assess_model::messages::{self, fill_template};
use assess_model::{
    CourseStatus, FieldCode, FieldError, IssueCode, KeyRecord, Pen, RegistrationRecord,
    ResultRecord, ValidationIssue,
};

use crate::row::{CheckedFields, FieldSpec, RowRecord};

/// Cells in the open-ended marks column.
pub const OPEN_ENDED_CELLS: usize = 10;
/// Characters per open-ended mark cell.
pub const OPEN_ENDED_CELL_WIDTH: usize = 4;
/// Characters allowed in the multiple-choice marks column besides space.
pub const MC_MARK_CHARS: &str = "ABCD*";

pub const ITEM_TYPES: &[&str] = &["MC", "OE", "WR"];

// === Key files ===

static KEY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(FieldCode::AssessmentSession, IssueCode::InvalidAssessmentSession)
        .required()
        .digits(6),
    FieldSpec::new(FieldCode::AssessmentCode, IssueCode::InvalidAssessmentCode)
        .required()
        .max_length(10),
    FieldSpec::new(FieldCode::FormCode, IssueCode::InvalidFormCode)
        .required()
        .max_length(20),
    FieldSpec::new(FieldCode::QuestionNumber, IssueCode::InvalidQuestionNumber)
        .required()
        .integer_between(1, 999),
    FieldSpec::new(FieldCode::ItemType, IssueCode::InvalidItemType)
        .required()
        .allowed(ITEM_TYPES),
    FieldSpec::new(FieldCode::CorrectAnswer, IssueCode::InvalidCorrectAnswer).max_length(10),
    FieldSpec::new(FieldCode::MarkValue, IssueCode::InvalidMarkValue)
        .required()
        .integer(),
    FieldSpec::new(FieldCode::CognitiveLevel, IssueCode::InvalidCognitiveLevel).max_length(10),
    FieldSpec::new(FieldCode::TaskCode, IssueCode::InvalidTaskCode).max_length(10),
    FieldSpec::new(FieldCode::ClaimCode, IssueCode::InvalidClaimCode).max_length(10),
    FieldSpec::new(FieldCode::ContextCode, IssueCode::InvalidContextCode).max_length(10),
    FieldSpec::new(FieldCode::ConceptCode, IssueCode::InvalidConceptCode).max_length(10),
    FieldSpec::new(FieldCode::ScaleFactor, IssueCode::InvalidScaleFactor).decimal(),
    FieldSpec::new(FieldCode::IrtColumn, IssueCode::InvalidIrtColumn).integer(),
    FieldSpec::new(FieldCode::SectionCode, IssueCode::InvalidSectionCode).max_length(10),
];

/// Session and assessment type a key file name commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScope {
    pub session_token: String,
    pub assessment_type: String,
}

impl KeyScope {
    pub fn new(session_token: impl Into<String>, assessment_type: impl Into<String>) -> Self {
        Self {
            session_token: session_token.into(),
            assessment_type: assessment_type.into().to_ascii_uppercase(),
        }
    }

    /// `{type}{YYYYMM}` followed by exactly one form letter.
    fn form_code_matches(&self, form_code: &str) -> bool {
        let prefix = format!("{}{}", self.assessment_type, self.session_token);
        let Some(head) = form_code.get(..prefix.len()) else {
            return false;
        };
        let mut rest = form_code[prefix.len()..].chars();
        head.eq_ignore_ascii_case(&prefix)
            && rest.next().is_some_and(|c| c.is_ascii_alphabetic())
            && rest.next().is_none()
    }
}

/// Header columns every key file must carry.
pub fn key_required_headers() -> Vec<FieldCode> {
    KEY_FIELDS.iter().map(|spec| spec.field).collect()
}

impl RowRecord for KeyRecord {
    type Context = KeyScope;

    fn field_specs() -> &'static [FieldSpec] {
        KEY_FIELDS
    }

    fn extract(fields: &CheckedFields<'_>, scope: &KeyScope) -> Result<Self, Vec<FieldError>> {
        let session = fields.text(FieldCode::AssessmentSession).unwrap_or_default();
        let assessment_type = fields.code(FieldCode::AssessmentCode).unwrap_or_default();
        let form_code = fields.code(FieldCode::FormCode).unwrap_or_default();

        if session != scope.session_token {
            return Err(vec![
                ValidationIssue::error(
                    FieldCode::AssessmentSession,
                    IssueCode::SessionMismatch,
                    fill_template(messages::SESSION_MISMATCH, &[&session, &scope.session_token]),
                )
                .with_rejected_value(session),
            ]);
        }
        if assessment_type != scope.assessment_type {
            return Err(vec![
                ValidationIssue::error(
                    FieldCode::AssessmentCode,
                    IssueCode::AssessmentTypeMismatch,
                    fill_template(
                        messages::ASSESSMENT_TYPE_MISMATCH,
                        &[&assessment_type, &scope.assessment_type],
                    ),
                )
                .with_rejected_value(assessment_type),
            ]);
        }
        if !scope.form_code_matches(&form_code) {
            return Err(vec![
                ValidationIssue::error(
                    FieldCode::FormCode,
                    IssueCode::FormCodeMismatch,
                    fill_template(
                        messages::FORM_CODE_MISMATCH,
                        &[&form_code, &scope.assessment_type, &scope.session_token],
                    ),
                )
                .with_rejected_value(form_code),
            ]);
        }

        let question_number = fields.integer(FieldCode::QuestionNumber).unwrap_or_default();
        let item_type = fields.code(FieldCode::ItemType).unwrap_or_default();
        let correct_answer = fields.owned(FieldCode::CorrectAnswer);
        if item_type == "MC" && correct_answer.is_none() {
            return Err(vec![ValidationIssue::error(
                FieldCode::CorrectAnswer,
                IssueCode::InvalidCorrectAnswer,
                fill_template(messages::MC_ANSWER_REQUIRED, &[&question_number]),
            )]);
        }

        Ok(KeyRecord {
            session_token: session.to_string(),
            assessment_type,
            form_code,
            question_number,
            item_type,
            correct_answer,
            mark_value: fields.integer(FieldCode::MarkValue).unwrap_or_default(),
            cognitive_level: fields.owned(FieldCode::CognitiveLevel),
            task_code: fields.owned(FieldCode::TaskCode),
            claim_code: fields.owned(FieldCode::ClaimCode),
            context_code: fields.owned(FieldCode::ContextCode),
            concept_code: fields.owned(FieldCode::ConceptCode),
            scale_factor: fields.decimal(FieldCode::ScaleFactor),
            irt_column: fields.integer(FieldCode::IrtColumn),
            section_code: fields.owned(FieldCode::SectionCode),
        })
    }
}

// === Result files ===

static RESULT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(FieldCode::Pen, IssueCode::InvalidPen)
        .required()
        .digits(9),
    FieldSpec::new(FieldCode::Mincode, IssueCode::InvalidMincode)
        .required()
        .digits(8),
    FieldSpec::new(FieldCode::ComponentType, IssueCode::InvalidComponentType)
        .required()
        .allowed(&["1", "2", "3"]),
    FieldSpec::new(FieldCode::ComponentSubType, IssueCode::InvalidComponentSubType)
        .required()
        .allowed(&["0", "1", "2"]),
    FieldSpec::new(FieldCode::SpecialCase, IssueCode::InvalidSpecialCase)
        .allowed(&["A", "E", "Q", "X"]),
    FieldSpec::new(FieldCode::AdaptedAssessment, IssueCode::InvalidAdaptedAssessment)
        .allowed(&["A", "B", "L"]),
    FieldSpec::new(FieldCode::OpenEndedMarks, IssueCode::InvalidOpenEndedMarks)
        .max_length(OPEN_ENDED_CELLS * OPEN_ENDED_CELL_WIDTH),
    FieldSpec::new(FieldCode::McMarks, IssueCode::InvalidMcMarks).max_length(40),
    FieldSpec::new(FieldCode::ProficiencyScore, IssueCode::InvalidProficiencyScore)
        .integer_between(1, 4),
    FieldSpec::new(FieldCode::IrtScore, IssueCode::InvalidIrtScore).decimal(),
    FieldSpec::new(FieldCode::ChoicePath, IssueCode::InvalidChoicePath).allowed(&["I", "E"]),
];

/// Split the raw open-ended column into its fixed cells.
///
/// Each cell is blank or a decimal mark. Returns `None` when any cell is
/// neither.
pub fn parse_open_ended_marks(raw: Option<&str>) -> Option<Vec<Option<f64>>> {
    let mut marks = Vec::with_capacity(OPEN_ENDED_CELLS);
    if let Some(raw) = raw {
        let chars: Vec<char> = raw.chars().collect();
        for cell in chars.chunks(OPEN_ENDED_CELL_WIDTH) {
            let cell: String = cell.iter().collect();
            let cell = cell.trim();
            if cell.is_empty() {
                marks.push(None);
                continue;
            }
            match cell.parse::<f64>() {
                Ok(mark) if mark.is_finite() => marks.push(Some(mark)),
                _ => return None,
            }
        }
    }
    marks.resize(marks.len().max(OPEN_ENDED_CELLS), None);
    Some(marks)
}

fn checked_pen(fields: &CheckedFields<'_>) -> Result<Pen, FieldError> {
    let value = fields.text(FieldCode::Pen).unwrap_or_default();
    Pen::parse(value).map_err(|_| {
        ValidationIssue::error(
            FieldCode::Pen,
            IssueCode::InvalidPen,
            fill_template(messages::FIELD_MALFORMED, &[&"PEN", &value]),
        )
        .with_rejected_value(value)
    })
}

fn mc_marks_valid(marks: &str) -> bool {
    marks.chars().all(|c| c == ' ' || MC_MARK_CHARS.contains(c))
}

impl RowRecord for ResultRecord {
    type Context = ();

    fn field_specs() -> &'static [FieldSpec] {
        RESULT_FIELDS
    }

    fn extract(fields: &CheckedFields<'_>, _context: &()) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let raw_open_ended = fields.raw(FieldCode::OpenEndedMarks);
        let open_ended_marks = parse_open_ended_marks(raw_open_ended);
        if open_ended_marks.is_none() {
            let value = raw_open_ended.unwrap_or_default().trim();
            errors.push(
                ValidationIssue::error(
                    FieldCode::OpenEndedMarks,
                    IssueCode::InvalidOpenEndedMarks,
                    fill_template(messages::FIELD_MALFORMED, &[&"OPEN_ENDED_MARKS", &value]),
                )
                .with_rejected_value(value),
            );
        }

        let mc_marks = fields
            .raw(FieldCode::McMarks)
            .unwrap_or_default()
            .trim_end()
            .to_string();
        if !mc_marks_valid(&mc_marks) {
            errors.push(
                ValidationIssue::error(
                    FieldCode::McMarks,
                    IssueCode::InvalidMcMarks,
                    fill_template(messages::FIELD_MALFORMED, &[&"MC_MARKS", &mc_marks.trim()]),
                )
                .with_rejected_value(mc_marks.trim()),
            );
        }

        let pen = checked_pen(fields).map_err(|e| errors.push(e)).ok();
        let (Some(pen), Some(open_ended_marks), true) = (pen, open_ended_marks, errors.is_empty())
        else {
            return Err(errors);
        };

        Ok(ResultRecord {
            pen,
            mincode: fields.owned(FieldCode::Mincode).unwrap_or_default(),
            component_type: fields.owned(FieldCode::ComponentType).unwrap_or_default(),
            component_sub_type: fields.owned(FieldCode::ComponentSubType).unwrap_or_default(),
            special_case: fields.code(FieldCode::SpecialCase),
            adapted_assessment: fields.code(FieldCode::AdaptedAssessment),
            open_ended_marks,
            mc_marks,
            proficiency_score: fields
                .integer(FieldCode::ProficiencyScore)
                .and_then(|score| u8::try_from(score).ok()),
            irt_score: fields.decimal(FieldCode::IrtScore),
            choice_path: fields.code(FieldCode::ChoicePath),
        })
    }
}

// === Registration files ===

static REGISTRATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(FieldCode::Pen, IssueCode::InvalidPen)
        .required()
        .digits(9),
    FieldSpec::new(FieldCode::Surname, IssueCode::InvalidSurname).max_length(25),
    FieldSpec::new(FieldCode::GivenName, IssueCode::InvalidGivenName).max_length(25),
    FieldSpec::new(FieldCode::SchoolOfRecord, IssueCode::InvalidSchoolOfRecord).max_length(8),
    FieldSpec::new(FieldCode::AssessmentCentre, IssueCode::InvalidAssessmentCentre).max_length(8),
    FieldSpec::new(FieldCode::CourseStatus, IssueCode::InvalidCourseStatus).allowed(&["A", "W"]),
];

/// Header columns every registration file must carry.
pub fn registration_required_headers() -> Vec<FieldCode> {
    vec![FieldCode::Pen, FieldCode::SchoolOfRecord]
}

impl RowRecord for RegistrationRecord {
    type Context = ();

    fn field_specs() -> &'static [FieldSpec] {
        REGISTRATION_FIELDS
    }

    fn extract(fields: &CheckedFields<'_>, _context: &()) -> Result<Self, Vec<FieldError>> {
        Ok(RegistrationRecord {
            pen: checked_pen(fields).map_err(|e| vec![e])?,
            surname: fields.owned(FieldCode::Surname),
            given_name: fields.owned(FieldCode::GivenName),
            school_of_record: fields.owned(FieldCode::SchoolOfRecord).unwrap_or_default(),
            assessment_centre: fields.owned(FieldCode::AssessmentCentre),
            course_status: fields
                .text(FieldCode::CourseStatus)
                .and_then(CourseStatus::parse)
                .unwrap_or(CourseStatus::Active),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::validate_and_extract;
    use assess_model::ParsedRow;

    fn key_row(pairs: &[(&str, &str)]) -> ParsedRow {
        let mut row = ParsedRow::new(1);
        for spec in KEY_FIELDS {
            let value = pairs
                .iter()
                .find(|(k, _)| *k == spec.column())
                .map_or("", |(_, v)| *v);
            row.push(spec.column(), value);
        }
        row
    }

    fn good_key() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ASSMT_SESSION", "202409"),
            ("ASSMT_CODE", "NME10"),
            ("FORM_CODE", "NME10202409A"),
            ("QUES_NUMBER", "1"),
            ("ITEM_TYPE", "MC"),
            ("CORRECT_ANSWER", "B"),
            ("MARK_VALUE", "1"),
            ("SCALE_FACTOR", "1.5"),
        ]
    }

    fn scope() -> KeyScope {
        KeyScope::new("202409", "nme10")
    }

    #[test]
    fn test_key_record_extracts() {
        let record: KeyRecord = validate_and_extract(&key_row(&good_key()), &scope()).unwrap();
        assert_eq!(record.form_code, "NME10202409A");
        assert_eq!(record.scale_factor, Some(1.5));
        assert_eq!(record.irt_column, None);
    }

    #[test]
    fn test_key_session_mismatch() {
        let mut pairs = good_key();
        pairs[0] = ("ASSMT_SESSION", "202501");
        let errors = validate_and_extract::<KeyRecord>(&key_row(&pairs), &scope()).unwrap_err();
        assert_eq!(errors[0].code, IssueCode::SessionMismatch);
    }

    #[test]
    fn test_key_form_code_needs_single_form_letter() {
        for form in ["NME10202409", "NME10202409AB", "NME10202409_", "NMF10202409A"] {
            let mut pairs = good_key();
            pairs[2] = ("FORM_CODE", form);
            let errors =
                validate_and_extract::<KeyRecord>(&key_row(&pairs), &scope()).unwrap_err();
            assert_eq!(errors[0].code, IssueCode::FormCodeMismatch, "{form}");
        }
    }

    #[test]
    fn test_mc_item_requires_answer() {
        let mut pairs = good_key();
        pairs.retain(|(k, _)| *k != "CORRECT_ANSWER");
        let errors = validate_and_extract::<KeyRecord>(&key_row(&pairs), &scope()).unwrap_err();
        assert_eq!(errors[0].code, IssueCode::InvalidCorrectAnswer);
    }

    #[test]
    fn test_open_ended_cells() {
        let marks = parse_open_ended_marks(Some("   1 2.5    0.5")).unwrap();
        assert_eq!(marks.len(), OPEN_ENDED_CELLS);
        assert_eq!(&marks[..4], &[Some(1.0), Some(2.5), None, Some(0.5)]);
        assert!(parse_open_ended_marks(Some("  1X")).is_none());
        assert_eq!(parse_open_ended_marks(None).unwrap(), vec![None; 10]);
    }

    #[test]
    fn test_mc_marks_characters() {
        assert!(mc_marks_valid("AB D*  C"));
        assert!(!mc_marks_valid("ABE"));
    }

    #[test]
    fn test_registration_defaults_to_active() {
        let mut row = ParsedRow::new(1);
        row.push("PEN", "123456789");
        row.push("SCHOOL_OF_RECORD", "00100001");
        let record: RegistrationRecord = validate_and_extract(&row, &()).unwrap();
        assert_eq!(record.course_status, CourseStatus::Active);
        assert_eq!(record.surname, None);
    }
}
