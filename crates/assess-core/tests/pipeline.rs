//! End-to-end pipeline tests over the in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::broadcast;

use assess_core::{
    BatchProcessor, Collaborators, EventBus, EventOutcome, EventType, FileUpload, LookupError,
    MemoryStore, PipelineError, PipelineSettings, ProcessOutcome, ReferenceData,
    RegistrationEvent, RejectionKind, StoreState, StudentRegistry, AssessmentStore,
};
use assess_model::messages;
use assess_model::{
    Assessment, AssessmentId, CourseStatus, FileCategory, FileKey, GradRecord, IssueCode, Pen,
    RegistrationId, School, SchoolId, Session, SessionId, StagedStatus, Student, StudentId,
    StudentRegistration, StudentStatus, UploadedFile,
};

const MINCODE: &str = "00100001";
const CENTRE: &str = "00200002";

// === Fixtures ===

struct Directory {
    schools: Vec<School>,
    students: Vec<Student>,
    grad: Vec<GradRecord>,
}

impl ReferenceData for Directory {
    fn school_by_id(&self, id: &SchoolId) -> Result<Option<School>, LookupError> {
        Ok(self.schools.iter().find(|s| &s.id == id).cloned())
    }

    fn school_by_mincode(&self, mincode: &str) -> Result<Option<School>, LookupError> {
        Ok(self.schools.iter().find(|s| s.mincode == mincode).cloned())
    }
}

impl StudentRegistry for Directory {
    fn student_by_pen(&self, pen: &Pen) -> Result<Option<Student>, LookupError> {
        Ok(self.students.iter().find(|s| &s.pen == pen).cloned())
    }

    fn students_by_ids(&self, ids: &[StudentId]) -> Result<Vec<Student>, LookupError> {
        Ok(self
            .students
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    fn grad_record(&self, student: &StudentId) -> Result<Option<GradRecord>, LookupError> {
        Ok(self.grad.iter().find(|g| &g.student_id == student).cloned())
    }
}

fn school(id: &str, mincode: &str) -> School {
    School {
        id: SchoolId::new(id).unwrap(),
        mincode: mincode.to_string(),
        display_name: format!("School {id}"),
        reporting_requirement: None,
        opened_on: NaiveDate::from_ymd_opt(1990, 1, 1),
        closed_on: None,
    }
}

fn student(id: &str, pen: &str, surname: &str, given: &str) -> Student {
    Student {
        id: StudentId::new(id).unwrap(),
        pen: Pen::parse(pen).unwrap(),
        legal_surname: Some(surname.to_string()),
        legal_given_name: Some(given.to_string()),
        status: StudentStatus::Active,
        true_student_id: None,
    }
}

fn directory() -> Directory {
    Directory {
        schools: vec![school("SCH-1", MINCODE), school("SCH-2", CENTRE)],
        students: vec![
            student("S1", "111111111", "Tremblay", "Marie"),
            student("S2", "222222222", "Singh", "Arjun"),
            student("S3", "444444444", "Nguyen", "Linh"),
            Student {
                status: StudentStatus::Merged,
                true_student_id: Some(StudentId::new("S2").unwrap()),
                ..student("M", "333333333", "Singh", "Arjun")
            },
        ],
        grad: vec![GradRecord {
            student_id: StudentId::new("S3").unwrap(),
            school_of_record_id: Some(SchoolId::new("SCH-1").unwrap()),
        }],
    }
}

fn session_id() -> SessionId {
    SessionId::new("S-2024-09").unwrap()
}

fn session() -> Session {
    Session {
        id: session_id(),
        course_year: 2024,
        course_month: 9,
        assessments: vec![Assessment {
            id: AssessmentId::new("A-LTE10").unwrap(),
            type_code: "LTE10".to_string(),
            active: true,
        }],
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    bus: EventBus,
    events: broadcast::Receiver<RegistrationEvent>,
    processor: BatchProcessor,
}

impl Harness {
    fn with_state(state: StoreState) -> Self {
        Self::build(state, PipelineSettings::default())
    }

    fn new() -> Self {
        Self::with_state(StoreState {
            sessions: vec![session()],
            ..StoreState::default()
        })
    }

    fn build(state: StoreState, settings: PipelineSettings) -> Self {
        let store = Arc::new(MemoryStore::from_state(state));
        let directory = Arc::new(directory());
        let bus = EventBus::new(64);
        let events = bus.subscribe();
        let collaborators = Collaborators {
            store: store.clone(),
            reference: directory.clone(),
            students: directory,
            events: Arc::new(bus.clone()),
        };
        let processor = BatchProcessor::new(collaborators, settings)
            .with_today(NaiveDate::from_ymd_opt(2024, 9, 15).unwrap());
        Self {
            store,
            bus,
            events,
            processor,
        }
    }

    fn process(&self, name: &str, category: FileCategory, text: &str) -> ProcessOutcome {
        let file = UploadedFile::new(name, category, text.as_bytes().to_vec());
        self.processor.process_file(&file, &session_id()).unwrap()
    }

    fn drain_events(&mut self) -> Vec<RegistrationEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    fn key(&self) -> FileKey {
        FileKey::new(session_id(), "LTE10")
    }
}

/// One 110-character scanner line.
fn result_line(pen: &str, open_ended: &str) -> String {
    format!(
        "{pen:<9}{MINCODE:<8}11  {open_ended:<40}{mc:<40}3{irt:<7} ",
        mc = "ABCDA",
        irt = "0.512"
    )
}

fn result_file(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

const KEY_HEADER: &str = "ASSMT_SESSION\tASSMT_CODE\tFORM_CODE\tQUES_NUMBER\tITEM_TYPE\tCORRECT_ANSWER\tMARK_VALUE\tCOGN_LEVEL\tTASK_CODE\tCLAIM_CODE\tCONTEXT_CODE\tCONCEPTS_CODE\tSCALE_FACTOR\tIRT_COLUMN\tASSMT_SECTION";

fn key_row(session: &str, question: u32) -> String {
    format!("{session}\tLTE10\tLTE10202409A\t{question}\tMC\tB\t1\tK\t\t\t\t\t1.0\t\tS1")
}

const REGISTRATION_HEADER: &str =
    "PEN,LEGAL_SURNAME,LEGAL_GIVEN_NAME,SCHOOL_OF_RECORD,ASSESSMENT_CENTRE,COURSE_STATUS";

// === Whole-file rejections ===

#[test]
fn test_unknown_session_is_rejected() {
    let harness = Harness::new();
    let file = UploadedFile::new(
        "RES_202409_LTE10.txt",
        FileCategory::Result,
        b"anything".to_vec(),
    );
    let outcome = harness
        .processor
        .process_file(&file, &SessionId::new("NOPE").unwrap())
        .unwrap();

    insta::assert_json_snapshot!(outcome, @r#"
    {
      "status": "REJECTED",
      "fileName": "RES_202409_LTE10.txt",
      "kind": "VALIDATION",
      "errors": [
        {
          "field": "SESSION",
          "code": "INVALID_SESSION",
          "message": "Session NOPE could not be found.",
          "severity": "ERROR"
        }
      ]
    }
    "#);
}

#[test]
fn test_wrong_extension_is_rejected_before_decoding() {
    let harness = Harness::new();
    let outcome = harness.process("RES_202409_LTE10.csv", FileCategory::Result, "x");
    let report = outcome.rejection().unwrap();
    assert_eq!(report.errors[0].code, IssueCode::InvalidFileExtension);
}

#[test]
fn test_invalid_base64_upload_is_rejected() {
    let harness = Harness::new();
    let upload = FileUpload {
        file_name: "RES_202409_LTE10.txt".to_string(),
        base64_contents: "%%%not base64%%%".to_string(),
        file_type: FileCategory::Result,
        content_type: None,
    };
    let outcome = harness
        .processor
        .process_upload(&upload, &session_id())
        .unwrap();
    assert_eq!(
        outcome.rejection().unwrap().errors[0].code,
        IssueCode::InvalidFileContents
    );
}

#[test]
fn test_broken_layout_template_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = PipelineSettings::default();
    settings.decoder.result_layout = Some(dir.path().join("missing-layout.toml"));
    let harness = Harness::build(
        StoreState {
            sessions: vec![session()],
            ..StoreState::default()
        },
        settings,
    );

    let file = UploadedFile::new(
        "RES_202409_LTE10.txt",
        FileCategory::Result,
        result_line("111111111", "").into_bytes(),
    );
    let err = harness
        .processor
        .process_file(&file, &session_id())
        .unwrap_err();
    assert!(matches!(err, PipelineError::Layout(_)));
    assert_eq!(err.user_message(), messages::GENERIC_ERROR);
}

// === Result files ===

#[test]
fn test_result_file_skips_bad_rows_and_stages_the_rest() {
    let harness = Harness::new();
    let text = result_file(&[
        result_line("111111111", "1.0 2.5 "),
        result_line("222222222", "abcd"),
        result_line("222222222", "4.0"),
    ]);
    let outcome = harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);

    let summary = outcome.summary().expect("committed");
    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.accepted_rows, 2);
    assert_eq!(summary.rejected_rows.len(), 1);
    assert_eq!(summary.rejected_rows[0].line, 2);
    assert_eq!(
        summary.rejected_rows[0].issues[0].code,
        IssueCode::InvalidOpenEndedMarks
    );
    assert_eq!(summary.reporting_school.as_deref(), Some(MINCODE));

    let staged = harness.store.staged(&harness.key()).unwrap();
    let lines: Vec<usize> = staged.iter().map(|row| row.line).collect();
    assert_eq!(lines, vec![1, 3]);
    assert!(staged.iter().all(|row| row.status == StagedStatus::Loaded));
    assert_eq!(staged[0].record.open_ended_marks[1], Some(2.5));
}

#[test]
fn test_short_trailer_line_is_ignored() {
    let harness = Harness::new();
    let text = result_file(&[
        result_line("111111111", ""),
        result_line("222222222", ""),
        "TRAILER".to_string(),
    ]);
    let outcome = harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.accepted_rows, 2);
    assert!(summary.rejected_rows.is_empty());
}

#[test]
fn test_short_line_before_the_end_is_a_row_rejection() {
    let harness = Harness::new();
    let text = result_file(&[
        result_line("111111111", ""),
        "SHORT".to_string(),
        result_line("222222222", ""),
    ]);
    let outcome = harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.accepted_rows, 2);
    assert_eq!(summary.rejected_rows[0].line, 2);
    assert_eq!(summary.rejected_rows[0].issues[0].code, IssueCode::RowLength);
    assert_eq!(
        summary.rejected_rows[0].issues[0].message,
        "Line 2 is missing characters."
    );
}

#[test]
fn test_reporting_school_comes_from_the_first_line_only() {
    let harness = Harness::new();
    let second_school = result_line("222222222", "").replacen(MINCODE, CENTRE, 1);
    let text = result_file(&["SHORT".to_string(), second_school]);
    let outcome = harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.accepted_rows, 1);
    assert_eq!(summary.rejected_rows[0].line, 1);
    assert_eq!(summary.reporting_school, None);
}

#[test]
fn test_unknown_pen_and_unknown_school_reject_rows() {
    let harness = Harness::new();
    let unknown_school = result_line("111111111", "").replacen(MINCODE, "09999999", 1);
    let text = result_file(&[result_line("999999999", ""), unknown_school]);
    let outcome = harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.accepted_rows, 0);
    let codes: Vec<IssueCode> = summary
        .rejected_rows
        .iter()
        .map(|r| r.issues[0].code)
        .collect();
    assert_eq!(
        codes,
        vec![IssueCode::StudentNotFound, IssueCode::InvalidMincode]
    );
}

#[test]
fn test_merged_pen_is_staged_as_transfer() {
    let harness = Harness::new();
    let text = result_file(&[result_line("333333333", "")]);
    harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);

    let staged = harness.store.staged(&harness.key()).unwrap();
    assert_eq!(staged[0].status, StagedStatus::Transfer);
    assert_eq!(staged[0].student_id.as_str(), "S2");
    assert_eq!(staged[0].submitted_pen.as_str(), "333333333");
    assert_eq!(staged[0].resolved_pen.as_str(), "222222222");
}

#[test]
fn test_second_result_file_conflicts_until_promoted() {
    let harness = Harness::new();
    let text = result_file(&[result_line("111111111", "")]);
    assert!(
        harness
            .process("RES_202409_LTE10.txt", FileCategory::Result, &text)
            .is_committed()
    );

    let again = harness.process("RES2_202409_LTE10.txt", FileCategory::Result, &text);
    let report = again.rejection().unwrap();
    assert_eq!(report.kind, RejectionKind::Conflict);
    assert_eq!(report.errors[0].code, IssueCode::FileInProgress);

    harness.processor.promote(&session_id(), "LTE10").unwrap();
    assert!(
        harness
            .process("RES2_202409_LTE10.txt", FileCategory::Result, &text)
            .is_committed()
    );
}

#[test]
fn test_in_flight_key_rejects_concurrent_file() {
    let harness = Harness::new();
    let guard = harness.processor.in_flight().try_acquire(&harness.key());
    assert!(guard.is_some());

    let text = format!("{KEY_HEADER}\n{}\n", key_row("202409", 1));
    let outcome = harness.process("KEY_202409_LTE10.txt", FileCategory::Key, &text);
    assert!(outcome.rejection().unwrap().is_conflict());

    drop(guard);
    let outcome = harness.process("KEY_202409_LTE10.txt", FileCategory::Key, &text);
    assert!(outcome.is_committed());
}

// === Key files ===

#[test]
fn test_key_file_replaces_keys() {
    let harness = Harness::new();
    let text = format!(
        "{KEY_HEADER}\n{}\n{}\n",
        key_row("202409", 1),
        key_row("202409", 2)
    );
    let outcome = harness.process("KEY_202409_LTE10.txt", FileCategory::Key, &text);
    assert_eq!(outcome.summary().unwrap().accepted_rows, 2);

    let keys = harness
        .store
        .keys(&AssessmentId::new("A-LTE10").unwrap())
        .unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[1].question_number, 2);
}

#[test]
fn test_key_file_fails_fast_on_first_bad_row() {
    let harness = Harness::new();
    let text = format!(
        "{KEY_HEADER}\n{}\n{}\n{}\n",
        key_row("202409", 1),
        key_row("202501", 2),
        key_row("202409", 3)
    );
    let outcome = harness.process("KEY_202409_LTE10.txt", FileCategory::Key, &text);

    let report = outcome.rejection().unwrap();
    assert_eq!(report.kind, RejectionKind::Validation);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, IssueCode::SessionMismatch);
    assert!(report.errors[0].message.starts_with("Line 2: "));

    let keys = harness
        .store
        .keys(&AssessmentId::new("A-LTE10").unwrap())
        .unwrap();
    assert!(keys.is_empty());
}

#[test]
fn test_key_file_missing_header_is_rejected() {
    let harness = Harness::new();
    let text = "ASSMT_SESSION\tASSMT_CODE\n202409\tLTE10\n";
    let outcome = harness.process("KEY_202409_LTE10.txt", FileCategory::Key, text);
    assert_eq!(
        outcome.rejection().unwrap().errors[0].code,
        IssueCode::MissingHeader
    );
}

#[test]
fn test_key_file_short_row_before_the_end_rejects_the_file() {
    let harness = Harness::new();
    let text = format!("{KEY_HEADER}\n202409\tLTE10\n{}\n", key_row("202409", 2));
    let outcome = harness.process("KEY_202409_LTE10.txt", FileCategory::Key, &text);

    let report = outcome.rejection().unwrap();
    assert_eq!(report.kind, RejectionKind::Validation);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, IssueCode::RowLength);
    assert_eq!(report.errors[0].message, "Line 1 is missing characters.");
    assert!(
        harness
            .store
            .keys(&AssessmentId::new("A-LTE10").unwrap())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_key_file_short_trailer_is_ignored() {
    let harness = Harness::new();
    let text = format!(
        "{KEY_HEADER}\n{}\n{}\nTRAILER\n",
        key_row("202409", 1),
        key_row("202409", 2)
    );
    let outcome = harness.process("KEY_202409_LTE10.txt", FileCategory::Key, &text);

    assert!(outcome.is_committed());
    let summary = outcome.summary().unwrap();
    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.accepted_rows, 2);
}

// === Registration files ===

#[test]
fn test_registration_file_creates_and_rejects_duplicates() {
    let mut harness = Harness::new();
    let text = [
        REGISTRATION_HEADER,
        "111111111,TREMBLAY,Marie,00100001,,A",
        "222222222,Singh,Arjun,00100001,00200002,A",
        "111111111,Tremblay,Marie,00100001,,A",
    ]
    .join("\n");
    let outcome = harness.process("REG_202409_LTE10.csv", FileCategory::Registration, &text);

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.accepted_rows, 2);
    assert_eq!(summary.changes.created, 2);
    assert_eq!(summary.rejected_rows.len(), 1);
    assert_eq!(summary.rejected_rows[0].line, 3);
    assert_eq!(
        summary.rejected_rows[0].issues[0].code,
        IssueCode::DuplicateRegistration
    );

    let events = harness.drain_events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.outcome == EventOutcome::Created
        && e.event_type == EventType::StudentRegistration));
    assert_eq!(
        events[1].payload.assessment_centre_id,
        Some(SchoolId::new("SCH-2").unwrap())
    );
}

#[test]
fn test_registration_update_and_withdrawal() {
    let mut harness = Harness::new();
    let first = [
        REGISTRATION_HEADER,
        "111111111,Tremblay,Marie,00100001,,A",
        "222222222,Singh,Arjun,00100001,,A",
    ]
    .join("\n");
    harness.process("REG_202409_LTE10.csv", FileCategory::Registration, &first);
    harness.drain_events();

    let second = [
        REGISTRATION_HEADER,
        "111111111,Tremblay,Marie,00100001,00200002,A",
        "222222222,Singh,Arjun,00100001,,W",
    ]
    .join("\n");
    let outcome = harness.process("REG2_202409_LTE10.csv", FileCategory::Registration, &second);

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.changes.updated, 1);
    assert_eq!(summary.changes.deleted, 1);
    assert!(summary.rejected_rows.is_empty());

    let outcomes: Vec<EventOutcome> = harness.drain_events().iter().map(|e| e.outcome).collect();
    assert_eq!(outcomes, vec![EventOutcome::Updated, EventOutcome::Deleted]);

    let s1 = harness
        .store
        .registrations_for_student(&StudentId::new("S1").unwrap())
        .unwrap();
    assert_eq!(s1.len(), 1);
    assert_eq!(s1[0].assessment_centre_id, Some(SchoolId::new("SCH-2").unwrap()));
    let s2 = harness
        .store
        .registrations_for_student(&StudentId::new("S2").unwrap())
        .unwrap();
    assert!(s2.is_empty());
}

#[test]
fn test_blank_school_of_record_falls_back_to_graduation_record() {
    let harness = Harness::new();
    let text = [REGISTRATION_HEADER, "444444444,Nguyen,Linh,,,A"].join("\n");
    let outcome = harness.process("REG_202409_LTE10.csv", FileCategory::Registration, &text);
    assert_eq!(outcome.summary().unwrap().changes.created, 1);

    let regs = harness
        .store
        .registrations_for_student(&StudentId::new("S3").unwrap())
        .unwrap();
    assert_eq!(regs[0].school_of_record_id, Some(SchoolId::new("SCH-1").unwrap()));
}

#[test]
fn test_registration_name_mismatch_is_rejected() {
    let harness = Harness::new();
    let text = [REGISTRATION_HEADER, "111111111,Smith,Marie,00100001,,A"].join("\n");
    let outcome = harness.process("REG_202409_LTE10.csv", FileCategory::Registration, &text);

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.accepted_rows, 0);
    assert_eq!(
        summary.rejected_rows[0].issues[0].code,
        IssueCode::SurnameMismatch
    );
    assert!(harness.bus.subscriber_count() > 0);
}

#[test]
fn test_corrected_registration_file_can_reuse_its_name() {
    let mut harness = Harness::new();
    let first = [REGISTRATION_HEADER, "111111111,Tremblay,Marie,00100001,,A"].join("\n");
    let outcome = harness.process("REG_202409_LTE10.csv", FileCategory::Registration, &first);
    assert_eq!(outcome.summary().unwrap().changes.created, 1);
    harness.drain_events();

    let corrected = [
        REGISTRATION_HEADER,
        "222222222,Singh,Arjun,00100001,,A",
        "111111111,Tremblay,Marie,00100001,00200002,A",
    ]
    .join("\n");
    let file = UploadedFile::new(
        "REG_202409_LTE10.csv",
        FileCategory::Registration,
        corrected.into_bytes(),
    );
    let outcome = harness
        .processor
        .process_file(&file, &session_id())
        .expect("a re-sent file is not a system failure");

    let summary = outcome.summary().unwrap();
    assert_eq!(summary.changes.created, 1);
    assert_eq!(summary.changes.updated, 1);
    assert!(summary.rejected_rows.is_empty());

    let outcomes: Vec<EventOutcome> = harness.drain_events().iter().map(|e| e.outcome).collect();
    assert_eq!(outcomes, vec![EventOutcome::Created, EventOutcome::Updated]);

    let s1 = harness
        .store
        .registrations_for_student(&StudentId::new("S1").unwrap())
        .unwrap();
    let s2 = harness
        .store
        .registrations_for_student(&StudentId::new("S2").unwrap())
        .unwrap();
    assert_eq!(s1.len(), 1);
    assert_eq!(s2.len(), 1);
    assert_ne!(s1[0].id, s2[0].id);
    assert_eq!(s1[0].assessment_centre_id, Some(SchoolId::new("SCH-2").unwrap()));
}

// === Promotion ===

fn held_registration() -> StudentRegistration {
    StudentRegistration {
        id: RegistrationId::new("R-OLD").unwrap(),
        student_id: StudentId::new("M").unwrap(),
        pen: Pen::parse("333333333").unwrap(),
        assessment_id: AssessmentId::new("A-NME10-JUN").unwrap(),
        assessment_type: "NME10".to_string(),
        session_id: SessionId::new("S-2024-06").unwrap(),
        school_of_record_id: None,
        assessment_centre_id: None,
        surname: None,
        given_name: None,
        course_status: CourseStatus::Active,
        proficiency_score: Some(2),
        irt_score: None,
        special_case: None,
        adapted_assessment: None,
    }
}

#[test]
fn test_promotion_creates_registrations_and_moves_merged_ones() {
    let held = held_registration();
    let mut harness = Harness::with_state(StoreState {
        sessions: vec![session()],
        registrations: BTreeMap::from([(held.id.clone(), held)]),
        ..StoreState::default()
    });
    let text = result_file(&[result_line("111111111", ""), result_line("333333333", "")]);
    harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);

    let summary = harness.processor.promote(&session_id(), "lte10").unwrap();
    assert_eq!(summary.claimed, 2);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.transferred, 1);
    assert_eq!(summary.changes.created, 2);
    assert_eq!(summary.changes.updated, 1);

    let s2 = harness
        .store
        .registrations_for_student(&StudentId::new("S2").unwrap())
        .unwrap();
    assert_eq!(s2.len(), 2);
    assert!(s2.iter().all(|reg| reg.pen.as_str() == "222222222"));
    let lte10 = s2
        .iter()
        .find(|reg| reg.assessment_type == "LTE10")
        .unwrap();
    assert_eq!(lte10.proficiency_score, Some(3));
    assert_eq!(lte10.irt_score, Some(0.512));
    assert_eq!(lte10.school_of_record_id, Some(SchoolId::new("SCH-1").unwrap()));

    let events = harness.drain_events();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.event_type == EventType::ResultPromotion));

    let staged = harness.store.staged(&harness.key()).unwrap();
    assert!(staged.iter().all(|row| row.status == StagedStatus::Completed));
}

#[test]
fn test_promotion_updates_existing_registration() {
    let mut harness = Harness::new();
    let registration = [REGISTRATION_HEADER, "111111111,Tremblay,Marie,00100001,,A"].join("\n");
    harness.process("REG_202409_LTE10.csv", FileCategory::Registration, &registration);
    let text = result_file(&[result_line("111111111", "")]);
    harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);
    harness.drain_events();

    let summary = harness.processor.promote(&session_id(), "LTE10").unwrap();
    assert_eq!(summary.changes.updated, 1);
    assert_eq!(summary.changes.created, 0);

    let regs = harness
        .store
        .registrations_for_student(&StudentId::new("S1").unwrap())
        .unwrap();
    assert_eq!(regs.len(), 1);
    assert_eq!(regs[0].proficiency_score, Some(3));
    assert_eq!(regs[0].surname.as_deref(), Some("Tremblay"));
    assert_eq!(harness.drain_events()[0].outcome, EventOutcome::Updated);
}

#[test]
fn test_promotion_twice_is_a_no_op() {
    let harness = Harness::new();
    let text = result_file(&[result_line("111111111", "")]);
    harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);

    let first = harness.processor.promote(&session_id(), "LTE10").unwrap();
    assert_eq!(first.completed, 1);
    let before = harness.store.snapshot().registrations;

    let second = harness.processor.promote(&session_id(), "LTE10").unwrap();
    assert_eq!(second.claimed, 0);
    assert_eq!(second.changes.total(), 0);
    assert_eq!(harness.store.snapshot().registrations, before);
}

#[test]
fn test_purge_removes_completed_rows_only() {
    let harness = Harness::new();
    let text = result_file(&[result_line("111111111", ""), result_line("222222222", "")]);
    harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);

    assert_eq!(harness.processor.purge_completed(&session_id(), "LTE10").unwrap(), 0);
    harness.processor.promote(&session_id(), "LTE10").unwrap();
    assert_eq!(harness.processor.purge_completed(&session_id(), "LTE10").unwrap(), 2);
    assert!(harness.store.staged(&harness.key()).unwrap().is_empty());
}

#[test]
fn test_result_file_reused_name_promotes_new_students() {
    let harness = Harness::new();
    let first = result_file(&[result_line("111111111", "")]);
    harness.process("RES_202409_LTE10.txt", FileCategory::Result, &first);
    assert_eq!(harness.processor.promote(&session_id(), "LTE10").unwrap().completed, 1);

    let second = result_file(&[result_line("222222222", ""), result_line("111111111", "")]);
    assert!(
        harness
            .process("RES_202409_LTE10.txt", FileCategory::Result, &second)
            .is_committed()
    );
    let summary = harness.processor.promote(&session_id(), "LTE10").unwrap();
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.changes.created, 1);
    assert_eq!(summary.changes.updated, 1);

    for id in ["S1", "S2"] {
        let regs = harness
            .store
            .registrations_for_student(&StudentId::new(id).unwrap())
            .unwrap();
        assert_eq!(regs.len(), 1, "{id}");
    }
}

#[test]
fn test_merged_registration_folds_into_the_true_students_own() {
    let merged = StudentRegistration {
        id: RegistrationId::new("R-M-LTE10").unwrap(),
        assessment_id: AssessmentId::new("A-LTE10").unwrap(),
        assessment_type: "LTE10".to_string(),
        session_id: session_id(),
        proficiency_score: None,
        ..held_registration()
    };
    let mut harness = Harness::with_state(StoreState {
        sessions: vec![session()],
        registrations: BTreeMap::from([(merged.id.clone(), merged)]),
        ..StoreState::default()
    });
    let registration = [REGISTRATION_HEADER, "222222222,Singh,Arjun,00100001,,A"].join("\n");
    harness.process("REG_202409_LTE10.csv", FileCategory::Registration, &registration);
    let text = result_file(&[result_line("333333333", "")]);
    harness.process("RES_202409_LTE10.txt", FileCategory::Result, &text);
    harness.drain_events();

    let summary = harness.processor.promote(&session_id(), "LTE10").unwrap();
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.transferred, 1);
    assert_eq!(summary.changes.deleted, 1);
    assert_eq!(summary.changes.updated, 1);
    assert_eq!(summary.changes.created, 0);

    let s2 = harness
        .store
        .registrations_for_student(&StudentId::new("S2").unwrap())
        .unwrap();
    assert_eq!(s2.len(), 1);
    assert_eq!(s2[0].surname.as_deref(), Some("Singh"));
    assert_eq!(s2[0].proficiency_score, Some(3));
    assert!(
        harness
            .store
            .registrations_for_student(&StudentId::new("M").unwrap())
            .unwrap()
            .is_empty()
    );

    let outcomes: Vec<EventOutcome> = harness.drain_events().iter().map(|e| e.outcome).collect();
    assert_eq!(outcomes, vec![EventOutcome::Deleted, EventOutcome::Updated]);
}
