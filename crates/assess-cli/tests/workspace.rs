//! Integration tests for the CLI workspace: reference loading, ingestion
//! through uploads, and store snapshots.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use assess_cli::fixtures::ReferenceFile;
use assess_cli::input::{upload_from_file, upload_from_payload};
use assess_cli::workspace::Workspace;
use assess_core::{
    AssessmentStore, EventOutcome, FileUpload, MemoryStore, ReferenceData, StudentRegistry,
};
use assess_model::{FileCategory, Pen, SessionId, StudentId};

const REFERENCE: &str = r#"{
  "sessions": [
    {
      "id": "S-2024-09",
      "course_year": 2024,
      "course_month": 9,
      "assessments": [{ "id": "A-LTE10", "type_code": "LTE10" }]
    }
  ],
  "schools": [
    { "id": "SCH-1", "mincode": "00100001", "display_name": "Riverside Secondary" }
  ],
  "students": [
    {
      "id": "S1",
      "pen": "111111111",
      "legal_surname": "Tremblay",
      "legal_given_name": "Marie",
      "status": "A"
    },
    {
      "id": "M",
      "pen": "333333333",
      "legal_surname": "Tremblay",
      "legal_given_name": "Marie",
      "status": "M",
      "true_student_id": "S1"
    }
  ]
}"#;

const REGISTRATIONS: &str = "PEN,LEGAL_SURNAME,LEGAL_GIVEN_NAME,SCHOOL_OF_RECORD,ASSESSMENT_CENTRE,COURSE_STATUS\n\
                             111111111,Tremblay,Marie,00100001,,A\n";

struct Paths {
    _dir: TempDir,
    root: PathBuf,
}

impl Paths {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::write(root.join("reference.json"), REFERENCE).unwrap();
        Self { _dir: dir, root }
    }

    fn reference(&self) -> PathBuf {
        self.root.join("reference.json")
    }

    fn store(&self) -> PathBuf {
        self.root.join("state.json")
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn open(&self) -> Workspace {
        Workspace::open(&self.store(), &self.reference(), None).unwrap()
    }
}

fn session_id() -> SessionId {
    SessionId::new("S-2024-09").unwrap()
}

fn ingest(workspace: &Workspace, path: &Path, category: FileCategory) -> assess_core::ProcessOutcome {
    let upload = upload_from_file(path, category).unwrap();
    workspace
        .processor()
        .process_upload(&upload, &session_id())
        .unwrap()
}

#[test]
fn test_reference_file_serves_both_lookups() {
    let paths = Paths::new();
    let reference = ReferenceFile::load(&paths.reference()).unwrap();

    assert_eq!(reference.sessions[0].token(), "202409");
    assert!(reference.sessions[0].assessments[0].active);
    let school = reference.school_by_mincode("00100001").unwrap().unwrap();
    assert_eq!(school.display_name, "Riverside Secondary");
    let student = reference
        .student_by_pen(&Pen::parse("333333333").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(student.true_student_id, Some(StudentId::new("S1").unwrap()));
    assert!(reference.grad_record(&student.id).unwrap().is_none());
}

#[test]
fn test_reference_file_missing_is_an_error() {
    let paths = Paths::new();
    let error = ReferenceFile::load(&paths.root.join("absent.json")).unwrap_err();
    assert!(format!("{error:#}").contains("read reference data"));
}

#[test]
fn test_open_registers_reference_sessions_in_a_fresh_store() {
    let paths = Paths::new();
    let workspace = paths.open();

    let session = workspace.store().session(&session_id()).unwrap();
    assert!(session.is_some());
    assert!(!paths.store().exists());
}

#[test]
fn test_registration_ingest_survives_a_save_and_reload() {
    let paths = Paths::new();
    let file = paths.write("REG_202409_LTE10.csv", REGISTRATIONS);

    let mut workspace = paths.open();
    let outcome = ingest(&workspace, &file, FileCategory::Registration);
    assert!(outcome.is_committed());
    assert_eq!(outcome.summary().unwrap().changes.created, 1);

    let events = workspace.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, EventOutcome::Created);
    assert!(workspace.take_events().is_empty());

    workspace.save().unwrap();
    let reloaded = MemoryStore::load(&paths.store()).unwrap();
    let registrations = reloaded
        .registrations_for_student(&StudentId::new("S1").unwrap())
        .unwrap();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].assessment_type, "LTE10");
}

#[test]
fn test_wrong_extension_is_rejected_without_touching_the_store() {
    let paths = Paths::new();
    let file = paths.write("REG_202409_LTE10.txt", REGISTRATIONS);

    let workspace = paths.open();
    let outcome = ingest(&workspace, &file, FileCategory::Registration);

    assert!(!outcome.is_committed());
    let registrations = workspace
        .store()
        .registrations_for_student(&StudentId::new("S1").unwrap())
        .unwrap();
    assert!(registrations.is_empty());
}

#[test]
fn test_payload_round_trips_through_json() {
    let paths = Paths::new();
    let upload = FileUpload::new(
        "REG_202409_LTE10.csv",
        FileCategory::Registration,
        REGISTRATIONS.as_bytes(),
    );
    let payload = paths.write("upload.json", &serde_json::to_string(&upload).unwrap());

    let loaded = upload_from_payload(&payload, FileCategory::Registration).unwrap();
    assert_eq!(loaded, upload);
    assert_eq!(loaded.decode().unwrap().contents, REGISTRATIONS.as_bytes());
}

#[test]
fn test_payload_kind_must_match() {
    let paths = Paths::new();
    let upload = FileUpload::new("KEY_202409_LTE10.txt", FileCategory::Key, b"x");
    let payload = paths.write("upload.json", &serde_json::to_string(&upload).unwrap());

    let error = upload_from_payload(&payload, FileCategory::Result).unwrap_err();
    assert!(error.to_string().contains("--kind"));
}
