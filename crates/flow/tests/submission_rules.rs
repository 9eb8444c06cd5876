use chrono::Utc;
use flow::domain::{digest_fields, upload_path, ActionType, FieldMap, SubmissionPayload, WorkflowStatus};
use flow::engine::{apply_submission, replay_ack};
use flow::FlowError;
use serde_json::json;
use uuid::Uuid;

fn draft(fields: FieldMap) -> SubmissionPayload {
  SubmissionPayload { workflow_id: None,
                      workflow_type: "contract".into(),
                      target_status: WorkflowStatus::Draft,
                      action: ActionType::DraftSave,
                      actor: "de-7".into(),
                      current_step: 2,
                      fields,
                      expected_version: 0,
                      command_id: Uuid::new_v4(),
                      submitted_at: Utc::now() }
}

#[test]
fn new_record_starts_at_version_one() -> Result<(), FlowError> {
  let mut fields = FieldMap::new();
  fields.insert("contract_number".into(), json!("C-1"));
  let applied = apply_submission(None, &draft(fields.clone()), WorkflowStatus::Draft)?;
  assert_eq!(applied.record.version, 1);
  assert_eq!(applied.record.current_step, 2);
  assert_eq!(applied.record.created_by, "de-7");
  assert_eq!(applied.entry.digest, digest_fields(&fields));
  assert_eq!(applied.ack.action, ActionType::DraftSave);
  Ok(())
}

#[test]
fn new_record_with_nonzero_version_conflicts() {
  let mut p = draft(FieldMap::new());
  p.expected_version = 3;
  assert!(matches!(apply_submission(None, &p, WorkflowStatus::Draft), Err(FlowError::Conflict(_))));
}

#[test]
fn replay_reports_current_version() -> Result<(), FlowError> {
  let p = draft(FieldMap::new());
  let applied = apply_submission(None, &p, WorkflowStatus::Draft)?;
  let ack = replay_ack(&applied.record, &p);
  assert_eq!(ack, applied.ack);
  Ok(())
}

#[test]
fn upload_path_is_sanitized() {
  let id = Uuid::nil();
  assert_eq!(upload_path(&id, "loa_file", "../../secret.pdf"), format!("uploads/{}/loa_file/____secret.pdf", id));
  assert_eq!(upload_path(&id, "a/b", ""), format!("uploads/{}/a_b/file", id));
}

#[test]
fn digest_changes_with_content() {
  let mut a = FieldMap::new();
  a.insert("x".into(), json!("1"));
  let mut b = a.clone();
  b.insert("x".into(), json!("2"));
  assert_ne!(digest_fields(&a), digest_fields(&b));
  assert_eq!(digest_fields(&a), digest_fields(&a.clone()));
}
