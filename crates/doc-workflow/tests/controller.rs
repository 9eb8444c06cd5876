use doc_domain::{FieldValue, FileRejection, FileValue, Role, UserContext};
use doc_workflow::{FormController, LockReason, ValidationErrorKind, WorkflowConfig, WorkflowError, WorkflowFactory,
                   WorkflowType};
use flow::{Ack, ActionType, AuditLogEntry, FlowError, InMemoryPersistence, PersistedRecord, PersistenceService,
           SubmissionPayload, WorkflowStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

const PDF: &[u8] = b"%PDF-1.4 test";

fn user() -> UserContext {
  UserContext::new("ee-01", "Ejecutivo", Role::ExecutiveEngineer)
}

fn tender(persistence: Arc<dyn PersistenceService>) -> Result<FormController, WorkflowError> {
  WorkflowFactory::create(&WorkflowType::Tender, user(), WorkflowConfig::default(), persistence)
}

fn attach(ctl: &mut FormController, key: &str) -> Result<(), WorkflowError> {
  ctl.attach_file(key, &format!("{}.pdf", key), Some("application/pdf"), PDF.to_vec())?;
  Ok(())
}

/// Fills every step of a tender plus its mandatory fields, leaving the
/// controller on the last step.
fn fill_tender(ctl: &mut FormController) -> Result<(), WorkflowError> {
  ctl.set_raw("tender_number", "WRD/2024/17")?;
  ctl.set_raw("work_name", "Canal lining km 4-9")?;
  ctl.set_raw("authority", "Chief Engineer WRD")?;
  ctl.set_raw("validity_from", "2024-01-01")?;
  ctl.set_raw("validity_to", "2024-12-31")?;
  ctl.set_raw("estimated_cost", "1500000.00")?;
  let steps: Vec<(String, Option<String>)> =
    ctl.definition()
       .registry()
       .steps()
       .iter()
       .map(|s| {
         let g = &s.groups()[0];
         (g.file_key().to_string(), g.date_key().map(|k| k.to_string()))
       })
       .collect();
  for (i, (file, date)) in steps.iter().enumerate() {
    attach(ctl, file)?;
    if let Some(date) = date {
      ctl.set_raw(date, "2024-02-01")?;
    }
    if i + 1 < steps.len() {
      assert!(ctl.advance(), "could not leave step {}", i);
    }
  }
  ctl.set_raw("agreement_number", "AG-77")?;
  Ok(())
}

/// Wraps the in-memory store and fails submissions while `failing` is set.
struct FlakyPersistence {
  inner: InMemoryPersistence,
  failing: AtomicBool,
}

impl FlakyPersistence {
  fn new() -> Self {
    Self { inner: InMemoryPersistence::new(), failing: AtomicBool::new(false) }
  }

  fn check(&self) -> Result<(), FlowError> {
    if self.failing.load(Ordering::SeqCst) {
      Err(FlowError::Storage("servicio no disponible".into()))
    } else {
      Ok(())
    }
  }
}

impl PersistenceService for FlakyPersistence {
  fn load_workflow(&self, id: &Uuid) -> Result<PersistedRecord, FlowError> {
    self.inner.load_workflow(id)
  }

  fn save_draft(&self, payload: &SubmissionPayload) -> Result<Ack, FlowError> {
    self.check()?;
    self.inner.save_draft(payload)
  }

  fn finalize(&self, payload: &SubmissionPayload) -> Result<Ack, FlowError> {
    self.check()?;
    self.inner.finalize(payload)
  }

  fn fetch_history(&self, id: &Uuid) -> Result<Vec<AuditLogEntry>, FlowError> {
    self.inner.fetch_history(id)
  }

  fn resolve_file_url(&self, reference: &str) -> Result<Url, FlowError> {
    self.inner.resolve_file_url(reference)
  }
}

/// Applies submissions on the inner store but reports a timeout for the next
/// one while `drop_ack` is set, as when the acknowledgement is lost.
struct LostAckPersistence {
  inner: InMemoryPersistence,
  drop_ack: AtomicBool,
}

impl LostAckPersistence {
  fn new() -> Self {
    Self { inner: InMemoryPersistence::new(), drop_ack: AtomicBool::new(false) }
  }

  fn deliver(&self, ack: Ack) -> Result<Ack, FlowError> {
    if self.drop_ack.swap(false, Ordering::SeqCst) {
      Err(FlowError::Storage("timeout".into()))
    } else {
      Ok(ack)
    }
  }
}

impl PersistenceService for LostAckPersistence {
  fn load_workflow(&self, id: &Uuid) -> Result<PersistedRecord, FlowError> {
    self.inner.load_workflow(id)
  }

  fn save_draft(&self, payload: &SubmissionPayload) -> Result<Ack, FlowError> {
    let ack = self.inner.save_draft(payload)?;
    self.deliver(ack)
  }

  fn finalize(&self, payload: &SubmissionPayload) -> Result<Ack, FlowError> {
    let ack = self.inner.finalize(payload)?;
    self.deliver(ack)
  }

  fn fetch_history(&self, id: &Uuid) -> Result<Vec<AuditLogEntry>, FlowError> {
    self.inner.fetch_history(id)
  }

  fn resolve_file_url(&self, reference: &str) -> Result<Url, FlowError> {
    self.inner.resolve_file_url(reference)
  }
}

#[test]
fn new_tender_starts_on_first_step() -> Result<(), WorkflowError> {
  let ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  assert_eq!(ctl.definition().registry().len(), 11);
  assert_eq!(ctl.current_step(), 0);
  assert_eq!(ctl.status(), WorkflowStatus::Draft);
  assert!(!ctl.is_locked("nit_file"));
  for step in ctl.definition().registry().steps().iter().skip(1) {
    for key in step.owned_fields() {
      assert!(ctl.is_locked(key.as_str()), "{} should wait for its step", key);
    }
  }
  assert!(ctl.validate_draft().is_ok());
  Ok(())
}

#[test]
fn advance_after_first_file() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  assert!(!ctl.advance());
  assert_eq!(ctl.current_step(), 0);

  attach(&mut ctl, "nit_file")?;
  assert!(ctl.is_current_step_complete());
  assert!(ctl.advance());
  assert_eq!(ctl.current_step(), 1);
  assert!(!ctl.is_locked("prebid_minutes_file"));
  assert!(ctl.retreat());
  assert_eq!(ctl.current_step(), 0);
  Ok(())
}

#[test]
fn locked_field_needs_confirmed_clear() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  ctl.set_raw("authority", "SE Circle 2")?;
  ctl.save_draft()?;

  let err = ctl.set_raw("authority", "SE Circle 3").unwrap_err();
  assert!(matches!(err, WorkflowError::LockViolation { reason: LockReason::PreviouslyFilled, .. }));
  assert_eq!(ctl.value("authority"), Some(&FieldValue::text("SE Circle 2")));

  let err = ctl.clear("authority", false).unwrap_err();
  assert!(matches!(err, WorkflowError::ClearNotConfirmed(_)));
  assert!(ctl.is_locked("authority"));

  let cleared = ctl.clear("authority", true)?;
  assert_eq!(cleared.len(), 1);
  assert!(!ctl.is_locked("authority"));
  assert!(ctl.value("authority").is_none());
  ctl.set_raw("authority", "SE Circle 3")?;
  assert_eq!(ctl.value("authority"), Some(&FieldValue::text("SE Circle 3")));
  Ok(())
}

#[test]
fn oversized_file_keeps_previous_value() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  attach(&mut ctl, "nit_file")?;
  let before = ctl.value("nit_file").cloned();

  let big = vec![0u8; 6 * 1024 * 1024];
  let err = ctl.attach_file("nit_file", "big.pdf", Some("application/pdf"), big).unwrap_err();
  assert_eq!(err.file_rejection(), Some(FileRejection::TooLarge));
  assert_eq!(ctl.value("nit_file").cloned(), before);

  let err = ctl.attach_file("nit_file", "run.exe", Some("application/x-msdownload"), vec![1, 2]).unwrap_err();
  assert_eq!(err.file_rejection(), Some(FileRejection::UnsupportedType));
  assert_eq!(ctl.value("nit_file").cloned(), before);
  Ok(())
}

#[test]
fn full_tender_finalizes() -> Result<(), WorkflowError> {
  let store = Arc::new(InMemoryPersistence::new());
  let mut ctl = tender(store.clone())?;
  fill_tender(&mut ctl)?;
  assert!(ctl.all_steps_complete());
  assert!(ctl.validate_final().is_ok(), "{}", ctl.validate_final());

  let pending = ctl.begin_submission(WorkflowStatus::Finalized)?;
  assert_eq!(pending.payload().action, ActionType::FinalSubmit);
  let outcome = store.finalize(pending.payload());
  let ack = ctl.complete_submission(pending, outcome)?;
  assert_eq!(ack.status, WorkflowStatus::Finalized);
  assert_eq!(ack.version, 1);

  assert!(ctl.is_finalized());
  for spec in ctl.definition().fields() {
    assert_eq!(ctl.lock_reason(spec.key.as_str()), Some(LockReason::Finalized));
  }
  let filled_before = ctl.previously_filled().clone();
  assert!(matches!(ctl.set_raw("remarks", "late"), Err(WorkflowError::LockViolation { .. })));
  assert!(matches!(ctl.clear("authority", true), Err(WorkflowError::LockViolation { .. })));
  assert!(matches!(ctl.save_draft(), Err(WorkflowError::AlreadyFinalized)));
  assert_eq!(ctl.previously_filled(), &filled_before);

  let history = ctl.history()?;
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].action, ActionType::FinalSubmit);
  Ok(())
}

#[test]
fn final_submit_rejected_while_steps_missing() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  attach(&mut ctl, "nit_file")?;
  match ctl.finalize() {
    Err(WorkflowError::Validation(report)) => {
      assert!(report.has(ValidationErrorKind::IncompleteSteps));
      assert!(report.has_field(ValidationErrorKind::MissingRequiredField, "tender_number"));
    }
    other => panic!("expected validation error, got {:?}", other.map(|a| a.version)),
  }
  assert!(!ctl.is_submitting());
  assert_eq!(ctl.status(), WorkflowStatus::Draft);
  Ok(())
}

#[test]
fn saved_uploads_become_persisted_references() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  attach(&mut ctl, "nit_file")?;
  ctl.set_raw("nit_date", "2024-03-01")?;
  let ack = ctl.save_draft()?;
  assert_eq!(ack.action, ActionType::DraftSave);

  let id = ctl.workflow_id().expect("id asignado");
  let expected = format!("uploads/{}/nit_file/nit_file.pdf", id);
  assert_eq!(ctl.value("nit_file"), Some(&FieldValue::File(FileValue::Existing(expected.clone()))));
  assert_eq!(ack.stored_files.get("nit_file"), Some(&expected));
  assert_eq!(ctl.lock_reason("nit_date"), Some(LockReason::PreviouslyFilled));

  let url = ctl.file_url("nit_file")?.expect("url del archivo");
  assert!(url.as_str().ends_with(&expected));
  assert!(ctl.file_url("prebid_minutes_file")?.is_none());

  ctl.set_raw("remarks", "segunda versión")?;
  let ack = ctl.save_draft()?;
  assert_eq!(ack.action, ActionType::Update);
  assert_eq!(ack.version, 2);
  Ok(())
}

#[test]
fn clearing_a_file_clears_its_group() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  attach(&mut ctl, "nit_file")?;
  ctl.set_raw("nit_date", "2024-03-01")?;
  ctl.save_draft()?;
  assert!(ctl.is_locked("nit_file"));
  assert!(ctl.is_locked("nit_date"));

  let cleared = ctl.clear("nit_date", true)?;
  let names: Vec<&str> = cleared.iter().map(|k| k.as_str()).collect();
  assert_eq!(names, vec!["nit_file", "nit_date"]);
  assert!(ctl.value("nit_file").is_none());
  assert!(ctl.value("nit_date").is_none());
  assert!(!ctl.is_locked("nit_file"));
  assert!(!ctl.is_locked("nit_date"));
  Ok(())
}

#[test]
fn clear_rejected_for_unreached_step() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  let err = ctl.clear("loa_file", true).unwrap_err();
  assert!(matches!(err, WorkflowError::LockViolation { reason: LockReason::StepNotReached { step: 9, current: 0 }, .. }));
  Ok(())
}

#[test]
fn failed_save_keeps_snapshot_and_allows_retry() -> Result<(), WorkflowError> {
  let store = Arc::new(FlakyPersistence::new());
  let mut ctl = tender(store.clone())?;
  ctl.set_raw("work_name", "Bridge repair")?;
  attach(&mut ctl, "nit_file")?;
  let before = ctl.snapshot().clone();

  store.failing.store(true, Ordering::SeqCst);
  let err = ctl.save_draft().unwrap_err();
  assert!(matches!(err, WorkflowError::Flow(FlowError::Storage(_))));
  assert_eq!(ctl.snapshot(), &before);
  assert!(ctl.previously_filled().is_empty());
  assert!(ctl.workflow_id().is_none());
  assert!(!ctl.is_submitting());

  store.failing.store(false, Ordering::SeqCst);
  let ack = ctl.save_draft()?;
  assert_eq!(ack.version, 1);
  assert!(ctl.is_locked("work_name"));
  Ok(())
}

#[test]
fn second_submission_waits_for_the_first() -> Result<(), WorkflowError> {
  let store = Arc::new(InMemoryPersistence::new());
  let mut ctl = tender(store.clone())?;
  ctl.set_raw("work_name", "Bridge repair")?;

  let pending = ctl.begin_submission(WorkflowStatus::Draft)?;
  assert!(ctl.is_submitting());
  assert!(matches!(ctl.begin_submission(WorkflowStatus::Draft), Err(WorkflowError::SubmissionInFlight)));
  assert!(matches!(ctl.save_draft(), Err(WorkflowError::SubmissionInFlight)));

  let err = ctl.complete_submission(pending, Err(FlowError::Other("timeout".into()))).unwrap_err();
  assert!(matches!(err, WorkflowError::Flow(_)));
  assert!(!ctl.is_submitting());

  let pending = ctl.begin_submission(WorkflowStatus::Draft)?;
  let outcome = store.save_draft(pending.payload());
  ctl.complete_submission(pending, outcome)?;
  assert_eq!(ctl.version(), 1);
  Ok(())
}

#[test]
fn cancel_restores_last_saved_state() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  attach(&mut ctl, "nit_file")?;
  ctl.set_raw("authority", "CE North")?;
  ctl.save_draft()?;
  let saved = ctl.snapshot().clone();

  ctl.clear("authority", true)?;
  ctl.set_raw("authority", "CE South")?;
  assert!(ctl.advance());
  ctl.cancel();

  assert_eq!(ctl.snapshot(), &saved);
  assert_eq!(ctl.current_step(), 0);
  assert!(ctl.is_locked("authority"));
  Ok(())
}

#[test]
fn reload_rehydrates_progress_and_locks() -> Result<(), WorkflowError> {
  let store: Arc<dyn PersistenceService> = Arc::new(InMemoryPersistence::new());
  let mut ctl = tender(store.clone())?;
  attach(&mut ctl, "nit_file")?;
  assert!(ctl.advance());
  attach(&mut ctl, "prebid_minutes_file")?;
  ctl.set_raw("prebid_time", "10:30")?;
  ctl.set_raw("tender_number", "T-9")?;
  ctl.save_draft()?;
  let id = ctl.workflow_id().expect("guardado");

  let loaded = WorkflowFactory::load(id, user(), WorkflowConfig::default(), store)?;
  assert_eq!(loaded.current_step(), 2);
  assert_eq!(loaded.version(), 1);
  assert!(loaded.is_locked("tender_number"));
  assert!(loaded.is_locked("prebid_minutes_file"));
  assert_eq!(loaded.lock_reason("prebid_time"), Some(LockReason::PreviouslyFilled));
  assert!(!loaded.is_locked("bid_submission_file"));
  assert_eq!(loaded.value("tender_number"), Some(&FieldValue::text("T-9")));
  Ok(())
}

#[test]
fn stale_controller_gets_a_conflict() -> Result<(), WorkflowError> {
  let store: Arc<dyn PersistenceService> = Arc::new(InMemoryPersistence::new());
  let mut first = tender(store.clone())?;
  first.set_raw("work_name", "Road")?;
  first.save_draft()?;
  let id = first.workflow_id().expect("guardado");

  let mut a = WorkflowFactory::load(id, user(), WorkflowConfig::default(), store.clone())?;
  let mut b = WorkflowFactory::load(id, user(), WorkflowConfig::default(), store)?;
  a.set_raw("remarks", "a")?;
  a.save_draft()?;
  b.set_raw("remarks", "b")?;
  let err = b.save_draft().unwrap_err();
  assert!(matches!(err, WorkflowError::Flow(FlowError::Conflict(_))));
  assert_eq!(b.value("remarks"), Some(&FieldValue::text("b")));
  Ok(())
}

#[test]
fn viewer_cannot_edit() -> Result<(), WorkflowError> {
  let viewer = UserContext::new("v1", "Consulta", Role::Viewer);
  let mut ctl = WorkflowFactory::create(&WorkflowType::Contract,
                                        viewer,
                                        WorkflowConfig::default(),
                                        Arc::new(InMemoryPersistence::new()))?;
  assert!(matches!(ctl.set_raw("authority", "x"), Err(WorkflowError::Forbidden(_))));
  assert!(matches!(ctl.save_draft(), Err(WorkflowError::Forbidden(_))));
  Ok(())
}

#[test]
fn schema_errors() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  assert!(matches!(ctl.set_raw("nope", "1"), Err(WorkflowError::UnknownField(_))));
  assert!(matches!(ctl.set_field("nit_date", FieldValue::text("mañana")),
                   Err(WorkflowError::FieldKindMismatch { .. })));
  assert!(matches!(ctl.set_raw("nit_date", "01/02/2024"), Err(WorkflowError::Domain(_))));
  assert!(matches!(ctl.set_field("nit_file", FieldValue::existing("uploads/other.pdf")),
                   Err(WorkflowError::Forbidden(_))));
  assert!(ctl.snapshot().is_empty());
  Ok(())
}

#[test]
fn jump_forward_through_completed_steps() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  attach(&mut ctl, "nit_file")?;
  assert!(ctl.advance());
  attach(&mut ctl, "prebid_minutes_file")?;
  ctl.jump_to(0)?;
  assert_eq!(ctl.current_step(), 0);
  ctl.jump_to(2)?;
  assert_eq!(ctl.current_step(), 2);
  assert!(matches!(ctl.jump_to(5), Err(WorkflowError::NavigationBlocked(_))));
  let statuses = ctl.step_statuses();
  assert!(statuses[0].complete && statuses[1].complete);
  assert!(statuses[2].current && !statuses[2].complete);
  assert!(!statuses[3].reached);
  Ok(())
}

#[test]
fn retry_after_lost_ack_does_not_duplicate_new_workflow() -> Result<(), WorkflowError> {
  let store = Arc::new(LostAckPersistence::new());
  let mut ctl = tender(store.clone())?;
  attach(&mut ctl, "nit_file")?;
  ctl.set_raw("work_name", "Canal lining")?;

  store.drop_ack.store(true, Ordering::SeqCst);
  assert!(matches!(ctl.save_draft(), Err(WorkflowError::Flow(FlowError::Storage(_)))));
  assert_eq!(store.inner.len(), 1);
  assert!(ctl.workflow_id().is_none());

  let ack = ctl.save_draft()?;
  assert_eq!(store.inner.len(), 1);
  assert_eq!(ack.version, 1);
  assert_eq!(ctl.workflow_id(), Some(ack.workflow_id));
  assert!(matches!(ctl.value("nit_file"), Some(FieldValue::File(FileValue::Existing(_)))));
  assert_eq!(ctl.history()?.len(), 1);
  Ok(())
}

#[test]
fn retry_after_lost_ack_on_update_replays_the_save() -> Result<(), WorkflowError> {
  let store = Arc::new(LostAckPersistence::new());
  let mut ctl = tender(store.clone())?;
  attach(&mut ctl, "nit_file")?;
  ctl.save_draft()?;
  ctl.set_raw("authority", "CE North")?;

  store.drop_ack.store(true, Ordering::SeqCst);
  assert!(ctl.save_draft().is_err());
  assert_eq!(ctl.version(), 1);

  let ack = ctl.save_draft()?;
  assert_eq!(ack.version, 2);
  assert_eq!(ack.action, ActionType::Update);
  assert_eq!(ctl.version(), 2);
  assert_eq!(ctl.history()?.len(), 2);
  assert!(ctl.is_locked("authority"));
  Ok(())
}

#[test]
fn edits_after_a_failed_submission_start_a_new_command() -> Result<(), WorkflowError> {
  let mut ctl = tender(Arc::new(InMemoryPersistence::new()))?;
  ctl.set_raw("work_name", "Bridge repair")?;

  let first = ctl.begin_submission(WorkflowStatus::Draft)?;
  let first_id = first.payload().command_id;
  assert!(ctl.complete_submission(first, Err(FlowError::Other("timeout".into()))).is_err());

  let again = ctl.begin_submission(WorkflowStatus::Draft)?;
  assert_eq!(again.payload().command_id, first_id);
  assert!(ctl.complete_submission(again, Err(FlowError::Other("timeout".into()))).is_err());

  ctl.set_raw("work_name", "Bridge repair, phase 2")?;
  let changed = ctl.begin_submission(WorkflowStatus::Draft)?;
  assert_ne!(changed.payload().command_id, first_id);
  Ok(())
}
