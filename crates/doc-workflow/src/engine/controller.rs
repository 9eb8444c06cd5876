// controller.rs
//
// Controlador de un formulario de workflow. Es dueño de un único snapshot
// y coordina bloqueos, progreso, validación y el servicio de persistencia.
use crate::config::WorkflowConfig;
use crate::definition::WorkflowDefinition;
use crate::errors::WorkflowError;
use crate::gate::{SubmissionGate, SubmitContext, ValidationReport};
use crate::policy::{LockReason, LockState};
use crate::progress::ProgressTracker;
use crate::snapshot::{FormSnapshot, PreviouslyFilled};
use doc_domain::{DomainError, FieldKey, FieldKind, FieldValue, FileUpload, FileValue, UserContext};
use flow::{Ack, AuditLogEntry, FieldMap, FlowError, PersistedRecord, PersistenceService, SubmissionPayload,
           WorkflowStatus};
use log::{debug, info, warn};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Estado restaurable por `cancel`: lo último cargado o guardado.
#[derive(Debug, Clone)]
struct Checkpoint {
  snapshot: FormSnapshot,
  previously_filled: PreviouslyFilled,
  progress: ProgressTracker,
}

/// Envío iniciado con `begin_submission` y pendiente de respuesta.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
  payload: SubmissionPayload,
  submitted: FormSnapshot,
}

impl PendingSubmission {
  pub fn payload(&self) -> &SubmissionPayload {
    &self.payload
  }

  pub fn target(&self) -> WorkflowStatus {
    self.payload.target_status
  }
}

/// Resumen de un paso para la interfaz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatus {
  pub index: usize,
  pub name: String,
  pub label: String,
  pub reached: bool,
  pub current: bool,
  pub complete: bool,
}

pub struct FormController {
  definition: Arc<WorkflowDefinition>,
  user: UserContext,
  config: WorkflowConfig,
  persistence: Arc<dyn PersistenceService>,
  workflow_id: Option<Uuid>,
  version: i64,
  status: WorkflowStatus,
  snapshot: FormSnapshot,
  previously_filled: PreviouslyFilled,
  progress: ProgressTracker,
  checkpoint: Checkpoint,
  in_flight: Option<Uuid>,
  /// Último envío fallido. Se reenvía tal cual si el snapshot no cambió.
  retry: Option<PendingSubmission>,
}

impl FormController {
  /// Formulario nuevo y vacío, en borrador y en el primer paso.
  pub fn new(definition: Arc<WorkflowDefinition>,
             user: UserContext,
             config: WorkflowConfig,
             persistence: Arc<dyn PersistenceService>)
             -> Self {
    let progress = ProgressTracker::starting();
    let checkpoint = Checkpoint { snapshot: FormSnapshot::new(), previously_filled: PreviouslyFilled::new(), progress };
    Self { definition,
           user,
           config,
           persistence,
           workflow_id: None,
           version: 0,
           status: WorkflowStatus::Draft,
           snapshot: FormSnapshot::new(),
           previously_filled: PreviouslyFilled::new(),
           progress,
           checkpoint,
           in_flight: None,
           retry: None }
  }

  /// Carga un workflow existente desde el servicio de persistencia.
  pub fn load(definition: Arc<WorkflowDefinition>,
              user: UserContext,
              config: WorkflowConfig,
              persistence: Arc<dyn PersistenceService>,
              workflow_id: Uuid)
              -> Result<Self, WorkflowError> {
    let record = persistence.load_workflow(&workflow_id)?;
    Self::from_record(definition, user, config, persistence, record)
  }

  /// Construye el controlador a partir de un registro persistido. Todos los
  /// campos con valor pasan a `previously_filled` y el paso actual se
  /// rehidrata una sola vez.
  pub fn from_record(definition: Arc<WorkflowDefinition>,
                     user: UserContext,
                     config: WorkflowConfig,
                     persistence: Arc<dyn PersistenceService>,
                     record: PersistedRecord)
                     -> Result<Self, WorkflowError> {
    let expected = definition.workflow_type().to_string();
    if record.workflow_type != expected {
      return Err(WorkflowError::Config(format!("el registro {} es de tipo '{}', se esperaba '{}'",
                                               record.id, record.workflow_type, expected)));
    }
    let snapshot = snapshot_from_record(&definition, &record.fields)?;
    let previously_filled: PreviouslyFilled = snapshot.filled_keys().cloned().collect();
    let progress = ProgressTracker::rehydrate(definition.registry(), &snapshot);
    info!("workflow {} cargado: versión {}, estado {}, paso {}",
          record.id,
          record.version,
          record.status,
          progress.current_index() + 1);
    let checkpoint = Checkpoint { snapshot: snapshot.clone(), previously_filled: previously_filled.clone(), progress };
    Ok(Self { definition,
              user,
              config,
              persistence,
              workflow_id: Some(record.id),
              version: record.version,
              status: record.status,
              snapshot,
              previously_filled,
              progress,
              checkpoint,
              in_flight: None,
              retry: None })
  }

  pub fn definition(&self) -> &WorkflowDefinition {
    &self.definition
  }

  pub fn user(&self) -> &UserContext {
    &self.user
  }

  pub fn workflow_id(&self) -> Option<Uuid> {
    self.workflow_id
  }

  pub fn version(&self) -> i64 {
    self.version
  }

  pub fn status(&self) -> WorkflowStatus {
    self.status
  }

  pub fn is_finalized(&self) -> bool {
    self.status.is_finalized()
  }

  pub fn snapshot(&self) -> &FormSnapshot {
    &self.snapshot
  }

  pub fn value(&self, key: &str) -> Option<&FieldValue> {
    self.snapshot.get(&FieldKey::from(key))
  }

  pub fn previously_filled(&self) -> &PreviouslyFilled {
    &self.previously_filled
  }

  pub fn current_step(&self) -> usize {
    self.progress.current_index()
  }

  pub fn progress(&self) -> &ProgressTracker {
    &self.progress
  }

  pub fn is_submitting(&self) -> bool {
    self.in_flight.is_some()
  }

  fn lock_state(&self) -> LockState<'_> {
    LockState::new(self.definition.registry(), self.status, self.progress.current_index(), &self.previously_filled)
  }

  pub fn lock_reason(&self, key: &str) -> Option<LockReason> {
    self.lock_state().lock_reason(&FieldKey::from(key))
  }

  pub fn is_locked(&self, key: &str) -> bool {
    self.lock_reason(key).is_some()
  }

  fn ensure_editor(&self) -> Result<(), WorkflowError> {
    if self.user.can_edit() {
      Ok(())
    } else {
      Err(WorkflowError::Forbidden(format!("el rol {} sólo puede consultar", self.user.role)))
    }
  }

  /// Asigna un valor a un campo. Si la operación falla el snapshot queda
  /// como estaba. Devuelve el valor anterior.
  pub fn set_field(&mut self, key: impl Into<FieldKey>, value: FieldValue) -> Result<Option<FieldValue>, WorkflowError> {
    let key = key.into();
    let kind = self.definition.kind_of(&key).ok_or_else(|| WorkflowError::UnknownField(key.clone()))?;
    self.ensure_editor()?;
    if let Some(reason) = self.lock_state().lock_reason(&key) {
      warn!("edición rechazada en '{}': {}", key, reason);
      return Err(WorkflowError::LockViolation { field: key, reason });
    }
    if !value.matches(kind) {
      return Err(WorkflowError::FieldKindMismatch { field: key, expected: kind, found: value.kind_name() });
    }
    match &value {
      FieldValue::File(FileValue::Existing(path)) if !path.trim().is_empty() => {
        return Err(WorkflowError::Forbidden(format!("'{}' no acepta referencias a archivos persistidos", key)));
      }
      FieldValue::File(FileValue::Upload(upload)) => {
        self.config.file_constraints.check(upload).map_err(|e| match e {
                                                     DomainError::FileRejected { kind, message } => {
                                                       warn!("archivo rechazado en '{}': {}", key, message);
                                                       WorkflowError::FileRejected { field: key.clone(), kind, message }
                                                     }
                                                     other => WorkflowError::Domain(other),
                                                   })?;
      }
      _ => {}
    }
    debug!("campo '{}' actualizado", key);
    Ok(self.snapshot.set(key, value))
  }

  /// Asigna un valor desde texto, interpretado según el tipo declarado.
  pub fn set_raw(&mut self, key: &str, raw: &str) -> Result<Option<FieldValue>, WorkflowError> {
    let field = FieldKey::from(key);
    let kind = self.definition.kind_of(&field).ok_or_else(|| WorkflowError::UnknownField(field.clone()))?;
    if kind == FieldKind::File && !raw.trim().is_empty() {
      return Err(WorkflowError::FieldKindMismatch { field, expected: kind, found: "text" });
    }
    let value = FieldValue::parse(kind, raw)?;
    self.set_field(field, value)
  }

  /// Adjunta un archivo nuevo al campo indicado.
  pub fn attach_file(&mut self,
                     key: &str,
                     file_name: &str,
                     content_type: Option<&str>,
                     content: Vec<u8>)
                     -> Result<Option<FieldValue>, WorkflowError> {
    self.set_field(key, FieldValue::upload(FileUpload::from_bytes(file_name, content_type, content)))
  }

  /// Limpia un campo, o el grupo entero si pertenece a uno: archivo (con su
  /// referencia persistida), fecha y hora. Requiere confirmación. Devuelve
  /// las claves limpiadas.
  pub fn clear(&mut self, key: &str, confirmed: bool) -> Result<Vec<FieldKey>, WorkflowError> {
    let key = FieldKey::from(key);
    if self.definition.field(&key).is_none() {
      return Err(WorkflowError::UnknownField(key));
    }
    if !confirmed {
      return Err(WorkflowError::ClearNotConfirmed(key));
    }
    self.ensure_editor()?;
    if self.status.is_finalized() {
      return Err(WorkflowError::LockViolation { field: key, reason: LockReason::Finalized });
    }
    let registry = self.definition.registry();
    if let Some(step) = registry.owning_step(&key) {
      let current = self.progress.current_index();
      if step > current {
        return Err(WorkflowError::LockViolation { field: key, reason: LockReason::StepNotReached { step, current } });
      }
    }
    let targets: Vec<FieldKey> = match registry.group_of(&key) {
      Some((_, group)) => group.members().cloned().collect(),
      None => vec![key],
    };
    for target in &targets {
      self.previously_filled.remove(target);
      self.snapshot.blank(target);
    }
    info!("campos limpiados: {:?}", targets.iter().map(FieldKey::as_str).collect::<Vec<_>>());
    Ok(targets)
  }

  pub fn advance(&mut self) -> bool {
    let moved = self.progress.advance(self.definition.registry(), &self.snapshot);
    if moved {
      info!("avance al paso {}", self.progress.current_index() + 1);
    } else {
      debug!("avance rechazado en el paso {}", self.progress.current_index() + 1);
    }
    moved
  }

  pub fn retreat(&mut self) -> bool {
    let moved = self.progress.retreat();
    if moved {
      info!("retroceso al paso {}", self.progress.current_index() + 1);
    }
    moved
  }

  pub fn jump_to(&mut self, index: usize) -> Result<(), WorkflowError> {
    self.progress.jump_to(index, self.definition.registry(), &self.snapshot)?;
    info!("salto al paso {}", index + 1);
    Ok(())
  }

  pub fn is_step_complete(&self, index: usize) -> bool {
    self.progress.is_step_complete(index, self.definition.registry(), &self.snapshot)
  }

  pub fn is_current_step_complete(&self) -> bool {
    self.progress.is_current_step_complete(self.definition.registry(), &self.snapshot)
  }

  pub fn all_steps_complete(&self) -> bool {
    self.progress.all_steps_complete(self.definition.registry(), &self.snapshot)
  }

  pub fn step_statuses(&self) -> Vec<StepStatus> {
    let current = self.progress.current_index();
    self.definition
        .registry()
        .steps()
        .iter()
        .enumerate()
        .map(|(index, step)| StepStatus { index,
                                          name: step.name().to_string(),
                                          label: step.label().to_string(),
                                          reached: index <= current,
                                          current: index == current,
                                          complete: self.is_step_complete(index) })
        .collect()
  }

  pub fn validate_draft(&self) -> ValidationReport {
    SubmissionGate::new(&self.definition).validate_draft(&self.snapshot)
  }

  pub fn validate_final(&self) -> ValidationReport {
    SubmissionGate::new(&self.definition).validate_final(&self.snapshot, &self.progress)
  }

  /// Primera fase del envío: valida, arma el payload y activa el bloqueo de
  /// reenvío hasta `complete_submission`.
  pub fn begin_submission(&mut self, target: WorkflowStatus) -> Result<PendingSubmission, WorkflowError> {
    if self.status.is_finalized() {
      return Err(WorkflowError::AlreadyFinalized);
    }
    self.ensure_editor()?;
    if self.in_flight.is_some() {
      return Err(WorkflowError::SubmissionInFlight);
    }
    let context = SubmitContext { workflow_id: self.workflow_id,
                                  is_editing_existing: self.workflow_id.is_some(),
                                  actor: self.user.actor().to_string(),
                                  expected_version: self.version };
    let payload = SubmissionGate::new(&self.definition).submit(&self.snapshot, &self.progress, target, &context)
                                                       .map_err(|report| {
                                                         warn!("envío {} rechazado: {}", target, report);
                                                         WorkflowError::Validation(report)
                                                       })?;
    let payload = match self.retry.take() {
      Some(prev) if self.same_attempt(&prev, target) => {
        debug!("reintento del envío {}", prev.payload.command_id);
        prev.payload
      }
      _ => payload,
    };
    self.in_flight = Some(payload.command_id);
    debug!("envío {} iniciado ({})", payload.command_id, payload.action);
    Ok(PendingSubmission { payload, submitted: self.snapshot.clone() })
  }

  /// Segunda fase: aplica la respuesta del servicio. Un error deja el
  /// snapshot intacto y permite reintentar.
  pub fn complete_submission(&mut self,
                             pending: PendingSubmission,
                             outcome: Result<Ack, FlowError>)
                             -> Result<Ack, WorkflowError> {
    if self.in_flight != Some(pending.payload.command_id) {
      return Err(WorkflowError::Forbidden(format!("el envío {} no es el que está en curso", pending.payload.command_id)));
    }
    self.in_flight = None;
    match outcome {
      Ok(ack) => {
        self.retry = None;
        self.apply_ack(&pending, &ack);
        Ok(ack)
      }
      Err(e) => {
        warn!("el servicio rechazó el envío {}: {}", pending.payload.command_id, e);
        self.retry = Some(pending);
        Err(WorkflowError::Flow(e))
      }
    }
  }

  /// Un reintento conserva el `command_id` del envío fallido sólo si pide lo
  /// mismo sobre la misma versión.
  fn same_attempt(&self, prev: &PendingSubmission, target: WorkflowStatus) -> bool {
    prev.payload.target_status == target
    && prev.payload.workflow_id == self.workflow_id
    && prev.payload.expected_version == self.version
    && prev.submitted == self.snapshot
  }

  fn apply_ack(&mut self, pending: &PendingSubmission, ack: &Ack) {
    let mut submitted = pending.submitted.clone();
    for (field, path) in &ack.stored_files {
      let key = FieldKey::from(field.as_str());
      let stored = FieldValue::existing(path.clone());
      if self.snapshot.get(&key) == submitted.get(&key) {
        self.snapshot.set(key.clone(), stored.clone());
      }
      submitted.set(key, stored);
    }
    self.previously_filled.extend(submitted.filled_keys().cloned());
    self.workflow_id = Some(ack.workflow_id);
    self.version = ack.version;
    self.status = ack.status;
    self.checkpoint = Checkpoint { snapshot: submitted,
                                   previously_filled: self.previously_filled.clone(),
                                   progress: self.progress };
    info!("workflow {} guardado: versión {}, estado {}, acción {}",
          ack.workflow_id, ack.version, ack.status, ack.action);
  }

  fn submit_with(&mut self, target: WorkflowStatus) -> Result<Ack, WorkflowError> {
    let pending = self.begin_submission(target)?;
    let outcome = match target {
      WorkflowStatus::Draft => self.persistence.save_draft(pending.payload()),
      WorkflowStatus::Finalized => self.persistence.finalize(pending.payload()),
    };
    self.complete_submission(pending, outcome)
  }

  /// Guarda el borrador (alta o actualización).
  pub fn save_draft(&mut self) -> Result<Ack, WorkflowError> {
    self.submit_with(WorkflowStatus::Draft)
  }

  /// Envío final. Tras el acuse el formulario queda en sólo lectura.
  pub fn finalize(&mut self) -> Result<Ack, WorkflowError> {
    self.submit_with(WorkflowStatus::Finalized)
  }

  /// Descarta los cambios locales desde el último guardado o carga sin
  /// contactar al servicio.
  pub fn cancel(&mut self) {
    self.snapshot = self.checkpoint.snapshot.clone();
    self.previously_filled = self.checkpoint.previously_filled.clone();
    self.progress = self.checkpoint.progress;
    info!("cambios descartados; paso {}", self.progress.current_index() + 1);
  }

  /// Historia del workflow. Un formulario nunca guardado no tiene historia.
  pub fn history(&self) -> Result<Vec<AuditLogEntry>, WorkflowError> {
    match self.workflow_id {
      Some(id) => Ok(self.persistence.fetch_history(&id)?),
      None => Ok(Vec::new()),
    }
  }

  /// URL del archivo persistido del campo, si lo tiene.
  pub fn file_url(&self, key: &str) -> Result<Option<Url>, WorkflowError> {
    match self.value(key).and_then(FieldValue::as_file) {
      Some(FileValue::Existing(path)) => Ok(Some(self.persistence.resolve_file_url(path)?)),
      _ => Ok(None),
    }
  }
}

/// Convierte los campos de un registro en snapshot. Los archivos persistidos
/// llegan como `existing_<campo>`; las claves que el workflow no declara se
/// ignoran.
pub fn snapshot_from_record(definition: &WorkflowDefinition, fields: &FieldMap) -> Result<FormSnapshot, WorkflowError> {
  let mut snapshot = FormSnapshot::new();
  for spec in definition.fields() {
    let value = match spec.kind {
      FieldKind::File => fields.get(&spec.key.existing_key())
                               .or_else(|| fields.get(spec.key.as_str()))
                               .and_then(JsonValue::as_str)
                               .map(FieldValue::existing),
      kind => match fields.get(spec.key.as_str()) {
        Some(JsonValue::String(s)) => Some(FieldValue::parse(kind, s)?),
        Some(JsonValue::Number(n)) => Some(FieldValue::text(n.to_string())),
        Some(JsonValue::Null) | None => None,
        Some(other) => {
          return Err(WorkflowError::FieldKindMismatch { field: spec.key.clone(),
                                                        expected: kind,
                                                        found: json_kind(other) })
        }
      },
    };
    if let Some(value) = value {
      snapshot.set(spec.key.clone(), value);
    }
  }
  for key in fields.keys() {
    let bare = key.strip_prefix(flow::EXISTING_PREFIX).unwrap_or(key);
    if definition.field(&FieldKey::from(bare)).is_none() {
      debug!("campo '{}' del registro ignorado", key);
    }
  }
  Ok(snapshot)
}

fn json_kind(value: &JsonValue) -> &'static str {
  match value {
    JsonValue::Bool(_) => "bool",
    JsonValue::Array(_) => "array",
    JsonValue::Object(_) => "object",
    _ => "scalar",
  }
}
