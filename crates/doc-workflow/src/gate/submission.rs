// submission.rs
//
// Compuerta de envío: validación de borrador y final, y armado del payload
// normalizado que se entrega al servicio de persistencia.
use crate::definition::WorkflowDefinition;
use crate::gate::{ValidationErrorKind, ValidationReport};
use crate::progress::ProgressTracker;
use crate::snapshot::FormSnapshot;
use chrono::Utc;
use doc_domain::{parse_amount, FieldKind, FieldValue, FileValue, DATE_FORMAT, TIME_FORMAT};
use flow::{ActionType, FieldMap, SubmissionPayload, WorkflowStatus};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Datos del envío que no salen del snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitContext {
  pub workflow_id: Option<Uuid>,
  pub is_editing_existing: bool,
  /// Id del usuario que envía.
  pub actor: String,
  pub expected_version: i64,
}

/// Etiqueta de auditoría según destino y si se edita un registro existente.
pub fn action_for(target: WorkflowStatus, is_editing_existing: bool) -> ActionType {
  match (target, is_editing_existing) {
    (WorkflowStatus::Finalized, _) => ActionType::FinalSubmit,
    (WorkflowStatus::Draft, true) => ActionType::Update,
    (WorkflowStatus::Draft, false) => ActionType::DraftSave,
  }
}

pub struct SubmissionGate<'a> {
  definition: &'a WorkflowDefinition,
}

impl<'a> SubmissionGate<'a> {
  pub fn new(definition: &'a WorkflowDefinition) -> Self {
    Self { definition }
  }

  /// Comprobaciones de formato sobre los campos con valor. Un snapshot vacío
  /// siempre pasa.
  pub fn validate_draft(&self, snapshot: &FormSnapshot) -> ValidationReport {
    let mut report = ValidationReport::new();
    for (key, value) in snapshot.iter() {
      if value.is_empty() {
        continue;
      }
      let Some(spec) = self.definition.field(key) else {
        report.push(ValidationErrorKind::InvalidFormat, Some(key.clone()), "campo no declarado en el workflow");
        continue;
      };
      if !value.matches(spec.kind) {
        report.push(ValidationErrorKind::InvalidFormat,
                    Some(key.clone()),
                    format!("se esperaba {}, hay {}", spec.kind, value.kind_name()));
        continue;
      }
      if let Some(text) = value.as_text() {
        if spec.kind == FieldKind::Amount {
          if let Err(e) = parse_amount(text) {
            report.push(ValidationErrorKind::InvalidFormat, Some(key.clone()), e.to_string());
          }
        }
        if let Some(max) = spec.max_len {
          let len = text.trim().chars().count();
          if len > max {
            report.push(ValidationErrorKind::InvalidFormat,
                        Some(key.clone()),
                        format!("máximo {} caracteres, hay {}", max, len));
          }
        }
      }
    }
    if let Some((from, to)) = self.definition.validity_period() {
      let start = snapshot.get(from).and_then(FieldValue::as_date);
      let end = snapshot.get(to).and_then(FieldValue::as_date);
      if let (Some(start), Some(end)) = (start, end) {
        if end < start {
          report.push(ValidationErrorKind::InvalidFormat,
                      Some(to.clone()),
                      format!("el período termina ({}) antes de empezar ({})", end, start));
        }
      }
    }
    report
  }

  /// Validación de borrador más obligatorios, archivo del último paso y
  /// pasos completos. Reúne todos los problemas.
  pub fn validate_final(&self, snapshot: &FormSnapshot, progress: &ProgressTracker) -> ValidationReport {
    let mut report = self.validate_draft(snapshot);
    for key in self.definition.mandatory() {
      if !snapshot.is_filled(key) {
        report.push(ValidationErrorKind::MissingRequiredField, Some(key.clone()), "campo obligatorio vacío");
      }
    }
    let registry = self.definition.registry();
    if let Some(last) = registry.last() {
      if !last.gating_fields().any(|k| snapshot.is_filled(k)) {
        for key in last.gating_fields() {
          report.push(ValidationErrorKind::MissingRequiredField,
                      Some(key.clone()),
                      format!("falta el archivo del paso final '{}'", last.label()));
        }
      }
    }
    if !progress.all_steps_complete(registry, snapshot) {
      let pending: Vec<String> = (0..registry.len()).filter(|&i| !progress.is_step_complete(i, registry, snapshot))
                                                    .filter_map(|i| registry.get(i).map(|s| s.label().to_string()))
                                                    .collect();
      report.push(ValidationErrorKind::IncompleteSteps, None, format!("pasos incompletos: {}", pending.join(", ")));
    }
    report
  }

  /// Valida según el destino y arma el payload.
  pub fn submit(&self,
                snapshot: &FormSnapshot,
                progress: &ProgressTracker,
                target: WorkflowStatus,
                context: &SubmitContext)
                -> Result<SubmissionPayload, ValidationReport> {
    let report = match target {
      WorkflowStatus::Draft => self.validate_draft(snapshot),
      WorkflowStatus::Finalized => self.validate_final(snapshot, progress),
    };
    report.into_result()?;
    Ok(SubmissionPayload { workflow_id: context.workflow_id,
                           workflow_type: self.definition.workflow_type().to_string(),
                           target_status: target,
                           action: action_for(target, context.is_editing_existing),
                           actor: context.actor.clone(),
                           current_step: progress.current_index() as u32,
                           fields: self.normalize(snapshot),
                           expected_version: context.expected_version,
                           command_id: Uuid::new_v4(),
                           submitted_at: Utc::now() })
  }

  /// Campos con valor en el orden en que los declara el workflow.
  pub fn normalize(&self, snapshot: &FormSnapshot) -> FieldMap {
    let mut out = FieldMap::new();
    for spec in self.definition.fields() {
      let Some(value) = snapshot.get(&spec.key).filter(|v| !v.is_empty()) else {
        continue;
      };
      match value {
        FieldValue::Text(s) => {
          out.insert(spec.key.to_string(), JsonValue::String(s.trim().to_string()));
        }
        FieldValue::Date(d) => {
          out.insert(spec.key.to_string(), JsonValue::String(d.format(DATE_FORMAT).to_string()));
        }
        FieldValue::Time(t) => {
          out.insert(spec.key.to_string(), JsonValue::String(t.format(TIME_FORMAT).to_string()));
        }
        FieldValue::File(FileValue::Upload(upload)) => {
          out.insert(spec.key.to_string(), upload.to_wire());
        }
        FieldValue::File(FileValue::Existing(path)) => {
          out.insert(spec.key.existing_key(), JsonValue::String(path.clone()));
        }
      }
    }
    out
  }
}
