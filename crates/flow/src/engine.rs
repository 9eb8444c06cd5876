// Archivo: engine.rs
// Propósito: reglas comunes que cualquier implementación de
// `PersistenceService` aplica a un envío: control optimista de versiones,
// estado terminal, materialización de archivos y entrada de historia.
//
// Las implementaciones concretas sólo deciden dónde guardar el resultado.
use crate::domain::{digest_fields, materialize_uploads, Ack, AuditLogEntry, PersistedRecord, SubmissionPayload,
                    WorkflowStatus};
use crate::errors::{FlowError, Result};
use chrono::Utc;
use url::Url;
use uuid::Uuid;

/// Resultado de aplicar un envío aceptado.
#[derive(Debug, Clone)]
pub struct AppliedSubmission {
    pub record: PersistedRecord,
    pub ack: Ack,
    pub entry: AuditLogEntry,
}

/// Aplica `payload` sobre el registro vigente (`None` si el workflow es
/// nuevo). `operation` es el estado que pide la operación invocada
/// (`save_draft` -> `Draft`, `finalize` -> `Finalized`).
///
/// Errores:
/// - `Other` si el payload no corresponde a la operación.
/// - `NotFound` si el payload apunta a un workflow inexistente.
/// - `Conflict` si el registro ya está finalizado o la versión no coincide.
pub fn apply_submission(current: Option<&PersistedRecord>,
                        payload: &SubmissionPayload,
                        operation: WorkflowStatus)
                        -> Result<AppliedSubmission> {
    if payload.target_status != operation {
        return Err(FlowError::Other(format!("payload con estado {} enviado a la operación {}",
                                            payload.target_status, operation)));
    }

    let (id, previous_version, created_by, created_at) = match (payload.workflow_id, current) {
        (None, None) => {
            if payload.expected_version != 0 {
                return Err(FlowError::Conflict(format!("versión esperada {} para un workflow nuevo",
                                                       payload.expected_version)));
            }
            (Uuid::new_v4(), 0, payload.actor.clone(), Utc::now())
        }
        (Some(id), None) => return Err(FlowError::NotFound(format!("workflow {}", id))),
        (_, Some(rec)) => {
            if rec.status.is_finalized() {
                return Err(FlowError::Conflict(format!("workflow {} ya finalizado", rec.id)));
            }
            if rec.version != payload.expected_version {
                return Err(FlowError::Conflict(format!("versión esperada {} pero la vigente es {}",
                                                       payload.expected_version, rec.version)));
            }
            (rec.id, rec.version, rec.created_by.clone(), rec.created_at)
        }
    };

    let (fields, stored_files) = materialize_uploads(&id, &payload.fields);
    let now = Utc::now();
    let version = previous_version.saturating_add(1);
    let digest = digest_fields(&fields);

    let record = PersistedRecord { id,
                                   workflow_type: payload.workflow_type.clone(),
                                   status: payload.target_status,
                                   version,
                                   current_step: payload.current_step,
                                   fields: fields.clone(),
                                   created_by,
                                   updated_by: payload.actor.clone(),
                                   created_at,
                                   updated_at: now,
                                   last_command_id: Some(payload.command_id) };
    let ack = Ack { workflow_id: id,
                    version,
                    status: payload.target_status,
                    action: payload.action,
                    stored_files,
                    command_id: payload.command_id };
    let entry = AuditLogEntry { workflow_id: id,
                                version,
                                timestamp: now,
                                actor: payload.actor.clone(),
                                action: payload.action,
                                status: payload.target_status,
                                snapshot: fields,
                                digest };
    Ok(AppliedSubmission { record, ack, entry })
}

/// Reconstruye el acuse de un envío repetido (mismo `command_id`) sin
/// volver a aplicarlo.
pub fn replay_ack(record: &PersistedRecord, payload: &SubmissionPayload) -> Ack {
    let (_, stored_files) = materialize_uploads(&record.id, &payload.fields);
    Ack { workflow_id: record.id,
          version: record.version,
          status: record.status,
          action: payload.action,
          stored_files,
          command_id: payload.command_id }
}

/// Resuelve una referencia persistida contra la URL base de archivos. Se
/// rechazan referencias absolutas o que intenten salir de la base.
pub fn resolve_against(base: &Url, file_reference: &str) -> Result<Url> {
    let reference = file_reference.trim();
    if reference.is_empty() || reference.starts_with('/') || reference.contains("..") || reference.contains("://") {
        return Err(FlowError::Other(format!("referencia de archivo inválida: {:?}", file_reference)));
    }
    base.join(reference).map_err(|e| FlowError::Other(format!("no se pudo resolver {}: {}", reference, e)))
}
