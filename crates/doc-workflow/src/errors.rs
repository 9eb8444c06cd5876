use crate::gate::ValidationReport;
use crate::policy::LockReason;
use doc_domain::{DomainError, FieldKey, FieldKind, FileRejection};
use thiserror::Error;

// Errores comunes del controlador de workflow.
//
// Todos se devuelven como valor; ninguno deja el snapshot a medio aplicar.
#[derive(Error, Debug)]
pub enum WorkflowError {
  /// Errores originados por el servicio de persistencia (`flow` crate).
  #[error("Error de persistencia: {0}")]
  Flow(#[from] flow::errors::FlowError),

  /// Errores de validación del modelo de campos.
  #[error("Error de dominio: {0}")]
  Domain(#[from] DomainError),

  /// Se intentó modificar un campo bloqueado.
  #[error("Campo bloqueado '{field}': {reason}")]
  LockViolation { field: FieldKey, reason: LockReason },

  /// La compuerta de envío rechazó el snapshot.
  #[error("Validación fallida: {0}")]
  Validation(ValidationReport),

  /// El archivo no cumple las restricciones; el valor previo se conserva.
  #[error("Archivo rechazado para '{field}' ({kind}): {message}")]
  FileRejected { field: FieldKey, kind: FileRejection, message: String },

  #[error("Campo desconocido: {0}")]
  UnknownField(FieldKey),

  #[error("El campo '{field}' espera {expected}, se recibió {found}")]
  FieldKindMismatch { field: FieldKey, expected: FieldKind, found: &'static str },

  /// Limpiar un campo es destructivo y exige confirmación explícita.
  #[error("Limpiar '{0}' requiere confirmación explícita")]
  ClearNotConfirmed(FieldKey),

  #[error("Navegación bloqueada: {0}")]
  NavigationBlocked(String),

  #[error("Ya hay un envío en curso para este workflow")]
  SubmissionInFlight,

  #[error("El workflow ya está finalizado")]
  AlreadyFinalized,

  #[error("Operación no permitida: {0}")]
  Forbidden(String),

  #[error("Error de serialización: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Definición de workflow o configuración inválida.
  #[error("Error de configuración: {0}")]
  Config(String),
}

impl WorkflowError {
  /// Motivo del rechazo si el error es de archivo.
  pub fn file_rejection(&self) -> Option<FileRejection> {
    match self {
      WorkflowError::FileRejected { kind, .. } => Some(*kind),
      _ => None,
    }
  }

  pub fn is_lock_violation(&self) -> bool {
    matches!(self, WorkflowError::LockViolation { .. })
  }
}
