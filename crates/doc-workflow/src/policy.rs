// policy.rs
//
// Predicado de edición por campo. Las reglas se evalúan en orden y gana la
// primera que aplica: finalizado, paso no alcanzado, ya llenado, fecha u
// hora emparejada con un archivo bloqueado.
use crate::snapshot::PreviouslyFilled;
use crate::step::StepRegistry;
use doc_domain::FieldKey;
use flow::WorkflowStatus;
use std::fmt;

/// Motivo por el que un campo no se puede editar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockReason {
  Finalized,
  StepNotReached { step: usize, current: usize },
  PreviouslyFilled,
  PairedFileLocked { file: FieldKey },
}

impl fmt::Display for LockReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LockReason::Finalized => write!(f, "el workflow está finalizado"),
      LockReason::StepNotReached { step, current } => {
        write!(f, "el paso {} aún no está habilitado (paso actual {})", step + 1, current + 1)
      }
      LockReason::PreviouslyFilled => write!(f, "el campo ya fue guardado; límpielo para editarlo"),
      LockReason::PairedFileLocked { file } => write!(f, "el archivo '{}' del grupo está bloqueado", file),
    }
  }
}

/// Vista de sólo lectura del estado que decide los bloqueos.
#[derive(Debug, Clone, Copy)]
pub struct LockState<'a> {
  pub registry: &'a StepRegistry,
  pub status: WorkflowStatus,
  pub current_step: usize,
  pub previously_filled: &'a PreviouslyFilled,
}

impl<'a> LockState<'a> {
  pub fn new(registry: &'a StepRegistry,
             status: WorkflowStatus,
             current_step: usize,
             previously_filled: &'a PreviouslyFilled)
             -> Self {
    Self { registry, status, current_step, previously_filled }
  }

  /// Primera regla de bloqueo que aplica al campo, o `None` si es editable.
  pub fn lock_reason(&self, key: &FieldKey) -> Option<LockReason> {
    if self.status.is_finalized() {
      return Some(LockReason::Finalized);
    }
    if let Some(step) = self.registry.owning_step(key) {
      if step > self.current_step {
        return Some(LockReason::StepNotReached { step, current: self.current_step });
      }
    }
    if self.previously_filled.contains(key) {
      return Some(LockReason::PreviouslyFilled);
    }
    if let Some((_, group)) = self.registry.group_of(key) {
      if group.is_paired(key) && self.previously_filled.contains(group.file_key()) {
        return Some(LockReason::PairedFileLocked { file: group.file_key().clone() });
      }
    }
    None
  }

  pub fn is_locked(&self, key: &FieldKey) -> bool {
    self.lock_reason(key).is_some()
  }
}

/// Atajo sobre `LockState::lock_reason`.
pub fn lock_reason(key: &FieldKey, state: &LockState<'_>) -> Option<LockReason> {
  state.lock_reason(key)
}

pub fn is_locked(key: &FieldKey, state: &LockState<'_>) -> bool {
  state.is_locked(key)
}
