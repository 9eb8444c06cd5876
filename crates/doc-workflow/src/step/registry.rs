use crate::errors::WorkflowError;
use crate::step::{FieldGroup, StepDefinition};
use crate::snapshot::FormSnapshot;
use doc_domain::FieldKey;
use std::collections::HashSet;

/// Lista ordenada y fija de pasos de un tipo de workflow.
///
/// Las invariantes se comprueban una sola vez al construirla:
/// - al menos un paso;
/// - nombres de paso únicos;
/// - cada paso tiene al menos un campo habilitante;
/// - ningún campo pertenece a dos pasos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRegistry {
  steps: Vec<StepDefinition>,
}

impl StepRegistry {
  pub fn new(steps: Vec<StepDefinition>) -> Result<Self, WorkflowError> {
    if steps.is_empty() {
      return Err(WorkflowError::Config("un registro de pasos necesita al menos un paso".into()));
    }
    let mut names = HashSet::new();
    let mut owned: HashSet<&FieldKey> = HashSet::new();
    for step in &steps {
      if !names.insert(step.name()) {
        return Err(WorkflowError::Config(format!("paso duplicado: {}", step.name())));
      }
      if step.gating_fields().next().is_none() {
        return Err(WorkflowError::Config(format!("el paso {} no tiene campos habilitantes", step.name())));
      }
      for key in step.owned_fields() {
        if !owned.insert(key) {
          return Err(WorkflowError::Config(format!("el campo {} pertenece a más de un paso", key)));
        }
      }
    }
    Ok(Self { steps })
  }

  pub fn steps(&self) -> &[StepDefinition] {
    &self.steps
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&StepDefinition> {
    self.steps.get(index)
  }

  /// Índice del último paso. El registro nunca está vacío.
  pub fn last_index(&self) -> usize {
    self.steps.len().saturating_sub(1)
  }

  pub fn last(&self) -> Option<&StepDefinition> {
    self.steps.last()
  }

  /// Paso dueño del campo, si lo hay. Los campos generales del workflow
  /// no pertenecen a ningún paso.
  pub fn owning_step(&self, key: &FieldKey) -> Option<usize> {
    self.steps.iter().position(|s| s.owns(key))
  }

  pub fn group_of(&self, key: &FieldKey) -> Option<(usize, &FieldGroup)> {
    self.steps.iter().enumerate().find_map(|(i, s)| s.group_of(key).map(|g| (i, g)))
  }

  /// Un paso está satisfecho si alguno de sus archivos habilitantes tiene
  /// valor (archivo nuevo o referencia persistida).
  pub fn is_satisfied(&self, index: usize, snapshot: &FormSnapshot) -> bool {
    self.steps.get(index).map(|s| s.gating_fields().any(|k| snapshot.is_filled(k))).unwrap_or(false)
  }
}
