// progress.rs
//
// Índice del paso actual y transiciones entre pasos. El índice siempre
// queda dentro de [0, pasos - 1].
use crate::errors::WorkflowError;
use crate::snapshot::FormSnapshot;
use crate::step::StepRegistry;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressTracker {
  current: usize,
}

impl ProgressTracker {
  /// Tracker de un workflow nuevo, en el primer paso.
  pub fn starting() -> Self {
    Self { current: 0 }
  }

  /// Tracker en el índice dado, acotado al último paso del registro.
  pub fn at(index: usize, registry: &StepRegistry) -> Self {
    Self { current: index.min(registry.last_index()) }
  }

  /// Reconciliación única al cargar: el paso siguiente al último satisfecho,
  /// acotado al último paso. Sin pasos satisfechos queda en 0.
  pub fn rehydrate(registry: &StepRegistry, snapshot: &FormSnapshot) -> Self {
    let highest = (0..registry.len()).rev().find(|&i| registry.is_satisfied(i, snapshot));
    let current = match highest {
      Some(i) => (i + 1).min(registry.last_index()),
      None => 0,
    };
    debug!("rehydrate: paso actual {}", current);
    Self { current }
  }

  pub fn current_index(&self) -> usize {
    self.current
  }

  /// Un paso está completo si ya fue alcanzado y tiene algún archivo
  /// habilitante.
  pub fn is_step_complete(&self, index: usize, registry: &StepRegistry, snapshot: &FormSnapshot) -> bool {
    index <= self.current && registry.is_satisfied(index, snapshot)
  }

  pub fn is_current_step_complete(&self, registry: &StepRegistry, snapshot: &FormSnapshot) -> bool {
    self.is_step_complete(self.current, registry, snapshot)
  }

  pub fn all_steps_complete(&self, registry: &StepRegistry, snapshot: &FormSnapshot) -> bool {
    (0..registry.len()).all(|i| self.is_step_complete(i, registry, snapshot))
  }

  /// Avanza un paso si el actual está completo y no es el último.
  /// Devuelve si hubo cambio.
  pub fn advance(&mut self, registry: &StepRegistry, snapshot: &FormSnapshot) -> bool {
    if self.current < registry.last_index() && self.is_current_step_complete(registry, snapshot) {
      self.current += 1;
      true
    } else {
      false
    }
  }

  pub fn retreat(&mut self) -> bool {
    if self.current > 0 {
      self.current -= 1;
      true
    } else {
      false
    }
  }

  /// Salta a `index`. Hacia atrás siempre se permite; hacia adelante sólo a
  /// través de pasos consecutivos completos, como avances repetidos.
  pub fn jump_to(&mut self,
                 index: usize,
                 registry: &StepRegistry,
                 snapshot: &FormSnapshot)
                 -> Result<(), WorkflowError> {
    if index >= registry.len() {
      return Err(WorkflowError::NavigationBlocked(format!("el paso {} no existe", index + 1)));
    }
    if index <= self.current {
      self.current = index;
      return Ok(());
    }
    let mut probe = *self;
    while probe.current < index {
      if !probe.advance(registry, snapshot) {
        return Err(WorkflowError::NavigationBlocked(format!("el paso {} no está completo", probe.current + 1)));
      }
    }
    *self = probe;
    Ok(())
  }
}
