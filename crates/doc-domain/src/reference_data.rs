// reference_data.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};

/// Opción seleccionable (zona, círculo, división, obra...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefOption {
  pub id: String,
  pub label: String,
  pub parent_id: Option<String>,
}

/// Fuente de opciones de sólo lectura. El núcleo no depende de cómo se
/// obtienen.
pub trait ReferenceDataProvider: Send + Sync {
  /// Lista las opciones cuyo padre es `parent`; sin filtro devuelve todas.
  fn list(&self, parent: Option<&str>) -> Result<Vec<RefOption>, DomainError>;
}

/// Implementación en memoria. Sirve de proveedor en tests y a quien embeba
/// los formularios sin una fuente externa de catálogos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReferenceData {
  options: Vec<RefOption>,
}

impl InMemoryReferenceData {
  pub fn new() -> Self {
    Self { options: Vec::new() }
  }

  pub fn with_option(mut self, id: &str, label: &str, parent_id: Option<&str>) -> Self {
    self.options.push(RefOption { id: id.to_string(),
                                  label: label.to_string(),
                                  parent_id: parent_id.map(str::to_string) });
    self
  }
}

impl ReferenceDataProvider for InMemoryReferenceData {
  fn list(&self, parent: Option<&str>) -> Result<Vec<RefOption>, DomainError> {
    Ok(self.options
           .iter()
           .filter(|o| match parent {
             Some(p) => o.parent_id.as_deref() == Some(p),
             None => true,
           })
           .cloned()
           .collect())
  }
}
