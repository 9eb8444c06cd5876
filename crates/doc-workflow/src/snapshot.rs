// snapshot.rs
//
// Estado en memoria del formulario: valores por campo en orden de
// inserción y el conjunto de campos que ya fueron llenados y persistidos.
use doc_domain::{FieldKey, FieldValue};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Campos llenados en la carga o fusionados tras cada guardado exitoso.
pub type PreviouslyFilled = BTreeSet<FieldKey>;

/// Valores actuales del formulario. Un campo vacío no se guarda: asignar un
/// valor vacío equivale a quitarlo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
  values: IndexMap<FieldKey, FieldValue>,
}

impl FormSnapshot {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &FieldKey) -> Option<&FieldValue> {
    self.values.get(key)
  }

  pub fn is_filled(&self, key: &FieldKey) -> bool {
    self.values.get(key).map(|v| !v.is_empty()).unwrap_or(false)
  }

  /// Asigna el valor y devuelve el anterior.
  pub fn set(&mut self, key: FieldKey, value: FieldValue) -> Option<FieldValue> {
    if value.is_empty() {
      self.values.shift_remove(&key)
    } else {
      self.values.insert(key, value)
    }
  }

  pub fn blank(&mut self, key: &FieldKey) -> Option<FieldValue> {
    self.values.shift_remove(key)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
    self.values.iter()
  }

  pub fn filled_keys(&self) -> impl Iterator<Item = &FieldKey> {
    self.values.iter().filter(|(_, v)| !v.is_empty()).map(|(k, _)| k)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

impl FromIterator<(FieldKey, FieldValue)> for FormSnapshot {
  fn from_iter<I: IntoIterator<Item = (FieldKey, FieldValue)>>(iter: I) -> Self {
    let mut snapshot = FormSnapshot::new();
    for (k, v) in iter {
      snapshot.set(k, v);
    }
    snapshot
  }
}
