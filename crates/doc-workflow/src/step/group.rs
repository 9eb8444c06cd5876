use doc_domain::FieldKey;

/// Archivo de un paso junto con su fecha y hora opcionales. Es la unidad de
/// bloqueo cruzado y de limpieza: limpiar cualquier miembro limpia el grupo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroup {
  file: FieldKey,
  date: Option<FieldKey>,
  time: Option<FieldKey>,
}

impl FieldGroup {
  pub fn file(key: impl Into<FieldKey>) -> Self {
    Self { file: key.into(), date: None, time: None }
  }

  pub fn with_date(mut self, key: impl Into<FieldKey>) -> Self {
    self.date = Some(key.into());
    self
  }

  pub fn with_time(mut self, key: impl Into<FieldKey>) -> Self {
    self.time = Some(key.into());
    self
  }

  pub fn file_key(&self) -> &FieldKey {
    &self.file
  }

  pub fn date_key(&self) -> Option<&FieldKey> {
    self.date.as_ref()
  }

  pub fn time_key(&self) -> Option<&FieldKey> {
    self.time.as_ref()
  }

  /// Archivo, fecha y hora, en ese orden.
  pub fn members(&self) -> impl Iterator<Item = &FieldKey> {
    std::iter::once(&self.file).chain(self.date.iter()).chain(self.time.iter())
  }

  pub fn contains(&self, key: &FieldKey) -> bool {
    self.members().any(|k| k == key)
  }

  /// Fecha u hora emparejada con el archivo del grupo.
  pub fn is_paired(&self, key: &FieldKey) -> bool {
    self.date.as_ref() == Some(key) || self.time.as_ref() == Some(key)
  }
}
