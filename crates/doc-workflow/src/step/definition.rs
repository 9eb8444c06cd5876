use crate::step::FieldGroup;
use doc_domain::FieldKey;

/// Paso del workflow: nombre, grupos de archivo que lo habilitan y campos
/// adicionales que sólo se editan una vez alcanzado el paso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
  name: String,
  label: String,
  groups: Vec<FieldGroup>,
  extra_fields: Vec<FieldKey>,
}

impl StepDefinition {
  pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
    Self { name: name.into(), label: label.into(), groups: Vec::new(), extra_fields: Vec::new() }
  }

  pub fn with_group(mut self, group: FieldGroup) -> Self {
    self.groups.push(group);
    self
  }

  /// Campo propio del paso que no participa en su habilitación.
  pub fn with_field(mut self, key: impl Into<FieldKey>) -> Self {
    self.extra_fields.push(key.into());
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn groups(&self) -> &[FieldGroup] {
    &self.groups
  }

  pub fn extra_fields(&self) -> &[FieldKey] {
    &self.extra_fields
  }

  /// Todos los campos que el paso puede editar.
  pub fn owned_fields(&self) -> impl Iterator<Item = &FieldKey> {
    self.groups.iter().flat_map(FieldGroup::members).chain(self.extra_fields.iter())
  }

  /// Campos cuya presencia completa el paso (los archivos de sus grupos).
  pub fn gating_fields(&self) -> impl Iterator<Item = &FieldKey> {
    self.groups.iter().map(FieldGroup::file_key)
  }

  pub fn owns(&self, key: &FieldKey) -> bool {
    self.owned_fields().any(|k| k == key)
  }

  pub fn group_of(&self, key: &FieldKey) -> Option<&FieldGroup> {
    self.groups.iter().find(|g| g.contains(key))
  }
}
