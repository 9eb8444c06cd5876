use crate::errors::WorkflowError;
use crate::step::{StepDefinition, StepRegistry};
use crate::workflow_type::WorkflowType;
use doc_domain::{FieldKey, FieldKind, FieldSpec};
use indexmap::IndexMap;

/// Definición completa de un tipo de workflow: pasos, esquema de campos,
/// campos obligatorios para finalizar y período de validez opcional.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
  workflow_type: WorkflowType,
  registry: StepRegistry,
  fields: IndexMap<FieldKey, FieldSpec>,
  mandatory: Vec<FieldKey>,
  validity_period: Option<(FieldKey, FieldKey)>,
}

impl WorkflowDefinition {
  pub fn builder(workflow_type: WorkflowType) -> WorkflowDefinitionBuilder {
    WorkflowDefinitionBuilder { workflow_type,
                                fields: IndexMap::new(),
                                steps: Vec::new(),
                                mandatory: Vec::new(),
                                validity_period: None }
  }

  pub fn workflow_type(&self) -> &WorkflowType {
    &self.workflow_type
  }

  pub fn registry(&self) -> &StepRegistry {
    &self.registry
  }

  pub fn field(&self, key: &FieldKey) -> Option<&FieldSpec> {
    self.fields.get(key)
  }

  pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
    self.fields.values()
  }

  pub fn kind_of(&self, key: &FieldKey) -> Option<FieldKind> {
    self.fields.get(key).map(|f| f.kind)
  }

  pub fn mandatory(&self) -> &[FieldKey] {
    &self.mandatory
  }

  /// Campos (desde, hasta) del período de validez.
  pub fn validity_period(&self) -> Option<(&FieldKey, &FieldKey)> {
    self.validity_period.as_ref().map(|(a, b)| (a, b))
  }
}

pub struct WorkflowDefinitionBuilder {
  workflow_type: WorkflowType,
  fields: IndexMap<FieldKey, FieldSpec>,
  steps: Vec<StepDefinition>,
  mandatory: Vec<FieldKey>,
  validity_period: Option<(FieldKey, FieldKey)>,
}

impl WorkflowDefinitionBuilder {
  /// Declara un campo. Los miembros de los grupos de archivo se declaran
  /// solos al construir si no se hizo antes.
  pub fn field(mut self, spec: FieldSpec) -> Self {
    self.fields.insert(spec.key.clone(), spec);
    self
  }

  pub fn step(mut self, step: StepDefinition) -> Self {
    self.steps.push(step);
    self
  }

  pub fn mandatory<I, K>(mut self, keys: I) -> Self
    where I: IntoIterator<Item = K>,
          K: Into<FieldKey>
  {
    self.mandatory.extend(keys.into_iter().map(Into::into));
    self
  }

  pub fn validity_period(mut self, from: impl Into<FieldKey>, to: impl Into<FieldKey>) -> Self {
    self.validity_period = Some((from.into(), to.into()));
    self
  }

  pub fn build(mut self) -> Result<WorkflowDefinition, WorkflowError> {
    for step in &self.steps {
      for group in step.groups() {
        declare(&mut self.fields, group.file_key(), FieldKind::File, step.label())?;
        if let Some(k) = group.date_key() {
          declare(&mut self.fields, k, FieldKind::Date, step.label())?;
        }
        if let Some(k) = group.time_key() {
          declare(&mut self.fields, k, FieldKind::Time, step.label())?;
        }
      }
      if let Some(missing) = step.extra_fields().iter().find(|k| !self.fields.contains_key(*k)) {
        return Err(WorkflowError::Config(format!("el paso {} usa el campo no declarado {}", step.name(), missing)));
      }
    }
    if let Some(missing) = self.mandatory.iter().find(|k| !self.fields.contains_key(*k)) {
      return Err(WorkflowError::Config(format!("campo obligatorio no declarado: {}", missing)));
    }
    if let Some((from, to)) = &self.validity_period {
      for key in [from, to] {
        if self.fields.get(key).map(|f| f.kind) != Some(FieldKind::Date) {
          return Err(WorkflowError::Config(format!("el período de validez requiere el campo de fecha {}", key)));
        }
      }
    }
    let registry = StepRegistry::new(self.steps)?;
    Ok(WorkflowDefinition { workflow_type: self.workflow_type,
                            registry,
                            fields: self.fields,
                            mandatory: self.mandatory,
                            validity_period: self.validity_period })
  }
}

fn declare(fields: &mut IndexMap<FieldKey, FieldSpec>,
           key: &FieldKey,
           kind: FieldKind,
           label: &str)
           -> Result<(), WorkflowError> {
  match fields.get(key) {
    Some(spec) if spec.kind != kind => {
      Err(WorkflowError::Config(format!("el campo {} está declarado como {} pero el grupo lo usa como {}", key, spec.kind, kind)))
    }
    Some(_) => Ok(()),
    None => {
      fields.insert(key.clone(), FieldSpec::new(key, format!("{} ({})", label, kind), kind));
      Ok(())
    }
  }
}
