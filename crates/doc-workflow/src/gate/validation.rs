use doc_domain::FieldKey;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
  MissingRequiredField,
  InvalidFormat,
  IncompleteSteps,
}

impl fmt::Display for ValidationErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ValidationErrorKind::MissingRequiredField => "missing_required_field",
      ValidationErrorKind::InvalidFormat => "invalid_format",
      ValidationErrorKind::IncompleteSteps => "incomplete_steps",
    };
    write!(f, "{}", s)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
  pub kind: ValidationErrorKind,
  /// `None` para problemas que no son de un campo concreto.
  pub field: Option<FieldKey>,
  pub message: String,
}

/// Todos los problemas encontrados en una validación. Nunca se corta en el
/// primero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
  issues: Vec<ValidationIssue>,
}

impl ValidationReport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, kind: ValidationErrorKind, field: Option<FieldKey>, message: impl Into<String>) {
    self.issues.push(ValidationIssue { kind, field, message: message.into() });
  }

  pub fn is_ok(&self) -> bool {
    self.issues.is_empty()
  }

  pub fn issues(&self) -> &[ValidationIssue] {
    &self.issues
  }

  pub fn has(&self, kind: ValidationErrorKind) -> bool {
    self.issues.iter().any(|i| i.kind == kind)
  }

  /// ¿Hay un problema del tipo dado sobre este campo?
  pub fn has_field(&self, kind: ValidationErrorKind, field: &str) -> bool {
    self.issues.iter().any(|i| i.kind == kind && i.field.as_ref().map(FieldKey::as_str) == Some(field))
  }

  pub fn merge(&mut self, other: ValidationReport) {
    self.issues.extend(other.issues);
  }

  pub fn into_result(self) -> Result<(), ValidationReport> {
    if self.is_ok() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

impl fmt::Display for ValidationReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self.issues
                                 .iter()
                                 .map(|i| match &i.field {
                                   Some(k) => format!("[{}] {}: {}", i.kind, k, i.message),
                                   None => format!("[{}] {}", i.kind, i.message),
                                 })
                                 .collect();
    write!(f, "{}", parts.join("; "))
  }
}
