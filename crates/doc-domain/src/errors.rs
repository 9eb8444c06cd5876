// errors.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Motivo por el que un archivo no puede entrar en el snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRejection {
  TooLarge,
  UnsupportedType,
}

impl fmt::Display for FileRejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      FileRejection::TooLarge => "too_large",
      FileRejection::UnsupportedType => "unsupported_type",
    };
    write!(f, "{}", s)
  }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
  #[error("Archivo rechazado ({kind}): {message}")]
  FileRejected { kind: FileRejection, message: String },
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl From<serde_json::Error> for DomainError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}
