// field.rs
//
// Modelo de campos del formulario: claves, tipos declarados y valores
// etiquetados. Un valor de archivo es o bien un archivo recién elegido o una
// referencia a un archivo ya persistido, nunca ambos.
use crate::{DomainError, FileUpload};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Prefijo con el que viaja la referencia a un archivo ya persistido. Lo
/// define el formato de intercambio.
pub use flow::EXISTING_PREFIX;

/// Formato de fecha usado en payloads y registros.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Formato de hora usado en payloads y registros.
pub const TIME_FORMAT: &str = "%H:%M";

/// Nombre de un campo del formulario.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKey(String);

impl FieldKey {
  pub fn new(key: impl Into<String>) -> Self {
    Self(key.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Clave `existing_<campo>` bajo la que viaja un archivo ya persistido.
  pub fn existing_key(&self) -> String {
    format!("{}{}", EXISTING_PREFIX, self.0)
  }
}

impl fmt::Display for FieldKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for FieldKey {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

impl From<String> for FieldKey {
  fn from(s: String) -> Self {
    Self(s)
  }
}

impl From<&FieldKey> for FieldKey {
  fn from(k: &FieldKey) -> Self {
    k.clone()
  }
}

impl Borrow<str> for FieldKey {
  fn borrow(&self) -> &str {
    &self.0
  }
}

/// Tipo declarado de un campo. `Amount` se captura como texto y se valida
/// como decimal al guardar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
  Text,
  Amount,
  Date,
  Time,
  File,
}

impl fmt::Display for FieldKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      FieldKind::Text => "text",
      FieldKind::Amount => "amount",
      FieldKind::Date => "date",
      FieldKind::Time => "time",
      FieldKind::File => "file",
    };
    write!(f, "{}", s)
  }
}

/// Declaración de un campo dentro de un workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
  pub key: FieldKey,
  pub label: String,
  pub kind: FieldKind,
  pub max_len: Option<usize>,
}

impl FieldSpec {
  pub fn new(key: impl Into<FieldKey>, label: impl Into<String>, kind: FieldKind) -> Self {
    Self { key: key.into(), label: label.into(), kind, max_len: None }
  }

  pub fn text(key: impl Into<FieldKey>, label: impl Into<String>) -> Self {
    Self::new(key, label, FieldKind::Text)
  }

  pub fn amount(key: impl Into<FieldKey>, label: impl Into<String>) -> Self {
    Self::new(key, label, FieldKind::Amount)
  }

  pub fn date(key: impl Into<FieldKey>, label: impl Into<String>) -> Self {
    Self::new(key, label, FieldKind::Date)
  }

  pub fn time(key: impl Into<FieldKey>, label: impl Into<String>) -> Self {
    Self::new(key, label, FieldKind::Time)
  }

  pub fn file(key: impl Into<FieldKey>, label: impl Into<String>) -> Self {
    Self::new(key, label, FieldKind::File)
  }

  pub fn with_max_len(mut self, max_len: usize) -> Self {
    self.max_len = Some(max_len);
    self
  }
}

/// Valor de un campo de archivo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "file", rename_all = "snake_case")]
pub enum FileValue {
  /// Archivo recién elegido por el usuario, todavía no persistido.
  Upload(FileUpload),
  /// Ruta de un archivo ya persistido por el servicio externo.
  Existing(String),
}

impl FileValue {
  pub fn is_empty(&self) -> bool {
    match self {
      FileValue::Upload(u) => u.file_name().trim().is_empty(),
      FileValue::Existing(path) => path.trim().is_empty(),
    }
  }
}

/// Valor etiquetado de un campo del snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
  Text(String),
  Date(NaiveDate),
  Time(NaiveTime),
  File(FileValue),
}

impl FieldValue {
  /// Valor vacío: asignarlo equivale a dejar el campo en blanco.
  pub fn blank() -> Self {
    FieldValue::Text(String::new())
  }

  pub fn text(s: impl Into<String>) -> Self {
    FieldValue::Text(s.into())
  }

  pub fn upload(upload: FileUpload) -> Self {
    FieldValue::File(FileValue::Upload(upload))
  }

  pub fn existing(path: impl Into<String>) -> Self {
    FieldValue::File(FileValue::Existing(path.into()))
  }

  pub fn is_empty(&self) -> bool {
    match self {
      FieldValue::Text(s) => s.trim().is_empty(),
      FieldValue::Date(_) | FieldValue::Time(_) => false,
      FieldValue::File(f) => f.is_empty(),
    }
  }

  /// Indica si el valor puede asignarse a un campo del tipo dado. Un valor
  /// vacío encaja con cualquier tipo.
  pub fn matches(&self, kind: FieldKind) -> bool {
    if self.is_empty() {
      return true;
    }
    matches!((self, kind),
             (FieldValue::Text(_), FieldKind::Text)
             | (FieldValue::Text(_), FieldKind::Amount)
             | (FieldValue::Date(_), FieldKind::Date)
             | (FieldValue::Time(_), FieldKind::Time)
             | (FieldValue::File(_), FieldKind::File))
  }

  pub fn kind_name(&self) -> &'static str {
    match self {
      FieldValue::Text(_) => "text",
      FieldValue::Date(_) => "date",
      FieldValue::Time(_) => "time",
      FieldValue::File(_) => "file",
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      FieldValue::Text(s) => Some(s.as_str()),
      _ => None,
    }
  }

  pub fn as_date(&self) -> Option<NaiveDate> {
    match self {
      FieldValue::Date(d) => Some(*d),
      _ => None,
    }
  }

  pub fn as_file(&self) -> Option<&FileValue> {
    match self {
      FieldValue::File(f) => Some(f),
      _ => None,
    }
  }

  /// Interpreta texto plano según el tipo declarado. Para `File` el texto
  /// es la ruta de un archivo persistido. Texto vacío produce `blank()`.
  pub fn parse(kind: FieldKind, raw: &str) -> Result<FieldValue, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
      return Ok(FieldValue::blank());
    }
    match kind {
      FieldKind::Text | FieldKind::Amount => Ok(FieldValue::Text(raw.to_string())),
      FieldKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(FieldValue::Date)
        .map_err(|_| DomainError::ValidationError(format!("Fecha inválida '{}', se espera AAAA-MM-DD", raw))),
      FieldKind::Time => NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map(FieldValue::Time)
        .map_err(|_| DomainError::ValidationError(format!("Hora inválida '{}', se espera HH:MM", raw))),
      FieldKind::File => Ok(FieldValue::existing(raw)),
    }
  }
}
