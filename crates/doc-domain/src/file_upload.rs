// file_upload.rs
use crate::errors::FileRejection;
use crate::DomainError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Tamaño máximo por defecto de un adjunto (5 MB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

const OCTET_STREAM: &str = "application/octet-stream";

/// Extensiones admitidas y su tipo de contenido.
static ALLOWED_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
  HashMap::from([("pdf", "application/pdf"),
                 ("doc", "application/msword"),
                 ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
                 ("jpg", "image/jpeg"),
                 ("jpeg", "image/jpeg"),
                 ("png", "image/png")])
});

/// Tipo de contenido conocido para la extensión del nombre de archivo.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
  let (_, ext) = file_name.rsplit_once('.')?;
  ALLOWED_TYPES.get(ext.to_ascii_lowercase().as_str()).copied()
}

fn is_allowed_content_type(content_type: &str) -> bool {
  ALLOWED_TYPES.values().any(|t| *t == content_type)
}

/// Archivo elegido por el usuario. Viaja con su contenido en base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
  file_name: String,
  content_type: String,
  size_bytes: u64,
  sha256: String,
  #[serde(rename = "content_base64", with = "base64_bytes")]
  content: Vec<u8>,
}

impl FileUpload {
  /// Construye el adjunto calculando tamaño y checksum. Si no se declara
  /// tipo de contenido se deduce de la extensión.
  pub fn from_bytes(file_name: impl Into<String>, content_type: Option<&str>, content: Vec<u8>) -> Self {
    let file_name = file_name.into();
    let content_type = match content_type.map(str::trim).filter(|s| !s.is_empty()) {
      Some(ct) => ct.to_ascii_lowercase(),
      None => content_type_for(&file_name).unwrap_or(OCTET_STREAM).to_string(),
    };
    let sha256 = format!("{:x}", Sha256::digest(&content));
    Self { file_name, content_type, size_bytes: content.len() as u64, sha256, content }
  }

  pub fn file_name(&self) -> &str {
    &self.file_name
  }

  pub fn content_type(&self) -> &str {
    &self.content_type
  }

  pub fn size_bytes(&self) -> u64 {
    self.size_bytes
  }

  pub fn sha256(&self) -> &str {
    &self.sha256
  }

  pub fn content(&self) -> &[u8] {
    &self.content
  }

  /// Representación JSON usada en el payload de envío.
  pub fn to_wire(&self) -> serde_json::Value {
    serde_json::json!({
      "file_name": self.file_name,
      "content_type": self.content_type,
      "size_bytes": self.size_bytes,
      "sha256": self.sha256,
      "content_base64": STANDARD.encode(&self.content),
    })
  }

  /// Reconstruye un adjunto desde su representación en el payload y
  /// comprueba que el checksum coincide con el contenido.
  pub fn from_wire(value: &serde_json::Value) -> Result<Self, DomainError> {
    let upload: FileUpload = serde_json::from_value(value.clone())?;
    let actual = format!("{:x}", Sha256::digest(&upload.content));
    if actual != upload.sha256 {
      return Err(DomainError::ValidationError(format!("Checksum inválido para {}", upload.file_name)));
    }
    Ok(upload)
  }
}

/// Restricciones que un archivo debe cumplir antes de entrar al snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConstraints {
  pub max_bytes: u64,
}

impl Default for FileConstraints {
  fn default() -> Self {
    Self { max_bytes: DEFAULT_MAX_FILE_BYTES }
  }
}

impl FileConstraints {
  pub fn check(&self, upload: &FileUpload) -> Result<(), DomainError> {
    if upload.size_bytes > self.max_bytes {
      return Err(DomainError::FileRejected { kind: FileRejection::TooLarge,
                                             message: format!("{} ocupa {} bytes, el máximo es {}",
                                                              upload.file_name, upload.size_bytes, self.max_bytes) });
    }
    let declared = upload.content_type.split(';').next().unwrap_or_default().trim();
    let allowed = if declared.is_empty() || declared == OCTET_STREAM {
      content_type_for(&upload.file_name).is_some()
    } else {
      is_allowed_content_type(declared)
    };
    if !allowed {
      return Err(DomainError::FileRejected { kind: FileRejection::UnsupportedType,
                                             message: format!("{} ({}) no es PDF, DOC/DOCX, JPEG ni PNG",
                                                              upload.file_name, upload.content_type) });
    }
    Ok(())
  }
}

mod base64_bytes {
  use base64::engine::general_purpose::STANDARD;
  use base64::Engine as _;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&STANDARD.encode(bytes))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(d)?;
    STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rejection(result: Result<(), DomainError>) -> Option<FileRejection> {
    match result {
      Err(DomainError::FileRejected { kind, .. }) => Some(kind),
      _ => None,
    }
  }

  #[test]
  fn content_type_is_inferred_from_extension() {
    let up = FileUpload::from_bytes("Acta.PDF", None, b"%PDF-1.4".to_vec());
    assert_eq!(up.content_type(), "application/pdf");
    assert_eq!(up.size_bytes(), 8);
    assert!(FileConstraints::default().check(&up).is_ok());
  }

  #[test]
  fn oversized_file_is_rejected() {
    let up = FileUpload::from_bytes("big.pdf", None, vec![0u8; 6 * 1024 * 1024]);
    assert_eq!(rejection(FileConstraints::default().check(&up)), Some(FileRejection::TooLarge));
  }

  #[test]
  fn exactly_five_megabytes_is_accepted() {
    let up = FileUpload::from_bytes("limit.png", None, vec![0u8; DEFAULT_MAX_FILE_BYTES as usize]);
    assert!(FileConstraints::default().check(&up).is_ok());
  }

  #[test]
  fn unsupported_types_are_rejected() {
    let exe = FileUpload::from_bytes("setup.exe", None, vec![1, 2, 3]);
    assert_eq!(rejection(FileConstraints::default().check(&exe)), Some(FileRejection::UnsupportedType));
    let declared = FileUpload::from_bytes("notes.pdf", Some("text/plain"), vec![1]);
    assert_eq!(rejection(FileConstraints::default().check(&declared)), Some(FileRejection::UnsupportedType));
    let with_params = FileUpload::from_bytes("scan", Some("image/png; charset=binary"), vec![1]);
    assert!(FileConstraints::default().check(&with_params).is_ok());
  }

  #[test]
  fn wire_form_restores_content() -> Result<(), DomainError> {
    let up = FileUpload::from_bytes("loa.docx", None, b"contenido".to_vec());
    let back = FileUpload::from_wire(&up.to_wire())?;
    assert_eq!(back, up);
    Ok(())
  }

  #[test]
  fn tampered_wire_checksum_is_rejected() {
    let up = FileUpload::from_bytes("loa.pdf", None, b"original".to_vec());
    let mut wire = up.to_wire();
    wire["sha256"] = serde_json::json!("00");
    assert!(FileUpload::from_wire(&wire).is_err());
  }
}
