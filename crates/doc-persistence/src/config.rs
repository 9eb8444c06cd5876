use flow::{FlowError, DEFAULT_FILE_BASE_URL};
use std::path::PathBuf;
use url::Url;

/// Directorio de datos por defecto, relativo al directorio de trabajo.
pub const DEFAULT_DATA_DIR: &str = "./docflow-data";

/// Ubicación del almacén en disco y URL base con la que se publican los
/// archivos subidos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
  pub data_dir: PathBuf,
  pub file_base_url: String,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { data_dir: PathBuf::from(DEFAULT_DATA_DIR), file_base_url: DEFAULT_FILE_BASE_URL.to_string() }
  }
}

impl StoreConfig {
  /// Lee `DOCFLOW_DATA_DIR` y `DOCFLOW_FILE_BASE_URL` (con `.env` si existe).
  pub fn from_env() -> Result<Self, FlowError> {
    dotenvy::dotenv().ok();
    let data_dir = std::env::var("DOCFLOW_DATA_DIR").map(PathBuf::from)
                                                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
    let file_base_url = std::env::var("DOCFLOW_FILE_BASE_URL").unwrap_or_else(|_| DEFAULT_FILE_BASE_URL.to_string());
    Ok(Self { data_dir, file_base_url: normalize_base(&file_base_url)? })
  }
}

/// La URL base debe ser absoluta y terminar en '/' para que `join` conserve
/// su último segmento.
pub fn normalize_base(raw: &str) -> Result<String, FlowError> {
  let mut base = raw.trim().to_string();
  if !base.ends_with('/') {
    base.push('/');
  }
  Url::parse(&base).map_err(|e| FlowError::Other(format!("DOCFLOW_FILE_BASE_URL inválida '{}': {}", raw, e)))?;
  Ok(base)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base_gets_trailing_slash() {
    assert_eq!(normalize_base("https://files.example.org/docs").unwrap(), "https://files.example.org/docs/");
    assert!(normalize_base("not a url").is_err());
  }
}
