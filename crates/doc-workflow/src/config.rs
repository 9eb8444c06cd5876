// config.rs
//
// Configuración del controlador y del usuario tomada del entorno. Se carga
// `.env` si existe.
use crate::errors::WorkflowError;
use doc_domain::{FileConstraints, Role, UserContext, DEFAULT_MAX_FILE_BYTES};
use serde::{Deserialize, Serialize};

/// Parámetros del controlador que no dependen del tipo de workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
  pub file_constraints: FileConstraints,
}

impl WorkflowConfig {
  /// Lee `DOCFLOW_MAX_FILE_BYTES` (por defecto 5 MiB).
  pub fn from_env() -> Result<Self, WorkflowError> {
    dotenvy::dotenv().ok();
    let max_bytes = match std::env::var("DOCFLOW_MAX_FILE_BYTES") {
      Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                                               WorkflowError::Config(format!("DOCFLOW_MAX_FILE_BYTES inválido: {}", raw))
                                             })?,
      Err(_) => DEFAULT_MAX_FILE_BYTES,
    };
    Ok(Self { file_constraints: FileConstraints { max_bytes } })
  }
}

/// Construye el `UserContext` desde `DOCFLOW_USER_ID`, `DOCFLOW_USER_NAME`,
/// `DOCFLOW_USER_ROLE` y la adscripción `DOCFLOW_ZONE`, `DOCFLOW_CIRCLE`,
/// `DOCFLOW_DIVISION`.
pub fn user_context_from_env() -> Result<UserContext, WorkflowError> {
  dotenvy::dotenv().ok();
  let user_id = std::env::var("DOCFLOW_USER_ID").unwrap_or_else(|_| "local".into());
  let name = std::env::var("DOCFLOW_USER_NAME").unwrap_or_else(|_| user_id.clone());
  let role = match std::env::var("DOCFLOW_USER_ROLE") {
    Ok(raw) => raw.parse::<Role>()?,
    Err(_) => Role::DataEntry,
  };
  let opt = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
  Ok(UserContext::new(user_id, name, role).with_affiliation(opt("DOCFLOW_ZONE"),
                                                            opt("DOCFLOW_CIRCLE"),
                                                            opt("DOCFLOW_DIVISION")))
}
