//! Persistencia en archivos JSON para `flow::PersistenceService`.
//!
//! Guarda un documento por workflow, su historia en formato JSON Lines y los
//! bytes de los archivos subidos bajo un directorio de datos configurable.

mod config;
mod json_store;

pub use config::{normalize_base, StoreConfig, DEFAULT_DATA_DIR};
pub use json_store::JsonFilePersistence;

/// Abre el almacén indicado por `DOCFLOW_DATA_DIR` / `DOCFLOW_FILE_BASE_URL`.
pub fn new_from_env() -> Result<JsonFilePersistence, flow::FlowError> {
  let config = StoreConfig::from_env()?;
  JsonFilePersistence::from_config(&config)
}
