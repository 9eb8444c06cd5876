// Archivo: errors.rs
// Propósito: definir los errores del servicio de persistencia y el alias
// Result<T> usado por las APIs del crate.
use thiserror::Error;
/// Errores comunes de la frontera de persistencia.
///
/// - `NotFound`: workflow o registro no encontrado.
/// - `Conflict`: versión esperada distinta o workflow ya finalizado.
/// - `Storage`: error al acceder al almacenamiento externo.
/// - `Other`: cualquier otro error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
  /// Entidad no encontrada (por ejemplo, workflow o historial).
  #[error("No encontrado: {0}")]
  NotFound(String),
  /// Conflicto optimista (version/expected mismatch) o estado terminal.
  #[error("Conflicto: {0}")]
  Conflict(String),
  /// Error genérico de almacenamiento (disco, red, etc.).
  #[error("Error de almacenamiento: {0}")]
  Storage(String),
  /// Otro tipo de error.
  #[error("Otro: {0}")]
  Other(String),
}
/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, FlowError>;
