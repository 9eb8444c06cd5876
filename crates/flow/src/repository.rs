// Archivo: repository.rs
// Propósito: definir el trait `PersistenceService`, el contrato con el
// servicio externo que guarda borradores, finaliza workflows y expone su
// historia. Lo implementan el stub en memoria y el almacén en archivos.
use crate::domain::{Ack, AuditLogEntry, PersistedRecord, SubmissionPayload};
use crate::errors::Result;
use url::Url;
use uuid::Uuid;

/// Contrato del servicio de persistencia de workflows.
///
/// Todas las operaciones son síncronas desde el punto de vista del núcleo:
/// una petición y una respuesta. Un fallo no deja estado parcial en el
/// cliente; el mismo envío puede reintentarse.
pub trait PersistenceService: Send + Sync {
    /// Carga el registro vigente. `NotFound` si no existe.
    fn load_workflow(&self, id: &Uuid) -> Result<PersistedRecord>;

    /// Guarda un borrador (nuevo o existente). Devuelve el acuse con la
    /// nueva versión y las rutas de los archivos subidos.
    fn save_draft(&self, payload: &SubmissionPayload) -> Result<Ack>;

    /// Guarda el envío final y deja el registro en estado terminal.
    fn finalize(&self, payload: &SubmissionPayload) -> Result<Ack>;

    /// Historia ordenada (más antigua primero) del workflow.
    fn fetch_history(&self, id: &Uuid) -> Result<Vec<AuditLogEntry>>;

    /// URL para mostrar un archivo persistido.
    fn resolve_file_url(&self, file_reference: &str) -> Result<Url>;
}
