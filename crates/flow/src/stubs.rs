// Archivo: stubs.rs
// Propósito: implementación en memoria de `PersistenceService` para pruebas
// y wiring rápido. No es durable.
use crate::domain::{Ack, AuditLogEntry, PersistedRecord, SubmissionPayload, WorkflowStatus};
use crate::engine::{apply_submission, replay_ack, resolve_against};
use crate::errors::{FlowError, Result};
use crate::repository::PersistenceService;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use url::Url;
use uuid::Uuid;

/// URL base por defecto para archivos del stub.
pub const DEFAULT_FILE_BASE_URL: &str = "http://localhost:8080/files/";

// Minimal in-memory persistence for wiring examples (not durable)
pub struct InMemoryPersistence {
    /// Registros indexados por `workflow_id`.
    records: Mutex<HashMap<Uuid, PersistedRecord>>,
    /// Historia por workflow, en orden de llegada.
    history: Mutex<HashMap<Uuid, Vec<AuditLogEntry>>>,
    /// `command_id` ya aplicados -> workflow al que pertenecen.
    commands: Mutex<HashMap<Uuid, Uuid>>,
    file_base: String,
}

impl InMemoryPersistence {
    /// Crea una nueva instancia con la URL base por defecto.
    pub fn new() -> Self {
        Self::with_file_base(DEFAULT_FILE_BASE_URL)
    }

    /// Crea una instancia que resuelve archivos contra `file_base`. La URL
    /// se valida al resolver.
    pub fn with_file_base(file_base: impl Into<String>) -> Self {
        Self { records: Mutex::new(HashMap::new()),
               history: Mutex::new(HashMap::new()),
               commands: Mutex::new(HashMap::new()),
               file_base: file_base.into() }
    }

    /// Cantidad de workflows guardados.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `FlowError::Storage`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, FlowError> {
        m.lock().map_err(|e| FlowError::Storage(format!("mutex poisoned: {:?}", e)))
    }

    fn submit(&self, payload: &SubmissionPayload, operation: WorkflowStatus) -> Result<Ack> {
        let mut records = self.lock(&self.records)?;
        let mut commands = self.lock(&self.commands)?;

        // Idempotency: a repeated command returns the ack it already produced
        if let Some(wid) = commands.get(&payload.command_id) {
            if let Some(rec) = records.get(wid) {
                debug!("envío repetido {} para {}", payload.command_id, wid);
                return Ok(replay_ack(rec, payload));
            }
        }

        let current = payload.workflow_id.and_then(|id| records.get(&id));
        let applied = apply_submission(current, payload, operation)?;
        let id = applied.record.id;

        self.lock(&self.history)?.entry(id).or_default().push(applied.entry);
        commands.insert(payload.command_id, id);
        records.insert(id, applied.record);
        info!("workflow {} guardado: versión {} ({})", id, applied.ack.version, applied.ack.action);
        Ok(applied.ack)
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceService for InMemoryPersistence {
    fn load_workflow(&self, id: &Uuid) -> Result<PersistedRecord> {
        let records = self.lock(&self.records)?;
        records.get(id).cloned().ok_or(FlowError::NotFound(format!("workflow {}", id)))
    }

    fn save_draft(&self, payload: &SubmissionPayload) -> Result<Ack> {
        self.submit(payload, WorkflowStatus::Draft)
    }

    fn finalize(&self, payload: &SubmissionPayload) -> Result<Ack> {
        self.submit(payload, WorkflowStatus::Finalized)
    }

    /// Devuelve la historia del workflow. `NotFound` si nunca se guardó.
    fn fetch_history(&self, id: &Uuid) -> Result<Vec<AuditLogEntry>> {
        if !self.lock(&self.records)?.contains_key(id) {
            return Err(FlowError::NotFound(format!("workflow {}", id)));
        }
        let history = self.lock(&self.history)?;
        let mut entries = history.get(id).cloned().unwrap_or_default();
        entries.sort_by_key(|e| e.version);
        Ok(entries)
    }

    fn resolve_file_url(&self, file_reference: &str) -> Result<Url> {
        let base = Url::parse(&self.file_base).map_err(|e| FlowError::Other(format!("URL base inválida: {}", e)))?;
        resolve_against(&base, file_reference)
    }
}
