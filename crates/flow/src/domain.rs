// Archivo: domain.rs
// Propósito: tipos que cruzan la frontera con el servicio de persistencia:
// payload de envío, registro persistido, acuse y entradas de historia.
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

/// Campos normalizados de un formulario, en orden de declaración.
pub type FieldMap = IndexMap<String, JsonValue>;

/// Prefijo de la clave con la que viaja un archivo ya persistido.
pub const EXISTING_PREFIX: &str = "existing_";

/// Clave del contenido en base64 que identifica un archivo nuevo.
pub const UPLOAD_CONTENT_KEY: &str = "content_base64";

/// Estado de un workflow. `Finalized` es terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Draft,
    Finalized,
}

impl WorkflowStatus {
    pub fn is_finalized(&self) -> bool {
        matches!(self, WorkflowStatus::Finalized)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Finalized => "finalized",
        };
        write!(f, "{}", s)
    }
}

/// Etiqueta de auditoría de un envío. No tiene efecto en el control de
/// flujo; el servicio la guarda en la historia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    DraftSave,
    Update,
    FinalSubmit,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::DraftSave => "draft_save",
            ActionType::Update => "update",
            ActionType::FinalSubmit => "final_submit",
        };
        write!(f, "{}", s)
    }
}

/// Payload preparado por la compuerta de envío.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// `None` para un workflow que todavía no existe en el servicio.
    pub workflow_id: Option<Uuid>,
    pub workflow_type: String,
    pub target_status: WorkflowStatus,
    pub action: ActionType,
    pub actor: String,
    pub current_step: u32,
    pub fields: FieldMap,
    /// Versión que el cliente cree vigente (0 para uno nuevo).
    pub expected_version: i64,
    /// Identificador de idempotencia del envío.
    pub command_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionPayload {
    /// Huella blake3 de los campos enviados.
    pub fn digest(&self) -> String {
        digest_fields(&self.fields)
    }
}

/// Huella blake3 (hex) de un mapa de campos serializado.
pub fn digest_fields(fields: &FieldMap) -> String {
    let bytes = serde_json::to_vec(fields).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

/// Registro tal como lo guarda el servicio de persistencia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: Uuid,
    pub workflow_type: String,
    pub status: WorkflowStatus,
    pub version: i64,
    pub current_step: u32,
    /// Campos con los archivos ya materializados como `existing_<campo>`.
    pub fields: FieldMap,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_command_id: Option<Uuid>,
}

/// Acuse de un envío aceptado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub workflow_id: Uuid,
    pub version: i64,
    pub status: WorkflowStatus,
    pub action: ActionType,
    /// Campo de archivo -> ruta persistida de los archivos nuevos.
    pub stored_files: IndexMap<String, String>,
    pub command_id: Uuid,
}

/// Entrada de la historia de un workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub workflow_id: Uuid,
    pub version: i64,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: ActionType,
    pub status: WorkflowStatus,
    /// Campos tal como quedaron tras el envío.
    pub snapshot: FieldMap,
    pub digest: String,
}

/// Ruta persistida de un archivo nuevo. Campo y nombre se sanean para que
/// no puedan escapar del directorio de subidas.
pub fn upload_path(workflow_id: &Uuid, field: &str, file_name: &str) -> String {
    format!("uploads/{}/{}/{}", workflow_id, sanitize_segment(field), sanitize_segment(file_name))
}

fn sanitize_segment(raw: &str) -> String {
    let clean: String = raw.chars()
                           .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
                           .collect();
    let clean = clean.replace("..", "_");
    let clean = clean.trim_start_matches('.');
    if clean.is_empty() {
        "file".to_string()
    } else {
        clean.to_string()
    }
}

/// Un valor es un archivo nuevo si trae su contenido en base64.
pub fn is_upload_value(value: &JsonValue) -> bool {
    value.get(UPLOAD_CONTENT_KEY).is_some()
}

/// Sustituye los archivos nuevos por su referencia `existing_<campo>`.
/// Devuelve los campos resultantes y el mapa campo -> ruta.
pub fn materialize_uploads(workflow_id: &Uuid, fields: &FieldMap) -> (FieldMap, IndexMap<String, String>) {
    let mut out = FieldMap::new();
    let mut stored = IndexMap::new();
    for (key, value) in fields {
        if is_upload_value(value) {
            let name = value.get("file_name").and_then(JsonValue::as_str).unwrap_or("file");
            let path = upload_path(workflow_id, key, name);
            out.insert(format!("{}{}", EXISTING_PREFIX, key), JsonValue::String(path.clone()));
            stored.insert(key.clone(), path);
        } else {
            out.insert(key.clone(), value.clone());
        }
    }
    (out, stored)
}
