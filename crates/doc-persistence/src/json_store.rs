// json_store.rs
//
// `PersistenceService` sobre el sistema de archivos. Disposición bajo el
// directorio de datos:
//
//   records/<workflow>.json       registro vigente
//   history/<workflow>.jsonl      una entrada de auditoría por línea
//   commands/<command>.json       envíos ya aplicados (idempotencia)
//   uploads/<workflow>/<campo>/…  bytes de los archivos subidos
//
// El renombrado del registro es el único punto de confirmación: archivos e
// historia se escriben antes y el marcador del comando después. Una entrada
// de historia cuya versión nunca se confirmó no se devuelve.
use crate::config::StoreConfig;
use doc_domain::FileUpload;
use flow::{apply_submission, replay_ack, resolve_against, Ack, AuditLogEntry, FieldMap, FlowError, PersistedRecord,
           PersistenceService, Result, SubmissionPayload, WorkflowStatus};
use log::{debug, info, warn};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use url::Url;
use uuid::Uuid;

fn storage(context: &str, e: impl std::fmt::Display) -> FlowError {
  FlowError::Storage(format!("{}: {}", context, e))
}

pub struct JsonFilePersistence {
  root: PathBuf,
  file_base: String,
  /// Serializa las escrituras; las lecturas no toman el candado.
  write_lock: Mutex<()>,
}

impl JsonFilePersistence {
  /// Abre (o crea) el almacén bajo `root`.
  pub fn open(root: impl Into<PathBuf>, file_base: impl Into<String>) -> Result<Self> {
    let root = root.into();
    for dir in ["records", "history", "commands", "uploads"] {
      fs::create_dir_all(root.join(dir)).map_err(|e| storage("no se pudo crear el directorio de datos", e))?;
    }
    debug!("almacén JSON en {}", root.display());
    Ok(Self { root, file_base: file_base.into(), write_lock: Mutex::new(()) })
  }

  pub fn from_config(config: &StoreConfig) -> Result<Self> {
    Self::open(config.data_dir.clone(), config.file_base_url.clone())
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Ruta local de una referencia persistida (`uploads/...`).
  pub fn local_path(&self, file_reference: &str) -> PathBuf {
    self.root.join(file_reference)
  }

  /// Ids de todos los workflows guardados.
  pub fn list_workflow_ids(&self) -> Result<Vec<Uuid>> {
    let dir = fs::read_dir(self.root.join("records")).map_err(|e| storage("no se pudo listar records", e))?;
    let mut ids = Vec::new();
    for entry in dir {
      let entry = entry.map_err(|e| storage("no se pudo listar records", e))?;
      let name = entry.file_name();
      let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
        continue;
      };
      if let Ok(id) = Uuid::parse_str(stem) {
        ids.push(id);
      }
    }
    ids.sort();
    Ok(ids)
  }

  fn lock(&self) -> Result<MutexGuard<'_, ()>> {
    self.write_lock.lock().map_err(|e| FlowError::Storage(format!("mutex poisoned: {:?}", e)))
  }

  fn record_path(&self, id: &Uuid) -> PathBuf {
    self.root.join("records").join(format!("{}.json", id))
  }

  fn history_path(&self, id: &Uuid) -> PathBuf {
    self.root.join("history").join(format!("{}.jsonl", id))
  }

  fn command_path(&self, command_id: &Uuid) -> PathBuf {
    self.root.join("commands").join(format!("{}.json", command_id))
  }

  fn read_record(&self, id: &Uuid) -> Result<Option<PersistedRecord>> {
    let path = self.record_path(id);
    if !path.exists() {
      return Ok(None);
    }
    let bytes = fs::read(&path).map_err(|e| storage("no se pudo leer el registro", e))?;
    let record = serde_json::from_slice(&bytes).map_err(|e| storage("registro corrupto", e))?;
    Ok(Some(record))
  }

  /// Escribe el registro en un temporal y lo renombra para no dejar un
  /// documento a medias.
  fn write_record(&self, record: &PersistedRecord) -> Result<()> {
    let path = self.record_path(&record.id);
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(record).map_err(|e| storage("no se pudo serializar el registro", e))?;
    fs::write(&tmp, bytes).map_err(|e| storage("no se pudo escribir el registro", e))?;
    fs::rename(&tmp, &path).map_err(|e| storage("no se pudo reemplazar el registro", e))?;
    Ok(())
  }

  fn append_history(&self, entry: &AuditLogEntry) -> Result<()> {
    let line = serde_json::to_string(entry).map_err(|e| storage("no se pudo serializar la historia", e))?;
    let mut file = OpenOptions::new().create(true)
                                     .append(true)
                                     .open(self.history_path(&entry.workflow_id))
                                     .map_err(|e| storage("no se pudo abrir la historia", e))?;
    writeln!(file, "{}", line).map_err(|e| storage("no se pudo escribir la historia", e))?;
    Ok(())
  }

  fn read_command(&self, command_id: &Uuid) -> Result<Option<Uuid>> {
    let path = self.command_path(command_id);
    if !path.exists() {
      return Ok(None);
    }
    let bytes = fs::read(&path).map_err(|e| storage("no se pudo leer el comando", e))?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| storage("comando corrupto", e))?;
    let id = value.get("workflow_id")
                  .and_then(|v| v.as_str())
                  .and_then(|s| Uuid::parse_str(s).ok())
                  .ok_or_else(|| FlowError::Storage(format!("comando {} sin workflow_id", command_id)))?;
    Ok(Some(id))
  }

  fn write_command(&self, command_id: &Uuid, workflow_id: &Uuid) -> Result<()> {
    let body = json!({ "workflow_id": workflow_id.to_string() });
    fs::write(self.command_path(command_id), body.to_string()).map_err(|e| storage("no se pudo registrar el comando", e))
  }

  /// Decodifica cada archivo nuevo del payload y lo escribe en la ruta que
  /// le asignó el envío.
  fn store_uploads<'a, I>(&self, fields: &FieldMap, stored: I) -> Result<()>
    where I: IntoIterator<Item = (&'a String, &'a String)>
  {
    for (field, reference) in stored {
      let value = fields.get(field)
                        .ok_or_else(|| FlowError::Other(format!("archivo '{}' ausente del payload", field)))?;
      let upload = FileUpload::from_wire(value).map_err(|e| FlowError::Other(e.to_string()))?;
      let path = self.local_path(reference);
      if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage("no se pudo crear el directorio del archivo", e))?;
      }
      fs::write(&path, upload.content()).map_err(|e| storage("no se pudo escribir el archivo", e))?;
      debug!("archivo {} guardado ({} bytes)", reference, upload.size_bytes());
    }
    Ok(())
  }

  fn submit(&self, payload: &SubmissionPayload, operation: WorkflowStatus) -> Result<Ack> {
    let _guard = self.lock()?;

    if let Some(wid) = self.read_command(&payload.command_id)? {
      if let Some(rec) = self.read_record(&wid)? {
        debug!("envío repetido {} para {}", payload.command_id, wid);
        return Ok(replay_ack(&rec, payload));
      }
    }

    let current = match payload.workflow_id {
      Some(id) => self.read_record(&id)?,
      None => None,
    };
    // Confirmado pero sin marcador: el registro recuerda su último comando.
    if let Some(rec) = current.as_ref().filter(|r| r.last_command_id == Some(payload.command_id)) {
      debug!("envío repetido {} para {} (sin marcador)", payload.command_id, rec.id);
      return Ok(replay_ack(rec, payload));
    }
    let applied = apply_submission(current.as_ref(), payload, operation)?;

    self.store_uploads(&payload.fields, &applied.ack.stored_files)?;
    self.append_history(&applied.entry)?;
    self.write_record(&applied.record)?;
    if let Err(e) = self.write_command(&payload.command_id, &applied.record.id) {
      warn!("workflow {} confirmado sin marcador de comando: {}", applied.record.id, e);
    }
    info!("workflow {} guardado en disco: versión {} ({})",
          applied.record.id, applied.ack.version, applied.ack.action);
    Ok(applied.ack)
  }
}

impl PersistenceService for JsonFilePersistence {
  fn load_workflow(&self, id: &Uuid) -> Result<PersistedRecord> {
    self.read_record(id)?.ok_or_else(|| FlowError::NotFound(format!("workflow {}", id)))
  }

  fn save_draft(&self, payload: &SubmissionPayload) -> Result<Ack> {
    self.submit(payload, WorkflowStatus::Draft)
  }

  fn finalize(&self, payload: &SubmissionPayload) -> Result<Ack> {
    self.submit(payload, WorkflowStatus::Finalized)
  }

  /// Entradas confirmadas en orden de versión. Ante una versión repetida
  /// vale la última escrita.
  fn fetch_history(&self, id: &Uuid) -> Result<Vec<AuditLogEntry>> {
    let committed = self.load_workflow(id)?.version;
    let path = self.history_path(id);
    if !path.exists() {
      return Ok(Vec::new());
    }
    let file = fs::File::open(&path).map_err(|e| storage("no se pudo abrir la historia", e))?;
    let mut entries = BTreeMap::new();
    for line in BufReader::new(file).lines() {
      let line = line.map_err(|e| storage("no se pudo leer la historia", e))?;
      if line.trim().is_empty() {
        continue;
      }
      let entry: AuditLogEntry = serde_json::from_str(&line).map_err(|e| storage("historia corrupta", e))?;
      if entry.version <= committed {
        entries.insert(entry.version, entry);
      }
    }
    Ok(entries.into_values().collect())
  }

  fn resolve_file_url(&self, file_reference: &str) -> Result<Url> {
    let base = Url::parse(&self.file_base).map_err(|e| FlowError::Other(format!("URL base inválida: {}", e)))?;
    resolve_against(&base, file_reference)
  }
}
