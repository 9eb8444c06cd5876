use anyhow::Context;
use doc_domain::{FieldValue, FileValue};
use doc_workflow::{user_context_from_env, FormController, WorkflowConfig, WorkflowFactory, WorkflowType};
use flow::PersistenceService;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Menú interactivo para capturar workflows de licitación y contrato sobre
/// el almacén JSON configurado por `DOCFLOW_DATA_DIR`.
///
/// Opciones del menú principal:
/// 1) Nueva licitación
/// 2) Nuevo contrato
/// 3) Listar workflows guardados
/// 4) Cargar workflow
/// 5) Salir
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
                             .init();

    let store = Arc::new(doc_persistence::new_from_env().context("no se pudo abrir el almacén")?);
    let persistence: Arc<dyn PersistenceService> = store.clone();
    let config = WorkflowConfig::from_env()?;
    let user = user_context_from_env()?;
    println!("Usuario: {} ({}) rol {}", user.display_name, user.user_id, user.role);
    println!("Datos en {}", store.root().display());

    loop {
        println!("\n== docflow ==");
        println!("1) Nueva licitación");
        println!("2) Nuevo contrato");
        println!("3) Listar workflows guardados");
        println!("4) Cargar workflow");
        println!("5) Salir");
        let choice = prompt("Elige una opción: ")?;
        match choice.trim() {
            "1" | "2" => {
                let wt = if choice.trim() == "1" { WorkflowType::Tender } else { WorkflowType::Contract };
                match WorkflowFactory::create(&wt, user.clone(), config, persistence.clone()) {
                    Ok(mut ctl) => form_menu(&mut ctl)?,
                    Err(e) => eprintln!("Error creando workflow: {}", e),
                }
            }
            "3" => match store.list_workflow_ids() {
                Ok(ids) if ids.is_empty() => println!("No hay workflows guardados"),
                Ok(ids) => {
                    println!("\nID                                   | TIPO     | ESTADO    | VERSIÓN");
                    println!("---------------------------------------------------------------------");
                    for id in ids {
                        match store.load_workflow(&id) {
                            Ok(r) => println!("{} | {:<8} | {:<9} | {}", r.id, r.workflow_type, r.status, r.version),
                            Err(e) => eprintln!("{}: {}", id, e),
                        }
                    }
                }
                Err(e) => eprintln!("Error listando workflows: {}", e),
            },
            "4" => {
                let raw = prompt("Workflow id (UUID): ")?;
                let id = match Uuid::parse_str(raw.trim()) {
                    Ok(u) => u,
                    Err(_) => {
                        eprintln!("UUID inválido");
                        continue;
                    }
                };
                match WorkflowFactory::load(id, user.clone(), config, persistence.clone()) {
                    Ok(mut ctl) => form_menu(&mut ctl)?,
                    Err(e) => eprintln!("Error cargando workflow: {}", e),
                }
            }
            "5" => {
                println!("Saliendo...");
                break;
            }
            other => println!("Opción inválida: {}", other),
        }
    }

    Ok(())
}

fn form_menu(ctl: &mut FormController) -> anyhow::Result<()> {
    loop {
        let id = ctl.workflow_id().map(|u| u.to_string()).unwrap_or_else(|| "<sin guardar>".into());
        println!("\n== {} {} | {} v{} | paso {}/{} ==",
                 ctl.definition().workflow_type(),
                 id,
                 ctl.status(),
                 ctl.version(),
                 ctl.current_step() + 1,
                 ctl.definition().registry().len());
        println!("1) Ver pasos y campos");
        println!("2) Asignar campo");
        println!("3) Adjuntar archivo desde disco");
        println!("4) Limpiar campo");
        println!("5) Paso siguiente");
        println!("6) Paso anterior");
        println!("7) Guardar borrador");
        println!("8) Finalizar");
        println!("9) Ver historia");
        println!("10) Descartar cambios");
        println!("11) Volver");
        let choice = prompt("Elige una opción: ")?;
        match choice.trim() {
            "1" => show_form(ctl),
            "2" => {
                let key = prompt("Campo: ")?;
                let raw = prompt("Valor (fechas AAAA-MM-DD, horas HH:MM): ")?;
                match ctl.set_raw(key.trim(), &raw) {
                    Ok(_) => println!("Campo actualizado"),
                    Err(e) => eprintln!("{}", e),
                }
            }
            "3" => {
                let key = prompt("Campo de archivo: ")?;
                let path_s = prompt("Ruta del archivo: ")?;
                let path = Path::new(path_s.trim());
                let bytes = match std::fs::read(path) {
                    Ok(b) => b,
                    Err(e) => {
                        eprintln!("No se pudo leer {}: {}", path.display(), e);
                        continue;
                    }
                };
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("archivo");
                match ctl.attach_file(key.trim(), name, None, bytes) {
                    Ok(_) => println!("Archivo adjuntado"),
                    Err(e) => eprintln!("{}", e),
                }
            }
            "4" => {
                let key = prompt("Campo a limpiar: ")?;
                let confirm = prompt("Se borrará el valor y su archivo asociado. Escribir 'yes' para confirmar: ")?;
                match ctl.clear(key.trim(), confirm.trim().eq_ignore_ascii_case("yes")) {
                    Ok(keys) => {
                        let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
                        println!("Limpiados: {}", names.join(", "));
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
            "5" => {
                if !ctl.advance() {
                    println!("El paso actual necesita su archivo antes de avanzar");
                }
            }
            "6" => {
                if !ctl.retreat() {
                    println!("Ya está en el primer paso");
                }
            }
            "7" => match ctl.save_draft() {
                Ok(ack) => println!("Guardado: {} v{} ({})", ack.workflow_id, ack.version, ack.action),
                Err(e) => eprintln!("{}", e),
            },
            "8" => {
                let confirm = prompt("Tras finalizar no se podrá editar. Escribir 'yes' para confirmar: ")?;
                if !confirm.trim().eq_ignore_ascii_case("yes") {
                    println!("Finalización cancelada");
                    continue;
                }
                match ctl.finalize() {
                    Ok(ack) => println!("Finalizado: {} v{}", ack.workflow_id, ack.version),
                    Err(e) => eprintln!("{}", e),
                }
            }
            "9" => match ctl.history() {
                Ok(entries) if entries.is_empty() => println!("Sin historia"),
                Ok(entries) => {
                    for e in entries {
                        println!("v{} {} {} {} {} campos (blake3 {})",
                                 e.version,
                                 e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                                 e.actor,
                                 e.action,
                                 e.snapshot.len(),
                                 &e.digest[..12.min(e.digest.len())]);
                    }
                }
                Err(e) => eprintln!("{}", e),
            },
            "10" => {
                ctl.cancel();
                println!("Cambios descartados");
            }
            "11" => return Ok(()),
            other => println!("Opción inválida: {}", other),
        }
    }
}

fn show_form(ctl: &FormController) {
    for step in ctl.step_statuses() {
        let mark = if step.complete {
            "x"
        } else if step.current {
            ">"
        } else {
            " "
        };
        println!("[{}] {:>2}. {}", mark, step.index + 1, step.label);
    }
    println!();
    for spec in ctl.definition().fields() {
        let value = match ctl.value(spec.key.as_str()) {
            None => "-".to_string(),
            Some(FieldValue::Text(s)) => s.clone(),
            Some(FieldValue::Date(d)) => d.to_string(),
            Some(FieldValue::Time(t)) => t.format("%H:%M").to_string(),
            Some(FieldValue::File(FileValue::Upload(u))) => format!("{} (nuevo, {} bytes)", u.file_name(), u.size_bytes()),
            Some(FieldValue::File(FileValue::Existing(path))) => match ctl.file_url(spec.key.as_str()) {
                Ok(Some(url)) => url.to_string(),
                _ => path.clone(),
            },
        };
        let lock = ctl.lock_reason(spec.key.as_str()).map(|r| format!("  [bloqueado: {}]", r)).unwrap_or_default();
        println!("{:<24} {:<7} {}{}", spec.key.as_str(), spec.kind, value, lock);
    }
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
