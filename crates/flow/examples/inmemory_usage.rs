// Guarda un borrador y lo finaliza contra `InMemoryPersistence`, luego
// imprime la historia resultante.
use chrono::Utc;
use flow::{ActionType, FieldMap, InMemoryPersistence, PersistenceService, SubmissionPayload, WorkflowStatus};
use serde_json::json;
use uuid::Uuid;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let repo = InMemoryPersistence::new();

    let mut fields = FieldMap::new();
    fields.insert("tender_number".into(), json!("WRD/2024/01"));
    let draft = SubmissionPayload { workflow_id: None,
                                    workflow_type: "tender".into(),
                                    target_status: WorkflowStatus::Draft,
                                    action: ActionType::DraftSave,
                                    actor: "demo".into(),
                                    current_step: 0,
                                    fields,
                                    expected_version: 0,
                                    command_id: Uuid::new_v4(),
                                    submitted_at: Utc::now() };
    let ack = repo.save_draft(&draft)?;
    println!("borrador {} v{}", ack.workflow_id, ack.version);

    let final_submit = SubmissionPayload { workflow_id: Some(ack.workflow_id),
                                           target_status: WorkflowStatus::Finalized,
                                           action: ActionType::FinalSubmit,
                                           expected_version: ack.version,
                                           command_id: Uuid::new_v4(),
                                           submitted_at: Utc::now(),
                                           ..draft };
    let ack = repo.finalize(&final_submit)?;
    println!("finalizado v{}", ack.version);

    for entry in repo.fetch_history(&ack.workflow_id)? {
        println!("v{} {} {} {}", entry.version, entry.action, entry.status, entry.digest);
    }
    Ok(())
}
