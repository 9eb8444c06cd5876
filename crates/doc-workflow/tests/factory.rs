use doc_domain::{Role, UserContext};
use doc_workflow::{WorkflowConfig, WorkflowError, WorkflowFactory, WorkflowType};
use flow::{FlowError, InMemoryPersistence, PersistenceService};
use std::sync::Arc;
use uuid::Uuid;

fn user() -> UserContext {
  UserContext::new("de-7", "Captura", Role::DataEntry)
}

#[test]
fn unknown_type_has_no_definition() {
  assert!(matches!(WorkflowFactory::definition(&WorkflowType::Unknown), Err(WorkflowError::Config(_))));
}

#[test]
fn load_picks_definition_from_record() -> Result<(), WorkflowError> {
  let store: Arc<dyn PersistenceService> = Arc::new(InMemoryPersistence::new());
  let mut ctl = WorkflowFactory::create(&WorkflowType::Contract, user(), WorkflowConfig::default(), store.clone())?;
  ctl.set_raw("contractor_name", "Acme Infra")?;
  ctl.set_raw("contract_value", "250000")?;
  ctl.save_draft()?;
  let id = ctl.workflow_id().expect("guardado");

  let loaded = WorkflowFactory::load(id, user(), WorkflowConfig::default(), store)?;
  assert_eq!(loaded.definition().workflow_type(), &WorkflowType::Contract);
  assert_eq!(loaded.definition().registry().len(), 6);
  assert!(loaded.is_locked("contract_value"));
  Ok(())
}

#[test]
fn loading_a_missing_workflow_is_not_found() {
  let store: Arc<dyn PersistenceService> = Arc::new(InMemoryPersistence::new());
  let res = WorkflowFactory::load(Uuid::new_v4(), user(), WorkflowConfig::default(), store);
  assert!(matches!(res, Err(WorkflowError::Flow(FlowError::NotFound(_)))));
}
