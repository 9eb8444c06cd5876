use crate::config::WorkflowConfig;
use crate::definition::WorkflowDefinition;
use crate::engine::FormController;
use crate::flows::{contract_definition, tender_definition};
use crate::workflow_type::WorkflowType;
use crate::WorkflowError;
use doc_domain::UserContext;
use flow::PersistenceService;
use std::sync::Arc;
use uuid::Uuid;

/// Fábrica de controladores de formulario.
///
/// Resuelve la definición del tipo de workflow y entrega un
/// `FormController` listo para editar, nuevo o cargado desde el servicio.
pub struct WorkflowFactory;

impl WorkflowFactory {
  /// Definición asociada a un tipo de workflow.
  pub fn definition(workflow_type: &WorkflowType) -> Result<Arc<WorkflowDefinition>, WorkflowError> {
    let def = match workflow_type {
      WorkflowType::Tender => tender_definition()?,
      WorkflowType::Contract => contract_definition()?,
      WorkflowType::Unknown => {
        return Err(WorkflowError::Config("tipo de workflow desconocido".into()));
      }
    };
    Ok(Arc::new(def))
  }

  /// Formulario nuevo del tipo indicado. No toca la persistencia hasta el
  /// primer guardado.
  pub fn create(workflow_type: &WorkflowType,
                user: UserContext,
                config: WorkflowConfig,
                persistence: Arc<dyn PersistenceService>)
                -> Result<FormController, WorkflowError> {
    let definition = Self::definition(workflow_type)?;
    Ok(FormController::new(definition, user, config, persistence))
  }

  /// Carga un workflow existente. El tipo se toma del propio registro.
  pub fn load(workflow_id: Uuid,
              user: UserContext,
              config: WorkflowConfig,
              persistence: Arc<dyn PersistenceService>)
              -> Result<FormController, WorkflowError> {
    let record = persistence.load_workflow(&workflow_id)?;
    let workflow_type = record.workflow_type.parse::<WorkflowType>().unwrap_or_default();
    let definition = Self::definition(&workflow_type)?;
    FormController::from_record(definition, user, config, persistence, record)
  }
}
