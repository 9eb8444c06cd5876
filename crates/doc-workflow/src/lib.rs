//! doc-workflow: controlador de formularios documentales por pasos
//!
//! Un workflow es una secuencia fija de pasos. Cada paso se habilita cuando
//! el anterior tiene adjunto su archivo; los campos ya guardados quedan
//! bloqueados hasta que se limpian de forma explícita y todo queda en sólo
//! lectura al finalizar. El estado vive en un `FormController`, que habla
//! con el servicio de persistencia a través de `flow::PersistenceService`.
//!
//! ```rust
//! use doc_domain::{Role, UserContext};
//! use doc_workflow::{WorkflowConfig, WorkflowFactory, WorkflowType};
//! use flow::InMemoryPersistence;
//! use std::sync::Arc;
//!
//! let user = UserContext::new("u1", "Usuario", Role::DataEntry);
//! let ctl = WorkflowFactory::create(&WorkflowType::Tender,
//!                                   user,
//!                                   WorkflowConfig::default(),
//!                                   Arc::new(InMemoryPersistence::new())).unwrap();
//! assert_eq!(ctl.current_step(), 0);
//! assert!(ctl.is_locked("prebid_minutes_file"));
//! ```

pub mod config;
pub mod definition;
pub mod engine;
pub mod errors;
pub mod factory;
pub mod flows;
pub mod gate;
pub mod policy;
pub mod progress;
pub mod snapshot;
pub mod step;
pub mod workflow_type;

pub use config::{user_context_from_env, WorkflowConfig};
pub use definition::{WorkflowDefinition, WorkflowDefinitionBuilder};
pub use engine::{FormController, PendingSubmission, StepStatus};
pub use errors::WorkflowError;
pub use factory::WorkflowFactory;
pub use gate::{action_for, SubmissionGate, SubmitContext, ValidationErrorKind, ValidationIssue, ValidationReport};
pub use policy::{LockReason, LockState};
pub use progress::ProgressTracker;
pub use snapshot::{FormSnapshot, PreviouslyFilled};
pub use step::{FieldGroup, StepDefinition, StepRegistry};
pub use workflow_type::WorkflowType;
