//! Crate `flow` — frontera con el servicio de persistencia de workflows
//!
//! Este crate define los tipos que viajan entre el controlador de formularios
//! y el servicio externo (`SubmissionPayload`, `PersistedRecord`, `Ack`,
//! `AuditLogEntry`), el contrato `PersistenceService` y una implementación en
//! memoria útil para pruebas (`InMemoryPersistence`).
//!
//! Diseño resumido:
//! - Cada envío lleva el snapshot completo del formulario; el servicio
//!   reemplaza el registro y añade una entrada de historia.
//! - Idempotencia: se admite `command_id` en el payload para evitar
//!   duplicados.
//! - Locking optimista: cada envío indica `expected_version`; si no coincide
//!   el servicio responde `FlowError::Conflict`.
//! - `Finalized` es terminal: el servicio rechaza envíos posteriores.
//!
//! Ejemplo rápido:
//! ```rust
//! use flow::stubs::InMemoryPersistence;
//! use flow::PersistenceService;
//! let repo = InMemoryPersistence::new();
//! assert!(repo.load_workflow(&uuid::Uuid::new_v4()).is_err());
//! ```
pub mod domain;
pub mod engine;
pub mod errors;
pub mod repository;
pub mod stubs;

pub use domain::*;
pub use engine::*;
pub use errors::*;
pub use repository::*;
pub use stubs::*;
