mod amount;
mod errors;
mod field;
mod file_upload;
mod reference_data;
mod user_context;

pub use amount::parse_amount;
pub use errors::{DomainError, FileRejection};
pub use field::{FieldKey, FieldKind, FieldSpec, FieldValue, FileValue, DATE_FORMAT, EXISTING_PREFIX, TIME_FORMAT};
pub use file_upload::{content_type_for, FileConstraints, FileUpload, DEFAULT_MAX_FILE_BYTES};
pub use reference_data::{InMemoryReferenceData, RefOption, ReferenceDataProvider};
pub use user_context::{Role, UserContext};
