pub mod submission;
pub mod validation;

pub use submission::{action_for, SubmissionGate, SubmitContext};
pub use validation::{ValidationErrorKind, ValidationIssue, ValidationReport};
