pub mod controller;

pub use controller::{snapshot_from_record, FormController, PendingSubmission, StepStatus};
