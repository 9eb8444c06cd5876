pub mod definition;
pub mod group;
pub mod registry;

pub use definition::StepDefinition;
pub use group::FieldGroup;
pub use registry::StepRegistry;
