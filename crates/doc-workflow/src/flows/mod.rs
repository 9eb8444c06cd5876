pub mod contract_flow;
pub mod tender_flow;

pub use contract_flow::contract_definition;
pub use tender_flow::{tender_definition, TENDER_STEPS};
